//! Logging setup and formatting helpers

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Reads `RUST_LOG`, defaults to `info`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

/// Log program start
pub fn log_startup(total_queries: usize, max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 Cause-list retrieval started");
    info!("📋 Queries: {} | concurrent sessions: {}", total_queries, max_concurrent);
    info!("{}", "=".repeat(60));
}

/// Log the start of one query
pub fn log_query_start(query_index: usize, total: usize, label: &str) {
    info!("\n{}", "─".repeat(60));
    info!("[query {}] 📄 {}/{}: {}", query_index, query_index, total, label);
    info!("{}", "─".repeat(60));
}

/// Print the final statistics
pub fn print_final_stats(listed: usize, not_listed: usize, failed: usize, output_dir: &str) {
    let total = listed + not_listed + failed;
    info!("\n{}", "=".repeat(60));
    info!("📊 All queries finished");
    info!(
        "Finished at: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ Listed: {}/{}", listed, total);
    info!("➖ Not listed: {}", not_listed);
    info!("❌ Failed: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\nReports saved to: {}", output_dir);
}

/// Truncate long text for log output
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
