use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{AppError, AppResult, BrowserError};

/// Launch a browser for one query session
///
/// Returns the browser and the task driving its CDP event handler.
pub async fn launch_browser(config: &Config) -> AppResult<(Browser, JoinHandle<()>)> {
    info!("🚀 Launching browser (headless: {})...", config.headless);

    let mut builder = BrowserConfig::builder()
        .window_size(config.window_width, config.window_height)
        .args(vec![
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--disable-blink-features=AutomationControlled",
        ]);

    builder = if config.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };

    if let Some(executable) = &config.chrome_executable {
        debug!("Using browser executable: {}", executable);
        builder = builder.chrome_executable(Path::new(executable));
    }

    let browser_config = builder.build().map_err(|e| {
        error!("Browser configuration failed: {}", e);
        AppError::Browser(BrowserError::ConfigurationFailed { reason: e })
    })?;

    let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("Browser launch failed: {}", e);
        AppError::Browser(BrowserError::LaunchFailed { source: e })
    })?;
    debug!("Browser launched");

    // drive browser events in the background
    let handle = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    Ok((browser, handle))
}
