//! Report writing service
//!
//! Only knows how to persist one `QueryReport`; not when or why.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::QueryReport;

pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `ecourts_result_<YYYYMMDD_HHMMSS>_<n>.json`; `n` keeps concurrent reports apart
    pub fn file_name(query_index: usize) -> String {
        format!(
            "ecourts_result_{}_{}.json",
            chrono::Local::now().format("%Y%m%d_%H%M%S"),
            query_index
        )
    }

    pub async fn write(&self, report: &QueryReport, query_index: usize) -> AppResult<PathBuf> {
        let dir = self.output_dir.display().to_string();
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| AppError::file_write_failed(&dir, e))?;

        let path = self.output_dir.join(Self::file_name(query_index));
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| AppError::Other(format!("report serialization failed: {}", e)))?;
        debug!("report: {} bytes", json.len());

        tokio::fs::write(&path, json)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

        info!("💾 Report saved: {}", path.display());
        Ok(path)
    }
}
