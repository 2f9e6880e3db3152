//! PDF download service

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Client, Url};
use tracing::{info, warn};

use crate::error::{AppError, AppResult, FileError};

pub struct Downloader {
    client: Client,
    output_dir: PathBuf,
}

impl Downloader {
    pub fn new(output_dir: impl Into<PathBuf>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AppError::Other(format!("http client setup failed: {}", e)))?;

        Ok(Self {
            client,
            output_dir: output_dir.into(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Download one file into the output directory and return its path
    pub async fn download(&self, url: &str) -> AppResult<PathBuf> {
        self.download_as(url, &file_name_for(url)).await
    }

    async fn download_as(&self, url: &str, file_name: &str) -> AppResult<PathBuf> {
        let download_failed = |source| FileError::DownloadFailed {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(download_failed)?;
        let bytes = response.bytes().await.map_err(download_failed)?;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| AppError::file_write_failed(self.output_dir.display().to_string(), e))?;
        let path = self.output_dir.join(file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

        info!("📥 Downloaded {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Download every URL; failures are collected instead of aborting the rest.
    /// URLs sharing a last path segment get numbered file names.
    pub async fn download_all(&self, urls: &[String]) -> (Vec<String>, Vec<String>) {
        let mut saved = Vec::new();
        let mut errors = Vec::new();
        let mut taken = HashSet::new();

        for url in urls {
            let file_name = unique_name(&file_name_for(url), &mut taken);
            match self.download_as(url, &file_name).await {
                Ok(path) => saved.push(path.display().to_string()),
                Err(e) => {
                    warn!("⚠️ {}", e);
                    errors.push(e.to_string());
                }
            }
        }

        (saved, errors)
    }
}

/// `name`, or `stem_N.ext` with the first free N from 2, recorded in `taken`
pub fn unique_name(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, format!(".{}", ext)),
        _ => (name, String::new()),
    };
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}{}", stem, n, ext);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Last path segment of the URL, reduced to a safe file name
pub fn file_name_for(url: &str) -> String {
    let segment = Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(|s| s.to_string()))
        })
        .unwrap_or_default();

    let cleaned: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches(['.', '_']).is_empty() {
        format!(
            "download_{}.pdf",
            chrono::Local::now().format("%Y%m%d_%H%M%S%3f")
        )
    } else {
        cleaned
    }
}
