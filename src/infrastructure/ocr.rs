//! Optical text recognition engine
//!
//! The engine is an external process; only the trait is visible to services.

use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppResult, OcrError};

/// Turns an image into raw (unnormalized) text
#[allow(async_fn_in_trait)]
pub trait TextRecognizer {
    async fn recognize(&self, image: &[u8]) -> AppResult<String>;
}

/// Tesseract CLI, fed the image on stdin and read from stdout
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    binary: String,
    args: Vec<String>,
}

impl TesseractRecognizer {
    pub fn new(config: &Config) -> Self {
        Self {
            binary: config.tesseract_binary.clone(),
            args: config.tesseract_args.clone(),
        }
    }

    fn unavailable(&self, source: std::io::Error) -> OcrError {
        OcrError::EngineUnavailable {
            binary: self.binary.clone(),
            source,
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    async fn recognize(&self, image: &[u8]) -> AppResult<String> {
        let mut child = Command::new(&self.binary)
            .arg("stdin")
            .arg("stdout")
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.unavailable(e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(image)
                .await
                .map_err(|e| self.unavailable(e))?;
            // dropping stdin closes the pipe so tesseract sees EOF
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| self.unavailable(e))?;

        if !output.status.success() {
            return Err(OcrError::RecognitionFailed {
                binary: self.binary.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("{} recognized {} bytes as '{}'", self.binary, image.len(), text);
        Ok(text)
    }
}
