use thiserror::Error;

use crate::models::SelectionLevel;

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Caller-supplied input is malformed
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    /// The cascading form could not be driven to the requested selection
    #[error("navigation error: {0}")]
    Navigation(#[from] NavigationError),
    /// Captcha / submission stage
    #[error("submission error: {0}")]
    Submission(#[from] SubmissionError),
    /// Browser session / CDP errors
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),
    /// Optical recognition engine errors
    #[error("ocr error: {0}")]
    Ocr(#[from] OcrError),
    /// File and download errors
    #[error("file error: {0}")]
    File(#[from] FileError),
    /// Configuration errors
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// Anything else (wrapped third-party messages)
    #[error("error: {0}")]
    Other(String),
}

/// Input validation errors, raised before any session resource is used
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid date '{input}', expected DD-MM-YYYY")]
    InvalidDateFormat { input: String },

    #[error("unsupported case type '{input}', expected 'criminal' or 'civil'")]
    UnsupportedCaseType { input: String },

    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("unknown selection level '{input}'")]
    UnknownLevel { input: String },

    #[error("invalid CNR '{input}', expected 16 letters and digits")]
    InvalidCnr { input: String },

    #[error("invalid {field} '{input}'")]
    InvalidCaseNumber { field: &'static str, input: String },
}

/// Cascading-form navigation errors. Fatal for the current query, never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("no {level} option matches '{requested}' ({available} options available)")]
    OptionNotFound {
        level: SelectionLevel,
        requested: String,
        available: usize,
    },

    #[error("{level} control not ready: {reason}")]
    ControlNotReady {
        level: SelectionLevel,
        reason: String,
    },
}

/// Submission stage errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// No structural results table on the page; usually a rejected captcha
    #[error("results table not found")]
    TableNotFound,

    #[error("captcha retries exhausted after {attempts} attempts")]
    CaptchaRetriesExhausted { attempts: u32 },
}

/// Browser related errors
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to configure browser: {reason}")]
    ConfigurationFailed { reason: String },

    #[error("failed to launch browser: {source}")]
    LaunchFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },

    #[error("failed to connect to browser on port {port}: {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: chromiumoxide::error::CdpError,
    },

    #[error("failed to navigate to {url}: {source}")]
    NavigationFailed {
        url: String,
        #[source]
        source: chromiumoxide::error::CdpError,
    },

    #[error("element '{locator}' not found")]
    ElementNotFound { locator: String },

    #[error("script execution failed: {source}")]
    ScriptExecutionFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },

    #[error("unexpected script result: {reason}")]
    UnexpectedScriptResult { reason: String },
}

/// Optical recognition errors
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("ocr engine '{binary}' unavailable: {source}")]
    EngineUnavailable {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ocr engine '{binary}' failed (status {status}): {stderr}")]
    RecognitionFailed {
        binary: String,
        status: String,
        stderr: String,
    },
}

/// File and download errors
#[derive(Debug, Error)]
pub enum FileError {
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML {path}: {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("download of {url} failed: {source}")]
    DownloadFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {var_name}: value '{value}' is not a valid {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },

    #[error("invalid setting {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// Coarse classification used by the pipeline and the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Navigation,
    RecoverableSubmission,
    Exhausted,
    Infrastructure,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Navigation(_) => ErrorKind::Navigation,
            AppError::Submission(SubmissionError::TableNotFound) => {
                ErrorKind::RecoverableSubmission
            }
            AppError::Submission(SubmissionError::CaptchaRetriesExhausted { .. }) => {
                ErrorKind::Exhausted
            }
            _ => ErrorKind::Infrastructure,
        }
    }

    /// Only a missing results table may be retried, and only by the submission loop.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::RecoverableSubmission
    }

    // ========== convenience constructors ==========

    pub fn control_not_ready(level: SelectionLevel, reason: impl Into<String>) -> Self {
        AppError::Navigation(NavigationError::ControlNotReady {
            level,
            reason: reason.into(),
        })
    }

    pub fn element_not_found(locator: impl Into<String>) -> Self {
        AppError::Browser(BrowserError::ElementNotFound {
            locator: locator.into(),
        })
    }

    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }
}

// ========== conversions from common error types ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed { source: err })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Browser(BrowserError::UnexpectedScriptResult {
            reason: err.to_string(),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: err,
        })
    }
}

/// Application result type
pub type AppResult<T> = Result<T, AppError>;
