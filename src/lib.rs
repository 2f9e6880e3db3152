//! # eCourts cause-list retrieval
//!
//! Drives the Indian eCourts portal through a browser: picks state, district, court
//! complex and court in the cascading form, solves the captcha optically, and turns
//! the cause-list table into structured records, optionally filtered by hearing date.
//!
//! ## Layers
//!
//! ### ① Infrastructure
//! - `infrastructure/` - owns scarce resources and only exposes capabilities
//! - `PortalDriver` / `ChromePortal` - the browser page (chromiumoxide)
//! - `TextRecognizer` / `TesseractRecognizer` - the OCR engine
//! - `QuerySession` - one query's driver plus its committed selections
//!
//! ### ② Services
//! - `services/` - one capability each, no ordering knowledge
//! - `CascadeResolver`, `FormFiller`, `CaptchaSolver`, `ResultExtractor`,
//!   `ReportWriter`, `Downloader`
//!
//! ### ③ Workflow
//! - `workflow/` - the order of one query
//! - `CauseListFlow` - cascade → date → submit → extract
//! - `SubmissionRetryLoop` - bounded captcha retries
//!
//! ### ④ Orchestration
//! - `orchestrator/` - sessions, concurrency, reports, statistics

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

pub use config::{Config, PortalLocators};
pub use error::{AppError, AppResult, ErrorKind};
pub use infrastructure::{
    ChromePortal, ControlState, PortalDriver, QuerySession, SelectOption, TesseractRecognizer,
    TextRecognizer,
};
pub use models::{
    CaseLookup, CaseLookupQuery, CaseType, CauseListQuery, CauseListRecord, ExtractionResult,
    QueryReport, RawQuery, SelectionLevel,
};
pub use orchestrator::{App, BatchStats};
pub use workflow::{CaseLookupFlow, CauseListFlow, QueryOutcome};
