//! Orchestration layer
//!
//! ## Modules
//!
//! ### `batch_processor`
//! - application entry (`App`)
//! - loads query files, bounds concurrent sessions, aggregates statistics
//!
//! ### `query_processor`
//! - one query: opens its browser session, runs the flow, always closes the session
//! - writes the JSON report and optional PDF downloads
//! - same for single-case lookups (`process_lookup`)
//!
//! ## Layering
//!
//! ```text
//! batch_processor (Vec<CauseListQuery>)
//!     ↓
//! query_processor (one CauseListQuery, one session)
//!     ↓
//! workflow::CauseListFlow
//!     ↓
//! services (cascade / form / captcha / extraction / report / download)
//!     ↓
//! infrastructure (PortalDriver, TextRecognizer)
//! ```
//!
//! Only this layer creates browser sessions.

pub mod batch_processor;
pub mod query_processor;

pub use batch_processor::{App, BatchStats};
pub use query_processor::{
    process_lookup, process_query, run_in_session, run_lookup_in_session, ProcessedQuery,
};
