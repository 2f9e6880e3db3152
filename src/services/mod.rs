//! Services layer
//!
//! Each service is one capability over a `QuerySession`; none of them knows the
//! order in which a query runs.

pub mod captcha_solver;
pub mod cascade_resolver;
pub mod downloader;
pub mod form_filler;
pub mod report_writer;
pub mod result_extractor;

pub use captcha_solver::{normalize_captcha, CaptchaSolver};
pub use cascade_resolver::CascadeResolver;
pub use downloader::Downloader;
pub use form_filler::FormFiller;
pub use report_writer::ReportWriter;
pub use result_extractor::{
    page_text, parse_date_token, CellExtractor, CellText, ColumnMapping, RecordField,
    ResultExtractor, TableBaseline,
};
