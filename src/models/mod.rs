pub mod loaders;
pub mod lookup;
pub mod query;
pub mod record;
pub mod report;

pub use loaders::{load_all_query_files, load_query_file};
pub use lookup::{CaseLookup, CaseLookupQuery};
pub use query::{
    format_date, parse_date, parse_target_dates, CascadeSelection, CaseType, CauseListQuery, RawQuery,
    SelectionLevel, DATE_FORMAT,
};
pub use record::{CaptchaAttempt, CauseListRecord, ExtractionResult};
pub use report::{QueryReport, ReportQuery};
