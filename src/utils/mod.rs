pub mod logging;
pub mod text;

pub use logging::truncate_text;
pub use text::{normalize_whitespace, title_case};
