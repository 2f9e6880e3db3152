//! Infrastructure layer
//!
//! Owns scarce resources (browser, page, OCR engine) and only exposes capabilities.

pub mod chrome_portal;
pub mod js_executor;
pub mod ocr;
pub mod portal_driver;
pub mod query_session;
pub mod wait;

pub use chrome_portal::ChromePortal;
pub use js_executor::JsExecutor;
pub use ocr::{TesseractRecognizer, TextRecognizer};
pub use portal_driver::{ControlState, PortalDriver, SelectOption};
pub use query_session::QuerySession;
pub use wait::wait_until;
