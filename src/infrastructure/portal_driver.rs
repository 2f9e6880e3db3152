//! Browser-session capability consumed by the pipeline
//!
//! The pipeline only sees this trait; `ChromePortal` implements it over CDP and the
//! tests implement it in memory.

use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// Snapshot of a form control
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ControlState {
    pub present: bool,
    pub enabled: bool,
    /// `<option>` count for selects, 0 otherwise
    pub option_count: usize,
}

impl ControlState {
    pub fn is_ready(&self) -> bool {
        self.present && self.enabled
    }

    /// Ready and holding more than the placeholder option
    pub fn is_populated(&self) -> bool {
        self.is_ready() && self.option_count > 1
    }
}

/// One `<option>` of a select control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub text: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
        }
    }

    /// "Select state" style entries carry an empty or zero value
    pub fn is_placeholder(&self) -> bool {
        let value = self.value.trim();
        value.is_empty() || value == "0"
    }
}

/// Operations the pipeline needs from a live portal page
#[allow(async_fn_in_trait)]
pub trait PortalDriver {
    async fn navigate(&self, url: &str) -> AppResult<()>;

    async fn control_state(&self, locator: &str) -> AppResult<ControlState>;

    /// Options currently rendered in a select control
    async fn options(&self, locator: &str) -> AppResult<Vec<SelectOption>>;

    /// Select the option whose visible text equals `visible_text` and fire `change`.
    /// Returns `false` when no such option exists; nothing changes in that case.
    async fn select_option(&self, locator: &str, visible_text: &str) -> AppResult<bool>;

    async fn set_value(&self, locator: &str, value: &str) -> AppResult<()>;

    /// Attribute of the first matching element; `None` when the element or the
    /// attribute is missing
    async fn attribute(&self, locator: &str, name: &str) -> AppResult<Option<String>>;

    async fn click(&self, locator: &str) -> AppResult<()>;

    /// PNG bytes of one element
    async fn screenshot(&self, locator: &str) -> AppResult<Vec<u8>>;

    /// Current page HTML
    async fn content(&self) -> AppResult<String>;

    /// Release the session
    async fn close(&mut self) -> AppResult<()> {
        Ok(())
    }
}
