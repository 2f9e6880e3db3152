//! JS executor
//!
//! Holds the page and only exposes "evaluate JS" plus raw page access.

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::AppResult;
use crate::utils::logging::truncate_text;

/// JS executor
///
/// - owns the single `Page` of a query session
/// - knows nothing about cause lists or form levels
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Evaluate a JS expression and return its JSON value
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let js_code = js_code.into();
        debug!("eval: {}", truncate_text(js_code.trim(), 120));
        let result = self.page.evaluate(js_code).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// Evaluate a JS expression and deserialize the result
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> AppResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }
}
