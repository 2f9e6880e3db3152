//! `PortalDriver` over chromiumoxide
//!
//! Form interaction goes through small JS snippets evaluated by the `JsExecutor`;
//! clicks and element screenshots go through CDP directly.

use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::Browser;
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::browser::{connect_to_browser, launch_browser};
use crate::config::Config;
use crate::error::{AppError, AppResult, BrowserError};
use crate::infrastructure::portal_driver::{ControlState, PortalDriver, SelectOption};
use crate::infrastructure::JsExecutor;

/// One isolated browser session for one query
pub struct ChromePortal {
    browser: Browser,
    executor: JsExecutor,
    handler: JoinHandle<()>,
    /// Launched by us (close the browser) or attached to (close only our page)
    owns_browser: bool,
    closed: bool,
}

impl ChromePortal {
    /// Launch a browser, or attach to `browser_debug_port` when configured, and open a
    /// fresh page.
    pub async fn open(config: &Config) -> AppResult<Self> {
        let (browser, handler, owns_browser) = match config.browser_debug_port {
            Some(port) => {
                let (browser, handler) = connect_to_browser(port).await?;
                (browser, handler, false)
            }
            None => {
                let (browser, handler) = launch_browser(config).await?;
                (browser, handler, true)
            }
        };

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(AppError::Browser(BrowserError::NavigationFailed {
                    url: "about:blank".to_string(),
                    source: e,
                }));
            }
        };
        debug!("Session page created");

        Ok(Self {
            browser,
            executor: JsExecutor::new(page),
            handler,
            owns_browser,
            closed: false,
        })
    }

    pub fn executor(&self) -> &JsExecutor {
        &self.executor
    }
}

impl PortalDriver for ChromePortal {
    async fn navigate(&self, url: &str) -> AppResult<()> {
        self.executor.page().goto(url).await.map_err(|e| {
            AppError::Browser(BrowserError::NavigationFailed {
                url: url.to_string(),
                source: e,
            })
        })?;
        info!("Navigated to: {}", url);
        Ok(())
    }

    async fn control_state(&self, locator: &str) -> AppResult<ControlState> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (!el) return {{ present: false, enabled: false, option_count: 0 }};
                return {{
                    present: true,
                    enabled: !el.disabled,
                    option_count: el.options ? el.options.length : 0
                }};
            }})()
            "#,
            serde_json::to_string(locator)?
        );
        self.executor.eval_as(js_code).await
    }

    async fn options(&self, locator: &str) -> AppResult<Vec<SelectOption>> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (!el || !el.options) return null;
                return Array.from(el.options).map(o => ({{
                    text: (o.text || '').trim(),
                    value: String(o.value || '')
                }}));
            }})()
            "#,
            serde_json::to_string(locator)?
        );
        let options: Option<Vec<SelectOption>> = self.executor.eval_as(js_code).await?;
        options.ok_or_else(|| AppError::element_not_found(locator))
    }

    async fn select_option(&self, locator: &str, visible_text: &str) -> AppResult<bool> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (!el || !el.options) return false;
                const wanted = {};
                const opt = Array.from(el.options).find(o => (o.text || '').trim() === wanted);
                if (!opt) return false;
                el.value = opt.value;
                opt.selected = true;
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()
            "#,
            serde_json::to_string(locator)?,
            serde_json::to_string(visible_text)?
        );
        let selected: bool = self.executor.eval_as(js_code).await?;
        debug!("select '{}' in {}: {}", visible_text, locator, selected);
        Ok(selected)
    }

    async fn set_value(&self, locator: &str, value: &str) -> AppResult<()> {
        let payload = json!({ "locator": locator, "value": value });
        let js_code = format!(
            r#"
            ((payload) => {{
                const el = document.querySelector(payload.locator);
                if (!el) return false;
                el.value = '';
                el.value = payload.value;
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})({})
            "#,
            payload
        );
        let found: bool = self.executor.eval_as(js_code).await?;
        if !found {
            return Err(AppError::element_not_found(locator));
        }
        Ok(())
    }

    async fn attribute(&self, locator: &str, name: &str) -> AppResult<Option<String>> {
        let payload = json!({ "locator": locator, "name": name });
        let js_code = format!(
            r#"
            ((payload) => {{
                const el = document.querySelector(payload.locator);
                return el ? el.getAttribute(payload.name) : null;
            }})({})
            "#,
            payload
        );
        self.executor.eval_as(js_code).await
    }

    async fn click(&self, locator: &str) -> AppResult<()> {
        let element = self
            .executor
            .page()
            .find_element(locator)
            .await
            .map_err(|_| AppError::element_not_found(locator))?;
        element.click().await?;
        Ok(())
    }

    async fn screenshot(&self, locator: &str) -> AppResult<Vec<u8>> {
        let element = self
            .executor
            .page()
            .find_element(locator)
            .await
            .map_err(|_| AppError::element_not_found(locator))?;
        let bytes = element.screenshot(CaptureScreenshotFormat::Png).await?;
        debug!("Captured {} bytes from {}", bytes.len(), locator);
        Ok(bytes)
    }

    async fn content(&self) -> AppResult<String> {
        Ok(self.executor.page().content().await?)
    }

    async fn close(&mut self) -> AppResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if self.owns_browser {
            self.browser.close().await?;
            if let Err(e) = self.browser.wait().await {
                warn!("Browser process did not exit cleanly: {}", e);
            }
        } else {
            self.executor.page().clone().close().await?;
        }
        self.handler.abort();
        info!("Browser session closed");
        Ok(())
    }
}

impl Drop for ChromePortal {
    fn drop(&mut self) {
        // a launched child browser is killed by chromiumoxide's own Drop
        self.handler.abort();
    }
}
