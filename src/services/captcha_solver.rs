//! Captcha capture and recognition

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::PortalLocators;
use crate::error::AppResult;
use crate::infrastructure::{wait_until, PortalDriver, QuerySession, TextRecognizer};
use crate::models::CaptchaAttempt;

/// Keep ASCII letters and digits only. Idempotent.
pub fn normalize_captcha(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

pub struct CaptchaSolver<R> {
    recognizer: R,
    image_locator: String,
    input_locator: String,
    refresh_locator: String,
}

impl<R: TextRecognizer> CaptchaSolver<R> {
    pub fn new(recognizer: R, locators: &PortalLocators) -> Self {
        Self {
            recognizer,
            image_locator: locators.captcha_image.clone(),
            input_locator: locators.captcha_input.clone(),
            refresh_locator: locators.captcha_refresh.clone(),
        }
    }

    pub fn image_locator(&self) -> &str {
        &self.image_locator
    }

    /// Recognize and normalize. May return an empty string; the retry loop handles
    /// any wrong guess.
    pub async fn solve(&self, image: &[u8]) -> AppResult<String> {
        let raw = self.recognizer.recognize(image).await?;
        let text = normalize_captcha(&raw);
        debug!("captcha raw '{}' → '{}'", raw, text);
        Ok(text)
    }

    /// Capture the current challenge image and solve it
    pub async fn attempt<D: PortalDriver>(
        &self,
        session: &QuerySession<D>,
        attempt_number: u32,
    ) -> AppResult<CaptchaAttempt> {
        let image_bytes = session.driver().screenshot(&self.image_locator).await?;
        let recognized_text = self.solve(&image_bytes).await?;

        Ok(CaptchaAttempt {
            image_bytes,
            recognized_text,
            attempt_number,
        })
    }

    pub async fn fill<D: PortalDriver>(
        &self,
        session: &QuerySession<D>,
        attempt: &CaptchaAttempt,
    ) -> AppResult<()> {
        session
            .driver()
            .set_value(&self.input_locator, &attempt.recognized_text)
            .await
    }

    /// Ask the portal for a fresh challenge and wait until the image `src` changes.
    ///
    /// An image without a `src` is not waited on. A `src` that never changes within
    /// `timeout` is logged and the next attempt proceeds with what is shown.
    pub async fn refresh<D: PortalDriver>(
        &self,
        session: &QuerySession<D>,
        timeout: Duration,
        poll: Duration,
    ) -> AppResult<()> {
        let driver = session.driver();
        let image = self.image_locator.as_str();
        let before = driver.attribute(image, "src").await?;

        info!("{} 🔄 refreshing captcha", session);
        driver.click(&self.refresh_locator).await?;

        let Some(before) = before else {
            return Ok(());
        };
        let label = format!("{} fresh captcha", session);
        let before = before.as_str();
        let fresh = wait_until(&label, timeout, poll, move || async move {
            let current = driver.attribute(image, "src").await?;
            Ok(current.filter(|src| src != before))
        })
        .await?;

        match fresh {
            Some(src) => debug!("{} new captcha image {}", session, src),
            None => warn!("{} ⚠️ captcha image unchanged after {:?}", session, timeout),
        }
        Ok(())
    }
}
