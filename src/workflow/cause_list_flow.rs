//! Cause-list query flow - workflow layer
//!
//! Defines the order of one query:
//! 1. open the portal and the cause-list page (popup dismissed if shown)
//! 2. state → district → court complex → court, waiting for each repopulation
//! 3. hearing date
//! 4. captcha / submit retry loop
//! 5. extraction
//!
//! Holds no resources; the session is passed in and closed by the caller.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{Config, PortalLocators};
use crate::error::{AppError, AppResult};
use crate::infrastructure::{wait_until, PortalDriver, QuerySession, TextRecognizer};
use crate::models::{CauseListQuery, ExtractionResult, SelectionLevel};
use crate::services::{CascadeResolver, FormFiller, ResultExtractor};
use crate::workflow::submission_loop::SubmissionRetryLoop;

/// Result of a completed query
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub result: ExtractionResult,
    pub attempts: u32,
    /// Absolute PDF links found on the results page
    pub pdf_links: Vec<String>,
}

pub struct CauseListFlow<R> {
    home_url: String,
    locators: PortalLocators,
    cascade_timeout: Duration,
    popup_timeout: Duration,
    poll_interval: Duration,
    resolver: CascadeResolver,
    filler: FormFiller,
    submission: SubmissionRetryLoop<R>,
}

impl<R: TextRecognizer> CauseListFlow<R> {
    pub fn new(config: &Config, recognizer: R) -> Self {
        Self {
            home_url: config.home_url.clone(),
            locators: config.locators.clone(),
            cascade_timeout: config.cascade_timeout(),
            popup_timeout: config.popup_timeout(),
            poll_interval: config.poll_interval(),
            resolver: CascadeResolver::new(config),
            filler: FormFiller::new(config),
            submission: SubmissionRetryLoop::new(config, recognizer),
        }
    }

    pub fn with_extractor(mut self, extractor: ResultExtractor) -> Self {
        self.submission = self.submission.with_extractor(extractor);
        self
    }

    /// Run one query end to end
    pub async fn run<D: PortalDriver>(
        &self,
        session: &mut QuerySession<D>,
        query: &CauseListQuery,
    ) -> AppResult<QueryOutcome> {
        info!("{} 🚀 {}", session, query.label());
        self.open_portal(session).await?;

        // ========== Cascade ==========
        for (level, value) in query.selections() {
            self.resolver.resolve(session, level, value).await?;
            if let Some(next) = level.next() {
                self.resolver
                    .wait_for_population(session, next, self.cascade_timeout, self.poll_interval)
                    .await?;
            }
        }

        // ========== Form ==========
        if let Some(date) = query.date() {
            self.filler.fill_date(session, date).await?;
        } else {
            debug!("{} no date given, keeping the portal's default", session);
        }

        // ========== Submit ==========
        let success = self
            .submission
            .run(session, query.case_type(), query.target_dates())
            .await?;

        let pdf_links = ResultExtractor::pdf_links(&success.page_content, &self.home_url);
        if !pdf_links.is_empty() {
            info!("{} 📎 {} PDF link(s) on the results page", session, pdf_links.len());
        }

        Ok(QueryOutcome {
            result: success.result,
            attempts: success.attempts,
            pdf_links,
        })
    }

    /// Visible option texts of `level`, after committing `prior` (one value per
    /// lower level, in order). Selections already committed with the same value are
    /// reused, so repeated discovery calls stay cheap.
    pub async fn list_available_options<D: PortalDriver>(
        &self,
        session: &mut QuerySession<D>,
        level: SelectionLevel,
        prior: &[String],
    ) -> AppResult<Vec<String>> {
        let needed = level.index();
        if prior.len() < needed {
            return Err(AppError::control_not_ready(
                level,
                format!("{} prior selection(s) required, {} given", needed, prior.len()),
            ));
        }

        if !session.is_portal_open() {
            self.open_portal(session).await?;
        }

        for (prior_level, value) in SelectionLevel::ALL.into_iter().zip(prior.iter()).take(needed) {
            let unchanged = session
                .committed_selection(prior_level)
                .is_some_and(|s| s.requested_value == *value);
            if unchanged {
                debug!("{} {} '{}' already selected", session, prior_level, value);
                continue;
            }

            self.resolver.resolve(session, prior_level, value).await?;
            if let Some(next) = prior_level.next() {
                self.resolver
                    .wait_for_population(session, next, self.cascade_timeout, self.poll_interval)
                    .await?;
            }
        }

        if let Some(cached) = session.cached_options(level) {
            debug!("{} {} options from cache", session, level);
            return Ok(cached.iter().map(|o| o.text.clone()).collect());
        }

        let options = self.resolver.fetch_options(session, level).await?;
        Ok(options.into_iter().map(|o| o.text).collect())
    }

    /// Load the portal and open the cause-list page; the state control must populate
    pub async fn open_portal<D: PortalDriver>(&self, session: &mut QuerySession<D>) -> AppResult<()> {
        session.reset();
        session.driver().navigate(&self.home_url).await?;

        let menu = self.locators.cause_list_menu.as_str();
        let menu_ready = self.control_present(session, menu, self.cascade_timeout).await?;
        if !menu_ready {
            return Err(AppError::element_not_found(menu));
        }
        session.driver().click(menu).await?;
        info!("{} ✓ cause-list page opened", session);

        self.dismiss_popup(session).await;

        self.resolver
            .wait_for_population(
                session,
                SelectionLevel::State,
                self.cascade_timeout,
                self.poll_interval,
            )
            .await?;
        session.mark_portal_open();
        Ok(())
    }

    /// Close the notice popup if one appears; never fails the query
    async fn dismiss_popup<D: PortalDriver>(&self, session: &QuerySession<D>) {
        let close = self.locators.popup_close.as_str();
        match self.control_present(session, close, self.popup_timeout).await {
            Ok(true) => match session.driver().click(close).await {
                Ok(()) => debug!("{} popup closed", session),
                Err(e) => warn!("{} ⚠️ popup could not be closed: {}", session, e),
            },
            Ok(false) => debug!("{} no popup", session),
            Err(e) => warn!("{} ⚠️ popup check failed: {}", session, e),
        }
    }

    async fn control_present<D: PortalDriver>(
        &self,
        session: &QuerySession<D>,
        locator: &str,
        timeout: Duration,
    ) -> AppResult<bool> {
        let driver = session.driver();
        let found = wait_until(locator, timeout, self.poll_interval, move || async move {
            let state = driver.control_state(locator).await?;
            Ok(state.is_ready().then_some(()))
        })
        .await?;
        Ok(found.is_some())
    }
}
