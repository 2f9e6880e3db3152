//! Case lookup flow - workflow layer
//!
//! 1. open the portal's search page
//! 2. fill the CNR, or the case type / number / year fields
//! 3. search and wait for a listing table
//! 4. extraction with the same date filter as cause lists

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::config::{Config, PortalLocators};
use crate::error::{AppError, AppResult, SubmissionError};
use crate::infrastructure::{wait_until, PortalDriver, QuerySession};
use crate::models::{CaseLookup, CaseLookupQuery, ExtractionResult};
use crate::services::{ResultExtractor, TableBaseline};
use crate::workflow::QueryOutcome;

pub struct CaseLookupFlow {
    home_url: String,
    locators: PortalLocators,
    field_timeout: Duration,
    result_timeout: Duration,
    poll_interval: Duration,
    extractor: ResultExtractor,
}

impl CaseLookupFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            home_url: config.home_url.clone(),
            locators: config.locators.clone(),
            field_timeout: config.cascade_timeout(),
            result_timeout: config.submit_timeout(),
            poll_interval: config.poll_interval(),
            extractor: ResultExtractor::from_config(config),
        }
    }

    pub fn with_extractor(mut self, extractor: ResultExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub async fn run<D: PortalDriver>(
        &self,
        session: &mut QuerySession<D>,
        query: &CaseLookupQuery,
    ) -> AppResult<QueryOutcome> {
        info!("{} 🔎 {}", session, query.label());
        session.reset();
        session.driver().navigate(&self.home_url).await?;

        // ========== Search form ==========
        let fields: Vec<(&str, &str)> = match query.lookup() {
            CaseLookup::Cnr { cnr } => vec![(self.locators.cnr_input.as_str(), cnr.as_str())],
            CaseLookup::CaseNumber {
                case_type,
                number,
                year,
            } => vec![
                (self.locators.case_type_input.as_str(), case_type.as_str()),
                (self.locators.case_number_input.as_str(), number.as_str()),
                (self.locators.case_year_input.as_str(), year.as_str()),
            ],
        };

        for (locator, value) in fields {
            self.wait_for_field(session, locator).await?;
            session.driver().set_value(locator, value).await?;
            debug!("{} {} = '{}'", session, locator, value);
        }

        // ========== Search ==========
        let before_search = session.driver().content().await?;
        let baseline = ResultExtractor::baseline(&before_search);
        session.driver().click(&self.locators.search_button).await?;

        let (result, page_content) = self
            .await_listing(session, &baseline, query.target_dates())
            .await?;
        info!("{} ✓ {} listing(s) kept", session, result.len());

        let pdf_links = ResultExtractor::pdf_links(&page_content, &self.home_url);
        Ok(QueryOutcome {
            result,
            attempts: 1,
            pdf_links,
        })
    }

    async fn wait_for_field<D: PortalDriver>(
        &self,
        session: &QuerySession<D>,
        locator: &str,
    ) -> AppResult<()> {
        let driver = session.driver();
        let found = wait_until(locator, self.field_timeout, self.poll_interval, move || async move {
            Ok(driver.control_state(locator).await?.is_ready().then_some(()))
        })
        .await?;
        found.ok_or_else(|| AppError::element_not_found(locator))
    }

    async fn await_listing<D: PortalDriver>(
        &self,
        session: &QuerySession<D>,
        baseline: &TableBaseline,
        target_dates: Option<&BTreeSet<NaiveDate>>,
    ) -> AppResult<(ExtractionResult, String)> {
        let driver = session.driver();
        let extractor = &self.extractor;
        let label = format!("{} case listing", session);

        let found = wait_until(&label, self.result_timeout, self.poll_interval, move || async move {
            let page = driver.content().await?;
            Ok(extractor
                .extract_since(&page, baseline, target_dates)
                .ok()
                .map(|result| (result, page)))
        })
        .await?;

        found.ok_or_else(|| SubmissionError::TableNotFound.into())
    }
}
