//! Non-cascading form fields: hearing date and case type

use chrono::NaiveDate;
use tracing::info;

use crate::config::{Config, PortalLocators};
use crate::error::AppResult;
use crate::infrastructure::{PortalDriver, QuerySession};
use crate::models::{format_date, parse_date, CaseType};

pub struct FormFiller {
    locators: PortalLocators,
}

impl FormFiller {
    pub fn new(config: &Config) -> Self {
        Self {
            locators: config.locators.clone(),
        }
    }

    /// Validate `input` as `DD-MM-YYYY` and write it into the date field.
    /// Invalid input never reaches the page.
    pub async fn set_date<D: PortalDriver>(
        &self,
        session: &QuerySession<D>,
        input: &str,
    ) -> AppResult<NaiveDate> {
        let date = parse_date(input)?;
        self.fill_date(session, date).await?;
        Ok(date)
    }

    pub async fn fill_date<D: PortalDriver>(
        &self,
        session: &QuerySession<D>,
        date: NaiveDate,
    ) -> AppResult<()> {
        let value = format_date(date);
        session
            .driver()
            .set_value(&self.locators.date_input, &value)
            .await?;
        info!("{} ✓ date: {}", session, value);
        Ok(())
    }

    /// The portal picks the case type through the submit control, so this only
    /// validates and returns the choice the submission step acts on.
    pub fn set_case_type(&self, input: &str) -> AppResult<CaseType> {
        Ok(CaseType::parse(input)?)
    }

    pub fn submit_locator(&self, case_type: CaseType) -> &str {
        self.locators.submit_for(case_type)
    }
}
