//! Cascading selection service
//!
//! Resolves one level of the state → district → court complex → court chain.
//! Knows nothing about the order of a whole query; that is the flow's job.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{Config, PortalLocators};
use crate::error::{AppError, AppResult, NavigationError};
use crate::infrastructure::{wait_until, PortalDriver, QuerySession, SelectOption};
use crate::models::{CascadeSelection, SelectionLevel};
use crate::utils::logging::truncate_text;

pub struct CascadeResolver {
    locators: PortalLocators,
}

impl CascadeResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            locators: config.locators.clone(),
        }
    }

    /// Select `requested` (exact visible text) at `level` and commit it to the session.
    ///
    /// Fails with `ControlNotReady` when the predecessor level is not committed or the
    /// control is absent/disabled, and with `OptionNotFound` when no option matches.
    /// Nothing is committed on failure.
    pub async fn resolve<D: PortalDriver>(
        &self,
        session: &mut QuerySession<D>,
        level: SelectionLevel,
        requested: &str,
    ) -> AppResult<CascadeSelection> {
        if let Some(previous) = level.previous() {
            if !session.is_committed(previous) {
                return Err(AppError::control_not_ready(
                    level,
                    format!("{} has not been selected", previous),
                ));
            }
        }

        let locator = self.locators.select_for(level);
        let state = session.driver().control_state(locator).await?;
        if !state.is_ready() {
            let reason = if state.present {
                "control is disabled"
            } else {
                "control is not on the page"
            };
            return Err(AppError::control_not_ready(level, reason));
        }

        let options = self.fetch_options(session, level).await?;
        let Some(matched) = options.iter().find(|o| o.text == requested) else {
            debug!(
                "{} {} options: {}",
                session,
                level,
                truncate_text(
                    &options
                        .iter()
                        .map(|o| o.text.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                    200
                )
            );
            return Err(NavigationError::OptionNotFound {
                level,
                requested: requested.to_string(),
                available: options.len(),
            }
            .into());
        };

        // the option list may have been re-rendered between the read and the select
        if !session.driver().select_option(locator, &matched.text).await? {
            warn!("{} ⚠️ {} option '{}' vanished before selection", session, level, requested);
            return Err(NavigationError::OptionNotFound {
                level,
                requested: requested.to_string(),
                available: options.len(),
            }
            .into());
        }

        let selection = CascadeSelection::new(level, requested).resolved(matched.value.clone());
        session.commit(selection.clone());
        info!("{} ✓ {}: {}", session, level, requested);

        Ok(selection)
    }

    /// Read the live, non-placeholder option list of `level` and cache it
    pub async fn fetch_options<D: PortalDriver>(
        &self,
        session: &mut QuerySession<D>,
        level: SelectionLevel,
    ) -> AppResult<Vec<SelectOption>> {
        let options: Vec<SelectOption> = session
            .driver()
            .options(self.locators.select_for(level))
            .await?
            .into_iter()
            .filter(|o| !o.is_placeholder())
            .collect();

        session.cache_options(level, options.clone());
        Ok(options)
    }

    /// Wait until `level`'s control holds real options, e.g. after its predecessor changed
    pub async fn wait_for_population<D: PortalDriver>(
        &self,
        session: &QuerySession<D>,
        level: SelectionLevel,
        timeout: Duration,
        poll: Duration,
    ) -> AppResult<()> {
        let driver = session.driver();
        let locator = self.locators.select_for(level);
        let label = format!("{} {} options", session, level);

        let populated = wait_until(&label, timeout, poll, move || async move {
            let state = driver.control_state(locator).await?;
            Ok((state.is_ready() && state.is_populated()).then_some(()))
        })
        .await?;

        populated.ok_or_else(|| {
            AppError::control_not_ready(level, format!("no options within {:?}", timeout))
        })
    }
}
