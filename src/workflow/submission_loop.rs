//! Captcha solve / submit retry loop
//!
//! Ready → Solving → Submitting → Success | Retry | Exhausted
//!
//! What to do after a submit is decided by [`decide`], a pure function of the
//! outcome variant, so the loop's policy is testable without a browser.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, SubmissionError};
use crate::infrastructure::{wait_until, PortalDriver, QuerySession, TextRecognizer};
use crate::models::{CaseType, ExtractionResult};
use crate::services::{page_text, CaptchaSolver, FormFiller, ResultExtractor, TableBaseline};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Ready,
    Solving,
    Submitting,
    Success,
    Retry,
    Exhausted,
}

/// What the page looked like once the post-submit wait ended
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Results {
        result: ExtractionResult,
        page_content: String,
    },
    CaptchaRejected,
    TableMissing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Success {
        result: ExtractionResult,
        page_content: String,
    },
    Retry,
    Exhausted,
}

impl Transition {
    pub fn state(&self) -> LoopState {
        match self {
            Transition::Success { .. } => LoopState::Success,
            Transition::Retry => LoopState::Retry,
            Transition::Exhausted => LoopState::Exhausted,
        }
    }
}

/// Next step after attempt `attempt` (1-based) of `max_attempts`
pub fn decide(outcome: SubmitOutcome, attempt: u32, max_attempts: u32) -> Transition {
    match outcome {
        SubmitOutcome::Results {
            result,
            page_content,
        } => Transition::Success {
            result,
            page_content,
        },
        SubmitOutcome::CaptchaRejected | SubmitOutcome::TableMissing => {
            if attempt >= max_attempts {
                Transition::Exhausted
            } else {
                Transition::Retry
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubmissionSuccess {
    pub result: ExtractionResult,
    pub page_content: String,
    /// Attempts used, including the successful one
    pub attempts: u32,
}

pub struct SubmissionRetryLoop<R> {
    solver: CaptchaSolver<R>,
    extractor: ResultExtractor,
    filler: FormFiller,
    max_attempts: u32,
    submit_timeout: Duration,
    captcha_timeout: Duration,
    poll_interval: Duration,
    invalid_captcha_markers: Vec<String>,
}

impl<R: TextRecognizer> SubmissionRetryLoop<R> {
    pub fn new(config: &Config, recognizer: R) -> Self {
        Self {
            solver: CaptchaSolver::new(recognizer, &config.locators),
            extractor: ResultExtractor::from_config(config),
            filler: FormFiller::new(config),
            max_attempts: config.max_captcha_attempts,
            submit_timeout: config.submit_timeout(),
            captcha_timeout: config.cascade_timeout(),
            poll_interval: config.poll_interval(),
            invalid_captcha_markers: config.invalid_captcha_markers.clone(),
        }
    }

    pub fn with_extractor(mut self, extractor: ResultExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub async fn run<D: PortalDriver>(
        &self,
        session: &QuerySession<D>,
        case_type: CaseType,
        target_dates: Option<&BTreeSet<NaiveDate>>,
    ) -> AppResult<SubmissionSuccess> {
        let mut state = LoopState::Ready;

        for attempt_number in 1..=self.max_attempts {
            debug!("{} {:?} → Solving", session, state);
            self.wait_for_captcha(session).await?;

            state = LoopState::Solving;
            let attempt = self.solver.attempt(session, attempt_number).await?;
            info!(
                "{} 🔐 attempt {}/{}: captcha '{}'",
                session, attempt_number, self.max_attempts, attempt.recognized_text
            );
            self.solver.fill(session, &attempt).await?;

            debug!("{} {:?} → Submitting", session, state);
            state = LoopState::Submitting;
            let before_submit = session.driver().content().await?;
            let baseline = ResultExtractor::baseline(&before_submit);
            let stale_rejection = self.shows_rejection(&before_submit);
            session
                .driver()
                .click(self.filler.submit_locator(case_type))
                .await?;

            let outcome = self
                .await_outcome(session, &baseline, stale_rejection, target_dates)
                .await?;
            let outcome_label = match &outcome {
                SubmitOutcome::Results { .. } => "results table",
                SubmitOutcome::CaptchaRejected => "captcha rejected",
                SubmitOutcome::TableMissing => "no results table",
            };

            let transition = decide(outcome, attempt_number, self.max_attempts);
            debug!("{} {:?} → {:?}", session, state, transition.state());
            state = transition.state();

            match transition {
                Transition::Success {
                    result,
                    page_content,
                } => {
                    info!(
                        "{} ✓ results after {} attempt(s): {} record(s)",
                        session,
                        attempt_number,
                        result.len()
                    );
                    return Ok(SubmissionSuccess {
                        result,
                        page_content,
                        attempts: attempt_number,
                    });
                }
                Transition::Retry => {
                    warn!(
                        "{} ⚠️ attempt {}/{} failed ({}), retrying",
                        session, attempt_number, self.max_attempts, outcome_label
                    );
                    self.solver
                        .refresh(session, self.captcha_timeout, self.poll_interval)
                        .await?;
                    state = LoopState::Ready;
                }
                Transition::Exhausted => {
                    warn!(
                        "{} ❌ attempt {}/{} failed ({}), giving up",
                        session, attempt_number, self.max_attempts, outcome_label
                    );
                }
            }
        }

        debug!("{} finished in {:?}", session, state);
        Err(SubmissionError::CaptchaRetriesExhausted {
            attempts: self.max_attempts,
        }
        .into())
    }

    async fn wait_for_captcha<D: PortalDriver>(&self, session: &QuerySession<D>) -> AppResult<()> {
        let driver = session.driver();
        let locator = self.solver.image_locator();
        let label = format!("{} captcha image", session);

        let ready = wait_until(&label, self.captcha_timeout, self.poll_interval, move || async move {
            Ok(driver.control_state(locator).await?.present.then_some(()))
        })
        .await?;

        ready.ok_or_else(|| AppError::element_not_found(locator))
    }

    /// Whether the visible page text carries an invalid-captcha marker
    fn shows_rejection(&self, page_content: &str) -> bool {
        let visible = page_text(page_content).to_lowercase();
        self.invalid_captcha_markers
            .iter()
            .any(|m| visible.contains(&m.to_lowercase()))
    }

    /// Poll the page until a captcha rejection or a results table shows up.
    ///
    /// Tables in `baseline` were there before the submit and need record rows to
    /// count. A marker already visible before the submit (`stale_rejection`) is left
    /// to the timeout, so the new page gets a chance to replace it.
    async fn await_outcome<D: PortalDriver>(
        &self,
        session: &QuerySession<D>,
        baseline: &TableBaseline,
        stale_rejection: bool,
        target_dates: Option<&BTreeSet<NaiveDate>>,
    ) -> AppResult<SubmitOutcome> {
        let driver = session.driver();
        let extractor = &self.extractor;
        let label = format!("{} results", session);

        let outcome = wait_until(&label, self.submit_timeout, self.poll_interval, move || async move {
            let page = driver.content().await?;

            let rejected = self.shows_rejection(&page);
            if rejected && !stale_rejection {
                return Ok(Some(SubmitOutcome::CaptchaRejected));
            }

            if let Ok(result) = extractor.extract_since(&page, baseline, target_dates) {
                return Ok(Some(SubmitOutcome::Results {
                    result,
                    page_content: page,
                }));
            }

            Ok(None)
        })
        .await?;

        Ok(outcome.unwrap_or(if stale_rejection {
            SubmitOutcome::CaptchaRejected
        } else {
            SubmitOutcome::TableMissing
        }))
    }
}
