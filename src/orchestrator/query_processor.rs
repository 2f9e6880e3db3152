//! Single query processor - orchestration layer
//!
//! Owns the browser session of one query: opens it, hands it to the flow, always
//! closes it, then persists the report and optional downloads.

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, SubmissionError};
use crate::infrastructure::{
    ChromePortal, PortalDriver, QuerySession, TesseractRecognizer, TextRecognizer,
};
use crate::models::{CaseLookupQuery, CauseListQuery, QueryReport};
use crate::services::{Downloader, ReportWriter};
use crate::workflow::{CaseLookupFlow, CauseListFlow, QueryOutcome};

/// Report plus where it was written (if writing succeeded)
#[derive(Debug)]
pub struct ProcessedQuery {
    pub report: QueryReport,
    pub report_path: Option<String>,
}

/// Run one query in its own browser session
pub async fn process_query(
    config: &Config,
    query: &CauseListQuery,
    query_index: usize,
) -> ProcessedQuery {
    let mut report = QueryReport::new(query);

    match ChromePortal::open(config).await {
        Ok(portal) => {
            let mut session = QuerySession::new(portal, query_index);
            let flow = CauseListFlow::new(config, TesseractRecognizer::new(config));
            let outcome = run_in_session(&flow, &mut session, query).await;
            apply_outcome(config, &mut report, outcome, query_index).await;
        }
        Err(e) => {
            error!("[query {}] ❌ browser session could not be opened: {}", query_index, e);
            report.record_error(&e);
        }
    }

    save_report(config, report, query_index).await
}

/// Look up one case in its own browser session
pub async fn process_lookup(
    config: &Config,
    query: &CaseLookupQuery,
    query_index: usize,
) -> ProcessedQuery {
    let mut report = QueryReport::for_lookup(query);

    match ChromePortal::open(config).await {
        Ok(portal) => {
            let mut session = QuerySession::new(portal, query_index);
            let flow = CaseLookupFlow::new(config);
            let outcome = run_lookup_in_session(&flow, &mut session, query).await;
            apply_outcome(config, &mut report, outcome, query_index).await;
        }
        Err(e) => {
            error!("[query {}] ❌ browser session could not be opened: {}", query_index, e);
            report.record_error(&e);
        }
    }

    save_report(config, report, query_index).await
}

async fn save_report(config: &Config, report: QueryReport, query_index: usize) -> ProcessedQuery {
    let report_path = match ReportWriter::new(&config.output_dir)
        .write(&report, query_index)
        .await
    {
        Ok(path) => Some(path.display().to_string()),
        Err(e) => {
            error!("[query {}] ❌ report not saved: {}", query_index, e);
            None
        }
    };

    ProcessedQuery {
        report,
        report_path,
    }
}

/// Run the flow and close the session whatever the flow returned
pub async fn run_in_session<D: PortalDriver, R: TextRecognizer>(
    flow: &CauseListFlow<R>,
    session: &mut QuerySession<D>,
    query: &CauseListQuery,
) -> Result<QueryOutcome, AppError> {
    let outcome = flow.run(session, query).await;
    if let Err(e) = session.close().await {
        warn!("{} ⚠️ session close failed: {}", session, e);
    }
    outcome
}

/// Case lookup counterpart of [`run_in_session`]
pub async fn run_lookup_in_session<D: PortalDriver>(
    flow: &CaseLookupFlow,
    session: &mut QuerySession<D>,
    query: &CaseLookupQuery,
) -> Result<QueryOutcome, AppError> {
    let outcome = flow.run(session, query).await;
    if let Err(e) = session.close().await {
        warn!("{} ⚠️ session close failed: {}", session, e);
    }
    outcome
}

async fn apply_outcome(
    config: &Config,
    report: &mut QueryReport,
    outcome: Result<QueryOutcome, AppError>,
    query_index: usize,
) {
    match outcome {
        Ok(outcome) => {
            let listed = outcome.result.listed();
            info!(
                "[query {}] {} {} record(s), {} attempt(s)",
                query_index,
                if listed { "✅ listed:" } else { "➖ not listed:" },
                outcome.result.len(),
                outcome.attempts
            );
            report.record_result(outcome.result, outcome.attempts);

            if config.download_pdfs && listed && !outcome.pdf_links.is_empty() {
                download_links(config, report, &outcome.pdf_links).await;
            }
        }
        Err(e) => {
            error!("[query {}] ❌ {}", query_index, e);
            if let AppError::Submission(SubmissionError::CaptchaRetriesExhausted { attempts }) = &e {
                report.attempts = *attempts;
            }
            report.record_error(&e);
        }
    }
}

async fn download_links(config: &Config, report: &mut QueryReport, links: &[String]) {
    match Downloader::new(&config.output_dir) {
        Ok(downloader) => {
            let (saved, errors) = downloader.download_all(links).await;
            report.downloads.extend(saved);
            report.errors.extend(errors);
        }
        Err(e) => report.record_error(&e),
    }
}
