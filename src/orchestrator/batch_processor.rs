//! Batch processor - orchestration layer
//!
//! Entry point of the application logic:
//! 1. load queries (single query or a folder of TOML files)
//! 2. run them with bounded concurrency, one browser session per query
//! 3. aggregate statistics
//!
//! Does not look inside a query; `query_processor` does that.

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{ChromePortal, QuerySession, TesseractRecognizer};
use crate::models::{
    load_all_query_files, CaseLookupQuery, CauseListQuery, QueryReport, SelectionLevel,
};
use crate::orchestrator::query_processor::{self, ProcessedQuery};
use crate::utils::logging::{log_query_start, log_startup, print_final_stats};
use crate::workflow::CauseListFlow;

/// Application entry
pub struct App {
    config: Config,
}

/// Aggregated batch statistics
#[derive(Debug, Default)]
pub struct BatchStats {
    pub listed: usize,
    pub not_listed: usize,
    pub failed: usize,
    pub reports: Vec<QueryReport>,
    pub report_paths: Vec<String>,
}

impl BatchStats {
    fn add(&mut self, processed: ProcessedQuery) {
        let report = processed.report;
        if !report.completed {
            self.failed += 1;
        } else if report.listed {
            self.listed += 1;
        } else {
            self.not_listed += 1;
        }
        self.report_paths.extend(processed.report_path);
        self.reports.push(report);
    }

    pub fn total(&self) -> usize {
        self.listed + self.not_listed + self.failed
    }
}

impl App {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run a single query; its report is in the returned stats whatever happened
    pub async fn run_query(&self, query: CauseListQuery) -> BatchStats {
        self.run_batch(vec![query]).await
    }

    /// Look up one case by CNR or case number
    pub async fn run_lookup(&self, query: CaseLookupQuery) -> BatchStats {
        log_startup(1, 1);
        log_query_start(1, 1, &query.label());

        let mut stats = BatchStats::default();
        stats.add(query_processor::process_lookup(&self.config, &query, 1).await);

        print_final_stats(stats.listed, stats.not_listed, stats.failed, &self.config.output_dir);
        stats
    }

    /// Run every query file in `folder`
    pub async fn run_folder(&self, folder: &str) -> AppResult<BatchStats> {
        info!("\n📁 Scanning {} for query files...", folder);
        let queries: Vec<CauseListQuery> = load_all_query_files(folder)
            .await?
            .into_iter()
            .map(|(_, query)| query)
            .collect();

        if queries.is_empty() {
            warn!("⚠️ No query files found in {}", folder);
            return Ok(BatchStats::default());
        }

        Ok(self.run_batch(queries).await)
    }

    /// Run queries with at most `max_concurrent_queries` sessions alive at once
    pub async fn run_batch(&self, queries: Vec<CauseListQuery>) -> BatchStats {
        let total = queries.len();
        let max_concurrent = self.config.max_concurrent_queries.max(1);
        log_startup(total, max_concurrent);

        let config = &self.config;
        let processed: Vec<ProcessedQuery> = stream::iter(queries.iter().enumerate())
            .map(|(index, query)| async move {
                let query_index = index + 1;
                log_query_start(query_index, total, &query.label());
                query_processor::process_query(config, query, query_index).await
            })
            .buffered(max_concurrent)
            .collect()
            .await;

        let mut stats = BatchStats::default();
        for item in processed {
            stats.add(item);
        }

        print_final_stats(stats.listed, stats.not_listed, stats.failed, &self.config.output_dir);
        stats
    }

    /// Option texts of `level` after selecting `prior`, in a throwaway session
    pub async fn list_options(
        &self,
        level: SelectionLevel,
        prior: &[String],
    ) -> AppResult<Vec<String>> {
        let portal = ChromePortal::open(&self.config).await?;
        let mut session = QuerySession::new(portal, 0);
        let flow = CauseListFlow::new(&self.config, TesseractRecognizer::new(&self.config));

        let options = flow.list_available_options(&mut session, level, prior).await;
        if let Err(e) = session.close().await {
            warn!("{} ⚠️ session close failed: {}", session, e);
        }
        options
    }
}
