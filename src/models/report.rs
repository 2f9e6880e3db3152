//! JSON report written per query

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::error::AppError;
use crate::models::{CaseLookup, CaseLookupQuery, CauseListQuery, CauseListRecord, ExtractionResult};

/// What a report was produced for
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReportQuery {
    CauseList(CauseListQuery),
    Case(CaseLookup),
}

/// Persisted outcome of one query
///
/// `completed == false` means the query could not be run to the end; an empty
/// `entries` list with `completed == true` means "not listed".
#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub query: ReportQuery,
    pub target_dates: Vec<NaiveDate>,
    pub completed: bool,
    pub listed: bool,
    pub attempts: u32,
    pub entries: Vec<CauseListRecord>,
    pub downloads: Vec<String>,
    pub errors: Vec<String>,
    pub generated_at: String,
}

impl QueryReport {
    pub fn new(query: &CauseListQuery) -> Self {
        Self::with_query(
            ReportQuery::CauseList(query.clone()),
            query.target_dates().into_iter().flatten().copied().collect(),
        )
    }

    pub fn for_lookup(query: &CaseLookupQuery) -> Self {
        Self::with_query(
            ReportQuery::Case(query.lookup().clone()),
            query.target_dates().into_iter().flatten().copied().collect(),
        )
    }

    fn with_query(query: ReportQuery, target_dates: Vec<NaiveDate>) -> Self {
        Self {
            query,
            target_dates,
            completed: false,
            listed: false,
            attempts: 0,
            entries: Vec::new(),
            downloads: Vec::new(),
            errors: Vec::new(),
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    pub fn record_result(&mut self, result: ExtractionResult, attempts: u32) {
        self.completed = true;
        self.listed = result.listed();
        self.attempts = attempts;
        self.entries = result.into_records();
    }

    pub fn record_error(&mut self, error: &AppError) {
        self.errors.push(error.to_string());
    }
}
