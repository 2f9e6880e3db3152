use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One listing row of a cause list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CauseListRecord {
    pub serial_number: Option<String>,
    pub case_number: String,
    pub party_names: String,
    pub advocate: Option<String>,
    pub raw_row_text: String,
    /// Target date the row was matched against, in date-filtered mode
    pub matched_date: Option<NaiveDate>,
}

/// Records extracted from one results page
///
/// `listed` is derived from `records` at construction and cannot drift from it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ExtractionResult {
    listed: bool,
    records: Vec<CauseListRecord>,
}

impl ExtractionResult {
    pub fn new(records: Vec<CauseListRecord>) -> Self {
        Self {
            listed: !records.is_empty(),
            records,
        }
    }

    pub fn listed(&self) -> bool {
        self.listed
    }

    pub fn records(&self) -> &[CauseListRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<CauseListRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One captcha solve attempt; lives for a single loop iteration
#[derive(Debug, Clone)]
pub struct CaptchaAttempt {
    pub image_bytes: Vec<u8>,
    pub recognized_text: String,
    pub attempt_number: u32,
}
