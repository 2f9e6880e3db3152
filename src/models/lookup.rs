//! Single-case lookups: by CNR or by case type / number / year

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::error::ValidationError;
use crate::models::query::parse_target_dates;

static CNR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{16}$").expect("valid cnr regex"));
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").expect("valid year regex"));

/// How the case is identified on the portal's search page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CaseLookup {
    Cnr {
        cnr: String,
    },
    CaseNumber {
        case_type: String,
        number: String,
        year: String,
    },
}

impl CaseLookup {
    /// CNRs are 16 letters and digits; input is upper-cased
    pub fn cnr(input: &str) -> Result<Self, ValidationError> {
        let cnr: String = input
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect::<String>()
            .to_ascii_uppercase();
        if !CNR_RE.is_match(&cnr) {
            return Err(ValidationError::InvalidCnr {
                input: input.to_string(),
            });
        }
        Ok(Self::Cnr { cnr })
    }

    pub fn case_number(case_type: &str, number: &str, year: &str) -> Result<Self, ValidationError> {
        let case_type = case_type.trim();
        if case_type.is_empty() {
            return Err(ValidationError::MissingField { field: "case_type" });
        }

        let number = number.trim();
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidCaseNumber {
                field: "number",
                input: number.to_string(),
            });
        }

        let year = year.trim();
        if !YEAR_RE.is_match(year) {
            return Err(ValidationError::InvalidCaseNumber {
                field: "year",
                input: year.to_string(),
            });
        }

        Ok(Self::CaseNumber {
            case_type: case_type.to_string(),
            number: number.to_string(),
            year: year.to_string(),
        })
    }
}

impl fmt::Display for CaseLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseLookup::Cnr { cnr } => write!(f, "CNR {}", cnr),
            CaseLookup::CaseNumber {
                case_type,
                number,
                year,
            } => write!(f, "{}/{}/{}", case_type, number, year),
        }
    }
}

/// A validated case lookup plus the dates its listings are filtered by
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseLookupQuery {
    lookup: CaseLookup,
    target_dates: Option<BTreeSet<NaiveDate>>,
}

impl CaseLookupQuery {
    pub fn new(lookup: CaseLookup, target_dates: &[String]) -> Result<Self, ValidationError> {
        Ok(Self {
            lookup,
            target_dates: parse_target_dates(target_dates)?,
        })
    }

    pub fn lookup(&self) -> &CaseLookup {
        &self.lookup
    }

    /// Dates to filter rows by; `None` keeps every row
    pub fn target_dates(&self) -> Option<&BTreeSet<NaiveDate>> {
        self.target_dates.as_ref()
    }

    pub fn label(&self) -> String {
        self.lookup.to_string()
    }
}
