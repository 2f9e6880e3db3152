//! Query-side models: selection levels, case type and the validated cause-list query.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::ValidationError;

/// Date format used by the portal form and by query input
pub const DATE_FORMAT: &str = "%d-%m-%Y";

static STRICT_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}-\d{2}-\d{4}$").expect("valid date regex"));

/// Dependent form levels, in the order the portal populates them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionLevel {
    State,
    District,
    CourtComplex,
    Court,
}

impl SelectionLevel {
    pub const ALL: [SelectionLevel; 4] = [
        SelectionLevel::State,
        SelectionLevel::District,
        SelectionLevel::CourtComplex,
        SelectionLevel::Court,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The level that must be committed before this one
    pub fn previous(self) -> Option<Self> {
        match self {
            SelectionLevel::State => None,
            SelectionLevel::District => Some(SelectionLevel::State),
            SelectionLevel::CourtComplex => Some(SelectionLevel::District),
            SelectionLevel::Court => Some(SelectionLevel::CourtComplex),
        }
    }

    /// The level repopulated by committing this one
    pub fn next(self) -> Option<Self> {
        match self {
            SelectionLevel::State => Some(SelectionLevel::District),
            SelectionLevel::District => Some(SelectionLevel::CourtComplex),
            SelectionLevel::CourtComplex => Some(SelectionLevel::Court),
            SelectionLevel::Court => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SelectionLevel::State => "state",
            SelectionLevel::District => "district",
            SelectionLevel::CourtComplex => "court complex",
            SelectionLevel::Court => "court",
        }
    }

    /// Parse a level name as typed on the command line
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim().to_lowercase().as_str() {
            "state" => Ok(SelectionLevel::State),
            "district" => Ok(SelectionLevel::District),
            "complex" | "court_complex" | "court-complex" | "court complex" => {
                Ok(SelectionLevel::CourtComplex)
            }
            "court" => Ok(SelectionLevel::Court),
            _ => Err(ValidationError::UnknownLevel {
                input: input.to_string(),
            }),
        }
    }
}

impl fmt::Display for SelectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which cause list to submit for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseType {
    Criminal,
    Civil,
}

impl CaseType {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim().to_lowercase().as_str() {
            "criminal" => Ok(CaseType::Criminal),
            "civil" => Ok(CaseType::Civil),
            _ => Err(ValidationError::UnsupportedCaseType {
                input: input.to_string(),
            }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CaseType::Criminal => "criminal",
            CaseType::Civil => "civil",
        }
    }

    /// Argument the portal's submit handler receives for this case type
    pub fn portal_code(self) -> &'static str {
        match self {
            CaseType::Criminal => "cri",
            CaseType::Civil => "civ",
        }
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One step of the cascading form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeSelection {
    pub level: SelectionLevel,
    pub requested_value: String,
    /// Form value of the matched option, set once the selection commits
    pub resolved_value: Option<String>,
}

impl CascadeSelection {
    pub fn new(level: SelectionLevel, requested_value: impl Into<String>) -> Self {
        Self {
            level,
            requested_value: requested_value.into(),
            resolved_value: None,
        }
    }

    pub fn resolved(mut self, value: impl Into<String>) -> Self {
        self.resolved_value = Some(value.into());
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_value.is_some()
    }
}

/// Parse a strict DD-MM-YYYY date
pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = input.trim();
    if !STRICT_DATE_RE.is_match(trimmed) {
        return Err(ValidationError::InvalidDateFormat {
            input: input.to_string(),
        });
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| {
        ValidationError::InvalidDateFormat {
            input: input.to_string(),
        }
    })
}

/// Row filter from DD-MM-YYYY strings; an empty list filters nothing out, so it
/// becomes `None` like an absent one
pub fn parse_target_dates(
    dates: &[String],
) -> Result<Option<BTreeSet<NaiveDate>>, ValidationError> {
    if dates.is_empty() {
        return Ok(None);
    }
    let parsed = dates
        .iter()
        .map(|d| parse_date(d))
        .collect::<Result<BTreeSet<_>, _>>()?;
    Ok(Some(parsed))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Unvalidated query as found in TOML files or on the command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuery {
    pub state: String,
    pub district: String,
    pub court_complex: String,
    pub court: String,
    pub case_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_dates: Option<Vec<String>>,
}

/// A validated cause-list query
///
/// Only constructible through [`RawQuery`] validation, so every field is known-good
/// before a browser session is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuery", into = "RawQuery")]
pub struct CauseListQuery {
    state: String,
    district: String,
    court_complex: String,
    court: String,
    case_type: CaseType,
    date: Option<NaiveDate>,
    target_dates: Option<BTreeSet<NaiveDate>>,
}

impl CauseListQuery {
    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn district(&self) -> &str {
        &self.district
    }

    pub fn court_complex(&self) -> &str {
        &self.court_complex
    }

    pub fn court(&self) -> &str {
        &self.court
    }

    pub fn case_type(&self) -> CaseType {
        self.case_type
    }

    /// Cause-list date typed into the form; `None` keeps the portal's default (today)
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Dates to filter rows by; `None` means dump every row
    pub fn target_dates(&self) -> Option<&BTreeSet<NaiveDate>> {
        self.target_dates.as_ref()
    }

    pub fn value_for(&self, level: SelectionLevel) -> &str {
        match level {
            SelectionLevel::State => &self.state,
            SelectionLevel::District => &self.district,
            SelectionLevel::CourtComplex => &self.court_complex,
            SelectionLevel::Court => &self.court,
        }
    }

    /// Selections in the order the form must be driven
    pub fn selections(&self) -> impl Iterator<Item = (SelectionLevel, &str)> + '_ {
        SelectionLevel::ALL
            .into_iter()
            .map(move |level| (level, self.value_for(level)))
    }

    pub fn label(&self) -> String {
        format!(
            "{} / {} / {} / {} ({})",
            self.state, self.district, self.court_complex, self.court, self.case_type
        )
    }
}

fn required(value: String, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    Ok(trimmed.to_string())
}

impl TryFrom<RawQuery> for CauseListQuery {
    type Error = ValidationError;

    fn try_from(raw: RawQuery) -> Result<Self, Self::Error> {
        let case_type = CaseType::parse(&raw.case_type)?;
        let date = raw.date.as_deref().map(parse_date).transpose()?;
        let target_dates = parse_target_dates(raw.target_dates.as_deref().unwrap_or_default())?;

        Ok(Self {
            state: required(raw.state, "state")?,
            district: required(raw.district, "district")?,
            court_complex: required(raw.court_complex, "court_complex")?,
            court: required(raw.court, "court")?,
            case_type,
            date,
            target_dates,
        })
    }
}

impl From<CauseListQuery> for RawQuery {
    fn from(query: CauseListQuery) -> Self {
        Self {
            state: query.state,
            district: query.district,
            court_complex: query.court_complex,
            court: query.court,
            case_type: query.case_type.name().to_string(),
            date: query.date.map(format_date),
            target_dates: query
                .target_dates
                .map(|dates| dates.into_iter().map(format_date).collect()),
        }
    }
}
