//! Results table extraction
//!
//! The portal's table carries no stable id, class or caption, and its column layout
//! is not guaranteed. The table is therefore located structurally and rows are
//! mapped through a declarative [`ColumnMapping`].

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::SubmissionError;
use crate::models::{CauseListRecord, ExtractionResult};
use crate::utils::text::normalize_whitespace;

static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("valid selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

static DMY_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})[-/.](\d{1,2})[-/.](\d{4})\b").expect("valid regex")
});
static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("valid regex"));
static NAMED_MONTH_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?[\s-]+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?[\s-]+(\d{4})\b",
    )
    .expect("valid regex")
});

// ========== Cells ==========

/// Text of one table cell, split into trimmed non-empty lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellText {
    lines: Vec<String>,
}

impl CellText {
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            lines: lines
                .into_iter()
                .map(|l| normalize_whitespace(l.as_ref()))
                .filter(|l| !l.is_empty())
                .collect(),
        }
    }

    fn from_element(cell: ElementRef<'_>) -> Self {
        let mut buf = String::new();
        collect_text(cell, &mut buf);
        Self::from_lines(buf.split('\n'))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn joined(&self, separator: &str) -> String {
        self.lines.join(separator)
    }

    pub fn last_line(&self) -> Option<&str> {
        self.lines.last().map(|l| l.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Flatten an element's text; `<br>` and block elements become line breaks
fn collect_text(element: ElementRef<'_>, buf: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            buf.push_str(text);
            continue;
        }
        let Some(child_el) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child_el.value().name();
        if name == "br" {
            buf.push('\n');
            continue;
        }
        if matches!(name, "script" | "style") {
            continue;
        }
        let block = matches!(
            name,
            "div" | "p" | "li" | "ul" | "ol" | "table" | "tr" | "h1" | "h2" | "h3" | "h4"
        );
        if block {
            buf.push('\n');
        }
        collect_text(child_el, buf);
        if block {
            buf.push('\n');
        }
    }
}

/// Visible text of a page, without scripts or styles
pub fn page_text(page_content: &str) -> String {
    let document = Html::parse_document(page_content);
    let mut buf = String::new();
    collect_text(document.root_element(), &mut buf);
    buf
}

// ========== Column mapping ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    SerialNumber,
    CaseNumber,
    PartyNames,
    Advocate,
}

pub type CellExtractor = fn(&[CellText]) -> Option<String>;

/// Ordered `(field, extractor)` list plus the minimum cell count a data row needs
#[derive(Clone)]
pub struct ColumnMapping {
    min_cells: usize,
    fields: Vec<(RecordField, CellExtractor)>,
}

fn cell_joined(cells: &[CellText], index: usize, separator: &str) -> Option<String> {
    cells
        .get(index)
        .map(|c| c.joined(separator))
        .filter(|s| !s.is_empty())
}

fn serial_from_first_cell(cells: &[CellText]) -> Option<String> {
    cell_joined(cells, 0, " ")
}

/// Case number cells stack extra lines (e.g. the case type) above the number
fn case_number_from_last_line(cells: &[CellText]) -> Option<String> {
    cells
        .get(1)
        .and_then(|c| c.last_line())
        .map(|s| s.to_string())
}

fn parties_from_third_cell(cells: &[CellText]) -> Option<String> {
    cell_joined(cells, 2, " ")
}

fn advocate_from_fourth_cell(cells: &[CellText]) -> Option<String> {
    cell_joined(cells, 3, " ")
}

impl ColumnMapping {
    pub fn new(min_cells: usize) -> Self {
        Self {
            min_cells,
            fields: Vec::new(),
        }
    }

    pub fn with(mut self, field: RecordField, extractor: CellExtractor) -> Self {
        self.fields.push((field, extractor));
        self
    }

    /// serial = cell 0, case number = last line of cell 1, parties = cell 2,
    /// advocate = cell 3
    pub fn positional() -> Self {
        Self::new(4)
            .with(RecordField::SerialNumber, serial_from_first_cell)
            .with(RecordField::CaseNumber, case_number_from_last_line)
            .with(RecordField::PartyNames, parties_from_third_cell)
            .with(RecordField::Advocate, advocate_from_fourth_cell)
    }

    pub fn min_cells(&self) -> usize {
        self.min_cells
    }

    /// `None` for rows that are too short or have no case number
    fn apply(&self, cells: &[CellText]) -> Option<CauseListRecord> {
        if cells.len() < self.min_cells {
            return None;
        }

        let mut record = CauseListRecord {
            serial_number: None,
            case_number: String::new(),
            party_names: String::new(),
            advocate: None,
            raw_row_text: row_text(cells),
            matched_date: None,
        };

        for (field, extract) in &self.fields {
            let value = extract(cells);
            match field {
                RecordField::SerialNumber => record.serial_number = value,
                RecordField::CaseNumber => record.case_number = value.unwrap_or_default(),
                RecordField::PartyNames => record.party_names = value.unwrap_or_default(),
                RecordField::Advocate => record.advocate = value,
            }
        }

        if record.case_number.is_empty() {
            return None;
        }
        Some(record)
    }
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self::positional()
    }
}

impl fmt::Debug for ColumnMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnMapping")
            .field("min_cells", &self.min_cells)
            .field(
                "fields",
                &self.fields.iter().map(|(field, _)| field).collect::<Vec<_>>(),
            )
            .finish()
    }
}

fn row_text(cells: &[CellText]) -> String {
    cells
        .iter()
        .map(|c| c.joined(" "))
        .collect::<Vec<_>>()
        .join(" | ")
}

// ========== Dates ==========

fn month_number(name: &str) -> Option<u32> {
    let month = match name.get(..3)?.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// First calendar date written in `text`, in any of the portal's usual notations
pub fn parse_date_token(text: &str) -> Option<NaiveDate> {
    let numeric = |caps: &regex::Captures<'_>, d: usize, m: usize, y: usize| {
        let day = caps[d].parse().ok()?;
        let month = caps[m].parse().ok()?;
        let year = caps[y].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    };

    let iso = ISO_DATE
        .captures_iter(text)
        .find_map(|caps| numeric(&caps, 3, 2, 1));
    if iso.is_some() {
        return iso;
    }

    let dmy = DMY_DATE
        .captures_iter(text)
        .find_map(|caps| numeric(&caps, 1, 2, 3));
    if dmy.is_some() {
        return dmy;
    }

    NAMED_MONTH_DATE.captures_iter(text).find_map(|caps| {
        let day = caps[1].parse().ok()?;
        let month = month_number(&caps[2])?;
        let year = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

/// Canonical textual forms searched for when no cell carries a parseable date
pub fn date_text_forms(date: NaiveDate) -> [String; 3] {
    [
        date.format("%d-%m-%Y").to_string(),
        date.format("%d/%m/%Y").to_string(),
        date.format("%Y-%m-%d").to_string(),
    ]
}

/// Which target date a row belongs to, if any
fn match_row_date(
    cells: &[CellText],
    raw_row_text: &str,
    targets: &BTreeSet<NaiveDate>,
) -> Option<NaiveDate> {
    if let Some(date) = cells.iter().find_map(|c| parse_date_token(&c.joined(" "))) {
        return targets.contains(&date).then_some(date);
    }

    targets.iter().copied().find(|target| {
        date_text_forms(*target)
            .iter()
            .any(|form| raw_row_text.contains(form.as_str()))
    })
}

// ========== Extractor ==========

#[derive(Debug, Clone)]
pub struct ResultExtractor {
    header_rows: usize,
    mapping: ColumnMapping,
}

impl Default for ResultExtractor {
    fn default() -> Self {
        Self::new(2)
    }
}

impl ResultExtractor {
    pub fn new(header_rows: usize) -> Self {
        Self {
            header_rows,
            mapping: ColumnMapping::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.header_rows)
    }

    pub fn with_mapping(mut self, mapping: ColumnMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Convert the results table into records.
    ///
    /// With `target_dates` only rows dated on one of the targets are kept; without it
    /// every well-formed row is.
    pub fn extract(
        &self,
        page_content: &str,
        target_dates: Option<&BTreeSet<NaiveDate>>,
    ) -> Result<ExtractionResult, SubmissionError> {
        self.extract_since(page_content, &TableBaseline::default(), target_dates)
    }

    /// Like [`extract`](Self::extract), but a table already in `baseline` only counts
    /// when at least one of its rows is wide enough to be a record.
    pub fn extract_since(
        &self,
        page_content: &str,
        baseline: &TableBaseline,
        target_dates: Option<&BTreeSet<NaiveDate>>,
    ) -> Result<ExtractionResult, SubmissionError> {
        let document = Html::parse_document(page_content);
        let rows = self
            .locate_table(&document, baseline)
            .ok_or(SubmissionError::TableNotFound)?;

        let skip = if rows.len() > self.header_rows {
            self.header_rows
        } else {
            0
        };

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for cells in rows.iter().skip(skip) {
            let Some(mut record) = self.mapping.apply(cells) else {
                skipped += 1;
                continue;
            };

            match target_dates {
                None => records.push(record),
                Some(targets) => {
                    if let Some(date) = match_row_date(cells, &record.raw_row_text, targets) {
                        record.matched_date = Some(date);
                        records.push(record);
                    }
                }
            }
        }

        if skipped > 0 {
            warn!("⚠️ {} malformed row(s) skipped", skipped);
        }
        debug!(
            "table: {} row(s), {} header, {} record(s) kept",
            rows.len(),
            skip,
            records.len()
        );

        Ok(ExtractionResult::new(records))
    }

    /// Tables already on the page, recorded before a submit
    pub fn baseline(page_content: &str) -> TableBaseline {
        let document = Html::parse_document(page_content);
        TableBaseline {
            fingerprints: candidate_tables(&document)
                .iter()
                .map(|rows| table_fingerprint(rows))
                .collect(),
        }
    }

    /// Rows (as cell texts) of the best results-table candidate
    fn locate_table(
        &self,
        document: &Html,
        baseline: &TableBaseline,
    ) -> Option<Vec<Vec<CellText>>> {
        let mut best: Option<(usize, Vec<Vec<CellText>>)> = None;

        for rows in candidate_tables(document) {
            let score = rows
                .iter()
                .filter(|cells| cells.len() >= self.mapping.min_cells())
                .count();
            if score == 0 && baseline.contains(&rows) {
                debug!("ignoring pre-existing layout table ({} rows)", rows.len());
                continue;
            }
            if best.as_ref().map_or(true, |(top, _)| score > *top) {
                best = Some((score, rows));
            }
        }

        best.map(|(_, rows)| rows)
    }

    /// Absolute URLs of every `.pdf` link on the page, in document order, deduplicated
    pub fn pdf_links(page_content: &str, base_url: &str) -> Vec<String> {
        let document = Html::parse_document(page_content);
        let base = Url::parse(base_url).ok();
        let mut links: Vec<String> = Vec::new();

        for anchor in document.select(&LINK_SELECTOR) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let href = href.trim();
            let path = href.split(['?', '#']).next().unwrap_or(href);
            if !path.to_ascii_lowercase().ends_with(".pdf") {
                continue;
            }

            let absolute = match &base {
                Some(base) => base.join(href).map(|u| u.to_string()).ok(),
                None => Url::parse(href).map(|u| u.to_string()).ok(),
            };
            if let Some(url) = absolute {
                if !links.contains(&url) {
                    links.push(url);
                }
            }
        }

        links
    }
}

/// Fingerprints of the tables a page showed before a submit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableBaseline {
    fingerprints: BTreeSet<String>,
}

impl TableBaseline {
    fn contains(&self, rows: &[Vec<CellText>]) -> bool {
        self.fingerprints.contains(&table_fingerprint(rows))
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}

fn table_fingerprint(rows: &[Vec<CellText>]) -> String {
    rows.iter()
        .map(|cells| row_text(cells))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every table with at least two non-empty rows, in document order
fn candidate_tables(document: &Html) -> Vec<Vec<Vec<CellText>>> {
    document
        .select(&TABLE_SELECTOR)
        .map(|table| {
            direct_rows(table)
                .into_iter()
                .map(row_cells)
                .filter(|cells| !cells.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|rows| rows.len() >= 2)
        .collect()
}

/// `<tr>` children of a table, looking through thead/tbody/tfoot but not into nested tables
fn direct_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(
                child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|e| e.value().name() == "tr"),
            ),
            _ => {}
        }
    }
    rows
}

fn row_cells(row: ElementRef<'_>) -> Vec<CellText> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|e| matches!(e.value().name(), "td" | "th"))
        .map(CellText::from_element)
        .collect()
}
