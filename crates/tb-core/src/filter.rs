//! # Ticket Filter Builder
//!
//! Turns the optional request parameters into an ordered list of
//! [`FilterClause`]s. Every parameter goes through its own validate-and-compile
//! step which yields either a clause or a [`FilterField`] error tag, and the
//! builder folds the steps independently: a bad `after` never stops a good
//! `reporter` from applying.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const DAY_MS: i64 = 86_400_000;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"));

/// Request fields that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterField {
    After,
    Before,
    Reporter,
    Labels,
}

impl FilterField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterField::After => "after",
            FilterField::Before => "before",
            FilterField::Reporter => "reporter",
            FilterField::Labels => "labels",
        }
    }

    /// The fixed message surfaced to the user when this field is rejected.
    pub fn message(&self) -> &'static str {
        match self {
            FilterField::After => r#"Invalid "after" date format. Use DD/MM/YYYY or YYYY-MM-DD."#,
            FilterField::Before => r#"Invalid "before" date format. Use DD/MM/YYYY or YYYY-MM-DD."#,
            FilterField::Reporter => r#"Invalid "reporter" format. Use reporter:email@domain.com."#,
            FilterField::Labels => r#"Invalid "labels" format. Use labels:tag1,tag2"#,
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One predicate applied to the ticket query. String payloads are already
/// ASCII-lowercased, the same folding SQLite's `LOWER` applies to the column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterClause {
    /// Title contains the term
    TitleContains(String),
    /// `creation_time` strictly greater than this instant (ms)
    CreatedAfter(i64),
    /// `creation_time` strictly less than this instant (ms)
    CreatedBefore(i64),
    /// Reporter email contains the term
    ReporterContains(String),
    /// At least one label contains at least one of these tokens
    LabelsAny(Vec<String>),
}

/// Raw filter parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParams {
    pub search: Option<String>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub reporter: Option<String>,
    pub labels: Option<String>,
}

/// Outcome of a single validate-and-compile step. `None` means the parameter
/// was absent and contributes nothing.
pub type CompiledClause = Option<Result<FilterClause, FilterField>>;

fn present(raw: Option<&str>) -> Option<&str> {
    raw.filter(|value| !value.is_empty())
}

pub fn compile_search(raw: Option<&str>) -> CompiledClause {
    present(raw).map(|term| Ok(FilterClause::TitleContains(term.to_ascii_lowercase())))
}

pub fn compile_after(raw: Option<&str>) -> CompiledClause {
    present(raw).map(|value| {
        parse_filter_date(value)
            .map(|date| FilterClause::CreatedAfter(end_of_day_ms(date)))
            .ok_or(FilterField::After)
    })
}

pub fn compile_before(raw: Option<&str>) -> CompiledClause {
    present(raw).map(|value| {
        parse_filter_date(value)
            .map(|date| FilterClause::CreatedBefore(start_of_day_ms(date)))
            .ok_or(FilterField::Before)
    })
}

pub fn compile_reporter(raw: Option<&str>) -> CompiledClause {
    present(raw).map(|value| {
        if EMAIL_RE.is_match(value) {
            Ok(FilterClause::ReporterContains(value.to_ascii_lowercase()))
        } else {
            Err(FilterField::Reporter)
        }
    })
}

pub fn compile_labels(raw: Option<&str>) -> CompiledClause {
    present(raw).map(|value| {
        let tokens = split_labels(value);
        if tokens.is_empty() {
            Err(FilterField::Labels)
        } else {
            Ok(FilterClause::LabelsAny(tokens))
        }
    })
}

/// Comma-separated tags, trimmed and ASCII-lowercased, empties dropped.
pub fn split_labels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Accepts `YYYY-MM-DD`, then `DD/MM/YYYY`. Dates are interpreted in UTC.
pub fn parse_filter_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
}

pub fn start_of_day_ms(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Last millisecond of the day (23:59:59.999 UTC).
pub fn end_of_day_ms(date: NaiveDate) -> i64 {
    start_of_day_ms(date) + DAY_MS - 1
}

/// A validated filter: the clauses to apply and the fields that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    clauses: Vec<FilterClause>,
    errors: BTreeMap<FilterField, String>,
}

impl TicketFilter {
    pub fn build(params: &FilterParams) -> Self {
        let steps = [
            compile_search(params.search.as_deref()),
            compile_after(params.after.as_deref()),
            compile_before(params.before.as_deref()),
            compile_reporter(params.reporter.as_deref()),
            compile_labels(params.labels.as_deref()),
        ];

        steps
            .into_iter()
            .flatten()
            .fold(Self::default(), |mut filter, step| {
                match step {
                    Ok(clause) => filter.clauses.push(clause),
                    Err(field) => {
                        filter.errors.insert(field, field.message().to_string());
                    }
                }
                filter
            })
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    pub fn errors(&self) -> &BTreeMap<FilterField, String> {
        &self.errors
    }

    pub fn into_errors(self) -> BTreeMap<FilterField, String> {
        self.errors
    }
}
