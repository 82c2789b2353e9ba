//! Reference-date parsing and period derivation
//!
//! Strict categories reject any date that does not match their single
//! layout; the lenient category tries an ordered list of layouts and leaves
//! the period empty when none matches.

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use crate::errors::{PipelineError, Result};
use crate::merger::MergedTable;
use crate::models::{columns, Category};
use crate::table::{CategoryTable, TableRow};

pub const ISO_DATE: &str = "%Y-%m-%d";

/// Candidate layouts for mixed-format files, tried in order
pub const MIXED_DATE_FORMATS: [&str; 9] = [
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%Y%m%d",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatePolicy {
    /// One layout; a non-empty value that does not match is fatal
    Strict { format: String },
    /// First matching layout wins; no match means no period
    Lenient { formats: Vec<String> },
}

impl DatePolicy {
    pub fn iso() -> Self {
        DatePolicy::Strict {
            format: ISO_DATE.to_string(),
        }
    }

    pub fn mixed() -> Self {
        DatePolicy::Lenient {
            formats: MIXED_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, DatePolicy::Strict { .. })
    }

    pub fn parse(&self, value: &str) -> ParsedDate {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return ParsedDate::Missing;
        }

        match self {
            DatePolicy::Strict { format } => parse_with_format(trimmed, format)
                .map(ParsedDate::Date)
                .unwrap_or(ParsedDate::Invalid),
            DatePolicy::Lenient { formats } => formats
                .iter()
                .find_map(|format| parse_with_format(trimmed, format))
                .map(ParsedDate::Date)
                .unwrap_or(ParsedDate::Missing),
        }
    }
}

/// Outcome of parsing one reference-date field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDate {
    Date(NaiveDate),
    /// Blank, or rejected by every lenient layout
    Missing,
    /// Rejected by a strict layout
    Invalid,
}

/// Layouts with a time component are parsed as date-times and truncated.
/// Layouts without a day resolve to the first of the month.
fn parse_with_format(value: &str, format: &str) -> Option<NaiveDate> {
    if format.contains("%H") {
        NaiveDateTime::parse_from_str(value, format)
            .ok()
            .map(|datetime| datetime.date())
    } else if !format.contains("%d") {
        NaiveDate::parse_from_str(&format!("{}-01", value), &format!("{}-%d", format)).ok()
    } else {
        NaiveDate::parse_from_str(value, format).ok()
    }
}

/// Attach a parsed reference date to every merged row.
pub fn normalize(category: Category, merged: MergedTable, policy: &DatePolicy) -> Result<CategoryTable> {
    let MergedTable { table, partitions } = merged;

    let date_index = table
        .column_index(columns::REFERENCE_DATE)
        .ok_or_else(|| PipelineError::MissingColumn {
            category,
            column: columns::REFERENCE_DATE.to_string(),
        })?;

    let mut rows = Vec::with_capacity(table.rows.len());
    let mut unparsed = 0usize;

    for (index, fields) in table.rows.into_iter().enumerate() {
        let raw = fields.get(date_index).map(String::as_str).unwrap_or("");
        let reference_date = match policy.parse(raw) {
            ParsedDate::Date(date) => Some(date),
            ParsedDate::Missing => None,
            ParsedDate::Invalid => {
                return Err(PipelineError::DateParse {
                    category,
                    row: index + 1,
                    value: raw.to_string(),
                })
            }
        };

        if reference_date.is_none() {
            unparsed += 1;
        }
        rows.push(TableRow {
            fields,
            reference_date,
        });
    }

    if unparsed > 0 {
        warn!(
            "{}: {} rows have no usable reference date and carry no period",
            category, unparsed
        );
    } else {
        debug!("{}: all {} rows carry a period", category, rows.len());
    }

    Ok(CategoryTable {
        category,
        columns: table.columns,
        rows,
        partitions,
    })
}
