//! In-memory tables produced by the loader, merger and period normalizer
//!
//! Field values are kept as decoded text so that merged tables can be
//! previewed and exported verbatim; typed records are extracted on demand.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::errors::{PipelineError, Result};
use crate::models::{
    columns, AssetLiabilityRecord, Category, ComplementRecord, GeneralRecord,
};

/// Header plus rows of one decoded source file (or a concatenation of them)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }
}

/// Row count contributed by one yearly partition to a merged table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartitionSummary {
    pub year: i32,
    pub rows: usize,
}

/// A source row with its parsed reference date
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub fields: Vec<String>,
    pub reference_date: Option<NaiveDate>,
}

impl TableRow {
    pub fn year(&self) -> Option<i32> {
        self.reference_date.map(|date| date.year())
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }
}

/// Merged, period-normalized table of one category
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTable {
    pub category: Category,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
    pub partitions: Vec<PartitionSummary>,
}

impl CategoryTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::MissingColumn {
                category: self.category,
                column: name.to_string(),
            })
    }

    /// Distinct periods present in the table, ascending
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.rows.iter().filter_map(TableRow::year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// Rows without a usable period
    pub fn rows_without_period(&self) -> usize {
        self.rows.iter().filter(|row| row.reference_date.is_none()).count()
    }

    pub fn asset_liability_records(&self) -> Result<Vec<AssetLiabilityRecord>> {
        let entity = self.require_column(columns::ENTITY_ID)?;
        let liquidity = self.require_column(columns::LIQUIDITY_NEEDS)?;
        let invested = self.require_column(columns::INVESTED)?;
        let rights = self.require_column(columns::REAL_ESTATE_RIGHTS)?;
        let receivables = self.require_column(columns::RECEIVABLES)?;
        let liability = self.require_column(columns::TOTAL_LIABILITY)?;

        let mut coercion = CoercionCounter::default();
        let records = self
            .rows
            .iter()
            .map(|row| AssetLiabilityRecord {
                entity_id: field(row, entity).to_string(),
                reference_date: row.reference_date,
                liquidity_needs: coercion.number(field(row, liquidity)),
                invested: coercion.number(field(row, invested)),
                real_estate_rights: coercion.number(field(row, rights)),
                receivables: coercion.number(field(row, receivables)),
                total_liability: coercion.number(field(row, liability)),
            })
            .collect();

        coercion.report(self.category);
        Ok(records)
    }

    pub fn general_records(&self) -> Result<Vec<GeneralRecord>> {
        let entity = self.require_column(columns::ENTITY_ID)?;
        let segment = self.require_column(columns::SEGMENT)?;

        Ok(self
            .rows
            .iter()
            .map(|row| {
                let label = field(row, segment);
                GeneralRecord {
                    entity_id: field(row, entity).to_string(),
                    reference_date: row.reference_date,
                    segment: (!label.is_empty()).then(|| label.to_string()),
                }
            })
            .collect())
    }

    pub fn complement_records(&self) -> Result<Vec<ComplementRecord>> {
        let entity = self.require_column(columns::ENTITY_ID)?;
        let dividend_yield = self.require_column(columns::MONTHLY_DIVIDEND_YIELD)?;

        let mut coercion = CoercionCounter::default();
        let records = self
            .rows
            .iter()
            .map(|row| ComplementRecord {
                entity_id: field(row, entity).to_string(),
                reference_date: row.reference_date,
                dividend_yield: coercion.number(field(row, dividend_yield)),
            })
            .collect();

        coercion.report(self.category);
        Ok(records)
    }
}

fn field(row: &TableRow, index: usize) -> &str {
    row.get(index).unwrap_or("")
}

/// Parse a numeric field; blanks and non-numeric tokens are missing values
pub fn parse_optional_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|number| number.is_finite())
}

#[derive(Default)]
struct CoercionCounter {
    coerced: usize,
}

impl CoercionCounter {
    fn number(&mut self, value: &str) -> Option<f64> {
        let parsed = parse_optional_f64(value);
        if parsed.is_none() && !value.trim().is_empty() {
            self.coerced += 1;
        }
        parsed
    }

    fn report(&self, category: Category) {
        if self.coerced > 0 {
            debug!(
                "{}: {} non-numeric values treated as missing",
                category, self.coerced
            );
        }
    }
}
