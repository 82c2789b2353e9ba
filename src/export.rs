//! Download support for the merged tables
//!
//! Sits outside the aggregation pipeline: it only filters, projects and
//! serializes a table that the session already produced.

use chrono::NaiveDate;
use csv::WriterBuilder;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::errors::Result;
use crate::models::columns;
use crate::table::CategoryTable;

/// Column subset plus optional exact-match filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportRequest {
    /// None keeps every column in table order
    pub columns: Option<Vec<String>>,
    pub reference_date: Option<NaiveDate>,
    pub entity_id: Option<String>,
}

/// Filtered, projected rows ready to serialize
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportRequest {
    pub fn apply(&self, table: &CategoryTable) -> Result<ExportView> {
        let selected: Vec<usize> = match &self.columns {
            Some(names) => names
                .iter()
                .map(|name| table.require_column(name))
                .collect::<Result<_>>()?,
            None => (0..table.columns.len()).collect(),
        };

        let entity_filter = match &self.entity_id {
            Some(id) => Some((table.require_column(columns::ENTITY_ID)?, id.as_str())),
            None => None,
        };

        let rows = table
            .rows
            .iter()
            .filter(|row| {
                self.reference_date
                    .map_or(true, |date| row.reference_date == Some(date))
            })
            .filter(|row| {
                entity_filter.map_or(true, |(index, id)| row.get(index) == Some(id))
            })
            .map(|row| {
                selected
                    .iter()
                    .map(|&index| row.get(index).unwrap_or("").to_string())
                    .collect()
            })
            .collect();

        Ok(ExportView {
            columns: selected.iter().map(|&index| table.columns[index].clone()).collect(),
            rows,
        })
    }
}

/// Write the view as comma-separated UTF-8 with a header row; returns rows written
pub fn write_csv<W: Write>(view: &ExportView, writer: W) -> Result<usize> {
    let mut csv_writer = WriterBuilder::new().from_writer(writer);
    csv_writer.write_record(&view.columns)?;
    for row in &view.rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(view.rows.len())
}

pub fn export_to_path(view: &ExportView, path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path)?;
    let written = write_csv(view, file)?;
    info!("💾 Exported {} rows to {}", written, path.display());
    Ok(written)
}
