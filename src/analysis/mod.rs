//! Per-fund, per-year analyses over the merged category tables

pub mod aggregator;
pub mod ranker;

pub use aggregator::*;
pub use ranker::*;

use crate::errors::Result;
use crate::models::{AggregateRow, Metric, SegmentCount};
use crate::table::CategoryTable;

/// Yearly `TotalAsset` per fund from the asset/liability table
pub fn asset_totals(table: &CategoryTable) -> Result<Vec<AggregateRow>> {
    let records = table.asset_liability_records()?;
    Ok(sum_by_entity_year(&records, Metric::TotalAsset, |r| Some(r.total_asset())))
}

/// Yearly reported `TotalLiability` per fund from the asset/liability table
pub fn liability_totals(table: &CategoryTable) -> Result<Vec<AggregateRow>> {
    let records = table.asset_liability_records()?;
    Ok(sum_by_entity_year(&records, Metric::TotalLiability, |r| r.total_liability))
}

/// Yearly dividend yield per fund, the sum of its monthly percentages
pub fn dividend_yield_totals(table: &CategoryTable) -> Result<Vec<AggregateRow>> {
    let records = table.complement_records()?;
    Ok(sum_by_entity_year(&records, Metric::DividendYield, |r| r.dividend_yield))
}

pub fn segment_counts(table: &CategoryTable) -> Result<Vec<SegmentCount>> {
    let records = table.general_records()?;
    Ok(count_segments_per_year(&records))
}
