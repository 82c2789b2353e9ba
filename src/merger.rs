//! Multi-year concatenation of one category's partitions

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{info, warn};

use crate::errors::{PipelineError, Result};
use crate::loader::PartitionLoader;
use crate::models::Category;
use crate::table::{PartitionSummary, RawTable};

/// What to do when a year's partition cannot be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissingPartitionPolicy {
    /// Leave the year out of the merge and keep going
    #[default]
    Skip,
    /// Abort the category
    Fail,
}

impl FromStr for MissingPartitionPolicy {
    type Err = PipelineError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(MissingPartitionPolicy::Skip),
            "fail" => Ok(MissingPartitionPolicy::Fail),
            other => Err(PipelineError::InvalidArgument(format!(
                "unknown missing-partition policy '{}' (expected skip or fail)",
                other
            ))),
        }
    }
}

/// One year's worth of rows
#[derive(Debug, Clone)]
pub struct Partition {
    pub year: i32,
    pub table: RawTable,
}

/// Concatenated partitions plus the row count each one contributed
#[derive(Debug, Clone)]
pub struct MergedTable {
    pub table: RawTable,
    pub partitions: Vec<PartitionSummary>,
}

/// Load every requested year, applying the missing-partition policy.
///
/// Only unavailability is subject to the policy; any other error aborts.
pub fn collect_partitions(
    loader: &PartitionLoader,
    category: Category,
    years: &[i32],
    policy: MissingPartitionPolicy,
) -> Result<Vec<Partition>> {
    let mut partitions = Vec::with_capacity(years.len());

    for &year in years {
        match loader.load(category, year) {
            Ok(table) => partitions.push(Partition { year, table }),
            Err(e) if e.is_data_unavailable() && policy == MissingPartitionPolicy::Skip => {
                warn!("⚠️  Skipping {} partition {}: {}", category, year, e);
            }
            Err(e) => return Err(e),
        }
    }

    if partitions.is_empty() {
        return Err(PipelineError::NoPartitions { category });
    }
    Ok(partitions)
}

/// Concatenate partitions in ascending year order without deduplication.
///
/// Every partition must carry exactly the columns of the earliest one.
pub fn merge_partitions(category: Category, mut partitions: Vec<Partition>) -> Result<MergedTable> {
    partitions.sort_by_key(|partition| partition.year);

    let mut iter = partitions.into_iter();
    let first = iter.next().ok_or(PipelineError::NoPartitions { category })?;

    let mut summaries = vec![PartitionSummary {
        year: first.year,
        rows: first.table.len(),
    }];
    let mut merged = first.table;

    for partition in iter {
        if partition.table.columns != merged.columns {
            return Err(PipelineError::SchemaMismatch {
                category,
                year: partition.year,
                expected: merged.columns.clone(),
                found: partition.table.columns,
            });
        }
        summaries.push(PartitionSummary {
            year: partition.year,
            rows: partition.table.len(),
        });
        merged.rows.extend(partition.table.rows);
    }

    info!(
        "🔗 Merged {} partitions of {}: {} rows",
        summaries.len(),
        category,
        merged.len()
    );

    Ok(MergedTable {
        table: merged,
        partitions: summaries,
    })
}
