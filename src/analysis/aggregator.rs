use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::models::{AggregateRow, GeneralRecord, Metric, PeriodRecord, SegmentCount};

/// Sum one metric per (entity, year).
///
/// Every group present in the input yields a row. Missing values contribute
/// nothing, so a group whose values are all missing sums to zero. Records
/// without a period are left out. Rows come back ordered by entity, then year.
pub fn sum_by_entity_year<R, F>(records: &[R], metric: Metric, value: F) -> Vec<AggregateRow>
where
    R: PeriodRecord,
    F: Fn(&R) -> Option<f64>,
{
    let mut groups: BTreeMap<(&str, i32), f64> = BTreeMap::new();
    let mut without_period = 0usize;

    for record in records {
        let Some(year) = record.year() else {
            without_period += 1;
            continue;
        };
        let sum = groups.entry((record.entity_id(), year)).or_insert(0.0);
        if let Some(v) = value(record) {
            *sum += v;
        }
    }

    if without_period > 0 {
        debug!(
            "{}: {} records without a period left out of the sum",
            metric.label(),
            without_period
        );
    }

    groups
        .into_iter()
        .map(|((entity_id, year), value)| AggregateRow {
            entity_id: entity_id.to_string(),
            year,
            metric,
            value,
        })
        .collect()
}

/// Count filings per (segment, year), ordered by year then segment label.
///
/// Labels are compared verbatim. Filings without a period or a label are
/// not counted.
pub fn count_segments_per_year(records: &[GeneralRecord]) -> Vec<SegmentCount> {
    let mut groups: BTreeMap<(i32, &str), (usize, BTreeSet<&str>)> = BTreeMap::new();

    for record in records {
        let (Some(year), Some(segment)) = (record.year(), record.segment.as_deref()) else {
            continue;
        };
        let (filings, funds) = groups.entry((year, segment)).or_default();
        *filings += 1;
        funds.insert(record.entity_id.as_str());
    }

    groups
        .into_iter()
        .map(|((year, segment), (filings, funds))| SegmentCount {
            segment: segment.to_string(),
            year,
            filings,
            funds: funds.len(),
        })
        .collect()
}
