use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{AggregateRow, Metric, PerFundSummary, RankScope, RankedRow, RankedSubset};

/// Larger values first; equal values fall back to entity id ascending.
fn by_value_desc(a_value: f64, a_id: &str, b_value: f64, b_id: &str) -> Ordering {
    b_value.total_cmp(&a_value).then_with(|| a_id.cmp(b_id))
}

/// Keep the `n` largest rows of every year.
///
/// Years come back ascending and each year's rows in rank order. A year with
/// fewer than `n` entities returns only what it has.
pub fn top_n_per_year(rows: &[AggregateRow], metric: Metric, n: usize) -> RankedSubset {
    let mut by_year: BTreeMap<i32, Vec<&AggregateRow>> = BTreeMap::new();
    for row in rows {
        by_year.entry(row.year).or_default().push(row);
    }

    let mut ranked = Vec::new();
    for (year, mut group) in by_year {
        group.sort_by(|a, b| by_value_desc(a.value, &a.entity_id, b.value, &b.entity_id));
        ranked.extend(group.into_iter().take(n).enumerate().map(|(i, row)| RankedRow {
            rank: i + 1,
            entity_id: row.entity_id.clone(),
            year: Some(year),
            value: row.value,
        }));
    }

    RankedSubset {
        metric,
        scope: RankScope::PerYear,
        limit: n,
        rows: ranked,
    }
}

/// Sum every entity's yearly rows, rank once, keep the `n` largest.
///
/// Summaries are computed for the selected entities only, in rank order;
/// the mean divides by the number of yearly rows that entity has.
pub fn top_n_overall(
    rows: &[AggregateRow],
    metric: Metric,
    n: usize,
) -> (RankedSubset, Vec<PerFundSummary>) {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for row in rows {
        *totals.entry(row.entity_id.as_str()).or_insert(0.0) += row.value;
    }

    let mut ordered: Vec<(&str, f64)> = totals.into_iter().collect();
    ordered.sort_by(|a, b| by_value_desc(a.1, a.0, b.1, b.0));
    ordered.truncate(n);

    let ranked = ordered
        .iter()
        .enumerate()
        .map(|(i, (entity_id, total))| RankedRow {
            rank: i + 1,
            entity_id: entity_id.to_string(),
            year: None,
            value: *total,
        })
        .collect();

    let summaries = ordered
        .iter()
        .map(|(entity_id, _)| summarize(rows, entity_id))
        .collect();

    let subset = RankedSubset {
        metric,
        scope: RankScope::Global,
        limit: n,
        rows: ranked,
    };
    (subset, summaries)
}

fn summarize(rows: &[AggregateRow], entity_id: &str) -> PerFundSummary {
    let (total, years) = rows
        .iter()
        .filter(|row| row.entity_id == entity_id)
        .fold((0.0, 0usize), |(sum, count), row| (sum + row.value, count + 1));

    PerFundSummary {
        entity_id: entity_id.to_string(),
        total,
        mean: if years == 0 { 0.0 } else { total / years as f64 },
        years,
    }
}
