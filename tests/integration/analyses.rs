//! End-to-end analyses over multi-year fixture files

use pretty_assertions::assert_eq;
use test_log::test;

use crate::common::fixtures::{self, FUND_A, FUND_B, FUND_C};
use crate::common::{logging, FixtureDir};
use fii_insights::models::{RankScope, SegmentCount};

fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-9, "{} != {}", actual, expected);
}

fn ranked_ids(rows: &[&fii_insights::models::RankedRow]) -> Vec<String> {
    rows.iter().map(|row| row.entity_id.clone()).collect()
}

#[test]
fn test_total_assets_per_year() {
    logging::log_test_step("Ranking total assets over three years");
    let fixture = FixtureDir::new();
    fixtures::write_asset_liability(&fixture, &[2021, 2022, 2023]);

    let store = fixture.store(&[2021, 2022, 2023]);
    let session = store.open_session();
    let assets = session.top_assets_per_year(5).unwrap();
    logging::log_test_data("Assets", &assets.rows);

    assert_eq!(assets.scope, RankScope::PerYear);
    assert_eq!(assets.years(), vec![2021, 2022, 2023]);
    // only three funds file, nothing is padded
    assert_eq!(assets.rows.len(), 9);

    for year in [2021, 2022, 2023] {
        let rows: Vec<_> = assets.for_year(year).collect();
        assert_eq!(ranked_ids(&rows), vec![FUND_A, FUND_B, FUND_C]);
        assert_eq!(rows.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_close(rows[0].value, 400.0);
        assert_close(rows[1].value, 200.0);
        assert_close(rows[2].value, 3.0);
    }
}

#[test]
fn test_liabilities_keep_only_the_largest() {
    let fixture = FixtureDir::new();
    fixtures::write_asset_liability(&fixture, &[2022]);

    let store = fixture.store(&[2022]);
    let session = store.open_session();
    let liabilities = session.top_liabilities_per_year(2).unwrap();

    let rows: Vec<_> = liabilities.for_year(2022).collect();
    assert_eq!(ranked_ids(&rows), vec![FUND_B, FUND_A]);
    assert_close(rows[0].value, 85.5);
    assert_close(rows[1].value, 30.0);
    assert!(!liabilities.contains(FUND_C));
}

#[test]
fn test_segment_counts_per_year() {
    let fixture = FixtureDir::new();
    fixtures::write_general(
        &fixture,
        2021,
        &[
            (FUND_A, "2021-01-31", "Shoppings"),
            (FUND_A, "2021-02-28", "Shoppings"),
            (FUND_B, "2021-01-31", "Logística"),
            (FUND_C, "2021-01-31", ""),
        ],
    );
    fixtures::write_general(
        &fixture,
        2022,
        &[
            (FUND_A, "2022-01-31", "Shoppings"),
            (FUND_B, "2022-01-31", "logística"),
        ],
    );

    let store = fixture.store(&[2021, 2022]);
    let session = store.open_session();
    let counts = session.segment_counts_per_year().unwrap();

    let count = |segment: &str, year, filings, funds| SegmentCount {
        segment: segment.to_string(),
        year,
        filings,
        funds,
    };
    assert_eq!(
        counts,
        vec![
            count("Logística", 2021, 1, 1),
            count("Shoppings", 2021, 2, 1),
            count("Shoppings", 2022, 1, 1),
            count("logística", 2022, 1, 1),
        ]
    );
}

#[test]
fn test_dividend_yield_leaders() {
    logging::log_test_step("Accumulating dividend yield across years");
    let fixture = FixtureDir::new();
    fixtures::write_complement(
        &fixture,
        2021,
        &[
            (FUND_A, "2021-01-31", "0.5"),
            (FUND_A, "2021-02-28", "N/D"),
            (FUND_A, "2021-03-31", "0.7"),
            (FUND_B, "2021-01-31", "1.0"),
            (FUND_C, "2021-01-31", "0.2"),
        ],
    );
    fixtures::write_complement(
        &fixture,
        2022,
        &[
            (FUND_A, "2022-01-31", "0.4"),
            (FUND_B, "31/01/2022", "0.3"),
            (FUND_C, "2022-01-31", ""),
        ],
    );

    let store = fixture.store(&[2021, 2022]);
    let session = store.open_session();

    let yearly = session.dividend_yield_per_year().unwrap();
    assert_eq!(yearly.len(), 6);
    assert_close(yearly[0].value, 1.2);
    // a fund-year with no usable value still shows up, at zero
    assert_eq!((yearly[5].entity_id.as_str(), yearly[5].year), (FUND_C, 2022));
    assert_close(yearly[5].value, 0.0);

    let (leaders, summaries) = session.top_dividend_yield_funds(2).unwrap();
    assert_eq!(leaders.scope, RankScope::Global);
    assert_eq!(
        leaders.rows.iter().map(|r| r.entity_id.as_str()).collect::<Vec<_>>(),
        vec![FUND_A, FUND_B]
    );
    assert_close(leaders.rows[0].value, 1.6);
    assert_eq!(leaders.rows[0].year, None);

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].entity_id, FUND_A);
    assert_eq!(summaries[0].years, 2);
    assert_close(summaries[0].total, 1.6);
    assert_close(summaries[0].mean, 0.8);
    assert_close(summaries[1].mean, 0.65);
}

#[test]
fn test_ranked_rows_dominate_the_rest_of_their_year() {
    let fixture = FixtureDir::new();
    fixtures::write_asset_liability(&fixture, &[2020, 2021]);

    let store = fixture.store(&[2020, 2021]);
    let session = store.open_session();
    let table = session.merged_asset_liability().unwrap();
    let totals = fii_insights::analysis::asset_totals(&table).unwrap();
    let top = session.top_assets_per_year(1).unwrap();

    for row in &totals {
        let leader = top.for_year(row.year).next().unwrap();
        assert!(leader.value >= row.value);
    }
    assert_eq!(top.rows.len(), 2);
}
