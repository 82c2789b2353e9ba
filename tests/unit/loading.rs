//! Partition loading and multi-year merging against files on disk

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use test_log::test;

use crate::common::fixtures::{self, FUND_A, FUND_B};
use crate::common::{logging, FixtureDir};
use fii_insights::loader::PartitionLoader;
use fii_insights::merger::{collect_partitions, merge_partitions, MissingPartitionPolicy};
use fii_insights::table::PartitionSummary;
use fii_insights::{Category, PipelineError};

#[test]
fn test_load_decodes_latin1_partition() {
    let fixture = FixtureDir::new();
    fixtures::write_general(&fixture, 2024, &[(FUND_A, "2024-01-31", "Lajes Corporativas")]);

    let table = PartitionLoader::new(fixture.path())
        .load(Category::General, 2024)
        .unwrap();

    assert_eq!(table.columns, fixtures::GENERAL_COLUMNS);
    assert_eq!(table.len(), 1);
    assert_eq!(table.rows[0][2], "Fundo Imobiliário");
}

#[test]
fn test_missing_file_is_data_unavailable() {
    let fixture = FixtureDir::new();
    let err = PartitionLoader::new(fixture.path())
        .load(Category::Complement, 2021)
        .unwrap_err();

    assert!(err.is_data_unavailable());
    assert_matches!(err, PipelineError::DataUnavailable { category: Category::Complement, year: 2021, .. });
}

#[test]
fn test_merge_keeps_every_row_in_year_order() {
    logging::log_test_step("Merging three general partitions");
    let fixture = FixtureDir::new();
    fixtures::write_general(&fixture, 2023, &[(FUND_A, "2023-01-31", "Shoppings")]);
    fixtures::write_general(
        &fixture,
        2021,
        &[
            (FUND_A, "2021-01-31", "Shoppings"),
            (FUND_A, "2021-01-31", "Shoppings"),
        ],
    );
    fixtures::write_general(
        &fixture,
        2022,
        &[
            (FUND_A, "2022-01-31", "Shoppings"),
            (FUND_B, "2022-01-31", "Logística"),
            (FUND_B, "2022-02-28", "Logística"),
        ],
    );

    let loader = PartitionLoader::new(fixture.path());
    let partitions = collect_partitions(
        &loader,
        Category::General,
        &[2023, 2021, 2022],
        MissingPartitionPolicy::Fail,
    )
    .unwrap();
    let merged = merge_partitions(Category::General, partitions).unwrap();
    logging::log_test_data("Partitions", &merged.partitions);

    assert_eq!(merged.table.len(), 6);
    assert_eq!(
        merged.partitions,
        vec![
            PartitionSummary { year: 2021, rows: 2 },
            PartitionSummary { year: 2022, rows: 3 },
            PartitionSummary { year: 2023, rows: 1 },
        ]
    );
    // duplicates survive the merge
    assert_eq!(merged.table.rows[0], merged.table.rows[1]);
    assert_eq!(merged.table.rows[5][1], "2023-01-31");
}

#[test]
fn test_missing_year_follows_policy() {
    let fixture = FixtureDir::new();
    fixtures::write_general(&fixture, 2021, &[(FUND_A, "2021-06-30", "Híbrido")]);
    let loader = PartitionLoader::new(fixture.path());

    let skipped = collect_partitions(
        &loader,
        Category::General,
        &[2020, 2021, 2022],
        MissingPartitionPolicy::Skip,
    )
    .unwrap();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].year, 2021);

    let err = collect_partitions(
        &loader,
        Category::General,
        &[2020, 2021, 2022],
        MissingPartitionPolicy::Fail,
    )
    .unwrap_err();
    assert_matches!(err, PipelineError::DataUnavailable { year: 2020, .. });
}

#[test]
fn test_no_partition_at_all() {
    let fixture = FixtureDir::new();
    let loader = PartitionLoader::new(fixture.path());

    let err = collect_partitions(&loader, Category::AssetLiability, &[2020, 2021], MissingPartitionPolicy::Skip)
        .unwrap_err();
    assert_matches!(err, PipelineError::NoPartitions { category: Category::AssetLiability });
}

#[test]
fn test_schema_drift_is_rejected() {
    let fixture = FixtureDir::new();
    fixtures::write_general(&fixture, 2021, &[(FUND_A, "2021-01-31", "Shoppings")]);
    fixture.write_partition(
        Category::General,
        2022,
        &["CNPJ_Fundo", "Data_Referencia", "Segmento_Atuacao"],
        &[&[FUND_A, "2022-01-31", "Shoppings"]],
    );

    let loader = PartitionLoader::new(fixture.path());
    let partitions =
        collect_partitions(&loader, Category::General, &[2021, 2022], MissingPartitionPolicy::Fail).unwrap();
    let err = merge_partitions(Category::General, partitions).unwrap_err();

    assert_matches!(err, PipelineError::SchemaMismatch { year: 2022, .. });
}
