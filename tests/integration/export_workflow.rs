//! Filtering a merged dataset and writing it out

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use test_log::test;

use crate::common::fixtures::{self, FUND_A, FUND_B};
use crate::common::FixtureDir;
use fii_insights::export::{export_to_path, ExportRequest};

#[test]
fn test_export_filtered_general_dataset() {
    let fixture = FixtureDir::new();
    fixtures::write_general(
        &fixture,
        2022,
        &[
            (FUND_A, "2022-12-31", "Shoppings"),
            (FUND_B, "2022-12-31", "Logística"),
        ],
    );
    fixtures::write_general(
        &fixture,
        2023,
        &[
            (FUND_B, "2023-01-31", "Logística"),
            (FUND_B, "2022-12-31", "Logística"),
        ],
    );

    let store = fixture.store(&[2022, 2023]);
    let session = store.open_session();
    let table = session.merged_general().unwrap();

    let request = ExportRequest {
        columns: Some(vec!["CNPJ_Fundo".to_string(), "Segmento_Atuacao".to_string()]),
        reference_date: NaiveDate::from_ymd_opt(2022, 12, 31),
        entity_id: Some(FUND_B.to_string()),
    };
    let view = request.apply(&table).unwrap();
    assert_eq!(view.rows.len(), 2);

    let out = TempDir::new().unwrap();
    let path = out.path().join("general.csv");
    assert_eq!(export_to_path(&view, &path).unwrap(), 2);

    let mut reader = csv::Reader::from_path(&path).unwrap();
    assert_eq!(
        reader.headers().unwrap().iter().collect::<Vec<_>>(),
        vec!["CNPJ_Fundo", "Segmento_Atuacao"]
    );
    let rows: Vec<Vec<String>> = reader
        .records()
        .map(|record| record.unwrap().iter().map(String::from).collect())
        .collect();
    assert_eq!(
        rows,
        vec![
            vec![FUND_B.to_string(), "Logística".to_string()],
            vec![FUND_B.to_string(), "Logística".to_string()],
        ]
    );
}
