//! Sample disclosure rows shared by the test modules

use super::FixtureDir;
use fii_insights::Category;

pub const ASSET_LIABILITY_COLUMNS: &[&str] = &[
    "CNPJ_Fundo",
    "Data_Referencia",
    "Versao",
    "Total_Necessidades_Liquidez",
    "Total_Investido",
    "Direitos_Bens_Imoveis",
    "Valores_Receber",
    "Total_Passivo",
];

pub const GENERAL_COLUMNS: &[&str] = &[
    "CNPJ_Fundo",
    "Data_Referencia",
    "Nome_Fundo",
    "Segmento_Atuacao",
];

pub const COMPLEMENT_COLUMNS: &[&str] = &[
    "CNPJ_Fundo",
    "Data_Referencia",
    "Patrimonio_Liquido",
    "Percentual_Dividend_Yield_Mes",
];

pub const FUND_A: &str = "11.111.111/0001-11";
pub const FUND_B: &str = "22.222.222/0001-22";
pub const FUND_C: &str = "33.333.333/0001-33";

/// Fund A files 100+200+50+50 every year; B and C trail it.
pub fn write_asset_liability(fixture: &FixtureDir, years: &[i32]) {
    for &year in years {
        let january = format!("{}-01-31", year);
        let february = format!("{}-02-28", year);
        fixture.write_partition(
            Category::AssetLiability,
            year,
            ASSET_LIABILITY_COLUMNS,
            &[
                &[FUND_A, january.as_str(), "1", "100", "200", "50", "50", "30"],
                &[FUND_B, january.as_str(), "1", "10", "90", "", "", "80"],
                &[FUND_B, february.as_str(), "1", "10", "90", "", "", "5.5"],
                &[FUND_C, january.as_str(), "1", "N/D", "1", "1", "1", ""],
            ],
        );
    }
}

pub fn write_general(fixture: &FixtureDir, year: i32, rows: &[(&str, &str, &str)]) {
    let rows: Vec<Vec<&str>> = rows
        .iter()
        .map(|(fund, date, segment)| vec![*fund, *date, "Fundo Imobiliário", *segment])
        .collect();
    let rows: Vec<&[&str]> = rows.iter().map(Vec::as_slice).collect();
    fixture.write_partition(Category::General, year, GENERAL_COLUMNS, &rows);
}

pub fn write_complement(fixture: &FixtureDir, year: i32, rows: &[(&str, &str, &str)]) {
    let rows: Vec<Vec<&str>> = rows
        .iter()
        .map(|(fund, date, dy)| vec![*fund, *date, "1000000", *dy])
        .collect();
    let rows: Vec<&[&str]> = rows.iter().map(Vec::as_slice).collect();
    fixture.write_partition(Category::Complement, year, COMPLEMENT_COLUMNS, &rows);
}
