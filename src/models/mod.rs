use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::errors::{PipelineError, Result};
use crate::merger::MissingPartitionPolicy;
use crate::period::DatePolicy;

/// Years published by the regulator that the analyses cover by default.
pub const DEFAULT_YEARS: [i32; 5] = [2020, 2021, 2022, 2023, 2024];

pub const DEFAULT_TOP_N: usize = 5;

/// Column names of the monthly FII disclosure files.
pub mod columns {
    pub const ENTITY_ID: &str = "CNPJ_Fundo";
    pub const REFERENCE_DATE: &str = "Data_Referencia";
    pub const LIQUIDITY_NEEDS: &str = "Total_Necessidades_Liquidez";
    pub const INVESTED: &str = "Total_Investido";
    pub const REAL_ESTATE_RIGHTS: &str = "Direitos_Bens_Imoveis";
    pub const RECEIVABLES: &str = "Valores_Receber";
    pub const TOTAL_LIABILITY: &str = "Total_Passivo";
    pub const SEGMENT: &str = "Segmento_Atuacao";
    pub const MONTHLY_DIVIDEND_YIELD: &str = "Percentual_Dividend_Yield_Mes";
}

/// Logical dataset a partition file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    AssetLiability,
    Complement,
    General,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::AssetLiability,
        Category::Complement,
        Category::General,
    ];

    /// Stem used in the partition file name, e.g. `inf_mensal_fii_geral_2024.csv`
    pub fn file_stem(&self) -> &'static str {
        match self {
            Category::AssetLiability => "ativo_passivo",
            Category::Complement => "complemento",
            Category::General => "geral",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::AssetLiability => "Asset/Liability",
            Category::Complement => "Complement",
            Category::General => "General",
        }
    }

    /// Complement files mix date layouts across years, the other two do not.
    pub fn default_date_policy(&self) -> DatePolicy {
        match self {
            Category::Complement => DatePolicy::mixed(),
            Category::AssetLiability | Category::General => DatePolicy::iso(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One monthly balance-sheet filing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetLiabilityRecord {
    pub entity_id: String,
    pub reference_date: Option<NaiveDate>,
    pub liquidity_needs: Option<f64>,
    pub invested: Option<f64>,
    pub real_estate_rights: Option<f64>,
    pub receivables: Option<f64>,
    pub total_liability: Option<f64>,
}

impl AssetLiabilityRecord {
    /// Sum of the four asset components, missing components count as zero.
    pub fn total_asset(&self) -> f64 {
        [
            self.liquidity_needs,
            self.invested,
            self.real_estate_rights,
            self.receivables,
        ]
        .iter()
        .flatten()
        .sum()
    }
}

/// One monthly general-information filing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralRecord {
    pub entity_id: String,
    pub reference_date: Option<NaiveDate>,
    /// Kept verbatim; distinct spellings are distinct segments.
    pub segment: Option<String>,
}

/// One monthly complementary filing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplementRecord {
    pub entity_id: String,
    pub reference_date: Option<NaiveDate>,
    pub dividend_yield: Option<f64>,
}

/// Records that can be grouped by (entity, year)
pub trait PeriodRecord {
    fn entity_id(&self) -> &str;
    fn reference_date(&self) -> Option<NaiveDate>;

    fn year(&self) -> Option<i32> {
        self.reference_date().map(|date| date.year())
    }
}

impl PeriodRecord for AssetLiabilityRecord {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn reference_date(&self) -> Option<NaiveDate> {
        self.reference_date
    }
}

impl PeriodRecord for GeneralRecord {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn reference_date(&self) -> Option<NaiveDate> {
        self.reference_date
    }
}

impl PeriodRecord for ComplementRecord {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn reference_date(&self) -> Option<NaiveDate> {
        self.reference_date
    }
}

/// Aggregated metric kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    TotalAsset,
    TotalLiability,
    DividendYield,
}

impl Metric {
    /// Column label used when a metric is exported or displayed
    pub fn label(&self) -> &'static str {
        match self {
            Metric::TotalAsset => "Total_Ativo",
            Metric::TotalLiability => "Total_Passivo",
            Metric::DividendYield => "Percentual_Dividend_Yield_Ano",
        }
    }
}

/// Sum of one metric for one fund in one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub entity_id: String,
    pub year: i32,
    pub metric: Metric,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RankScope {
    PerYear,
    Global,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow {
    /// 1-based position inside its group
    pub rank: usize,
    pub entity_id: String,
    /// None for globally ranked rows
    pub year: Option<i32>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSubset {
    pub metric: Metric,
    pub scope: RankScope,
    pub limit: usize,
    pub rows: Vec<RankedRow>,
}

impl RankedSubset {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.rows.iter().any(|row| row.entity_id == entity_id)
    }

    /// Rows of one year, in rank order
    pub fn for_year(&self, year: i32) -> impl Iterator<Item = &RankedRow> {
        self.rows.iter().filter(move |row| row.year == Some(year))
    }

    /// Distinct years present, ascending
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.rows.iter().filter_map(|row| row.year).collect();
        years.dedup();
        years
    }
}

/// Sum and mean of a selected fund's yearly totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerFundSummary {
    pub entity_id: String,
    pub total: f64,
    pub mean: f64,
    pub years: usize,
}

/// Filings per segment label per year
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentCount {
    pub segment: String,
    pub year: i32,
    pub filings: usize,
    pub funds: usize,
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub years: Vec<i32>,
    pub missing_partitions: MissingPartitionPolicy,
    pub top_n: usize,
    pub date_policies: BTreeMap<Category, DatePolicy>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            years: DEFAULT_YEARS.to_vec(),
            missing_partitions: MissingPartitionPolicy::Skip,
            top_n: DEFAULT_TOP_N,
            date_policies: Category::ALL
                .iter()
                .map(|category| (*category, category.default_date_policy()))
                .collect(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(dir) = lookup("FII_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(years) = lookup("FII_YEARS") {
            config.years = parse_years(&years)?;
        }
        if let Some(policy) = lookup("FII_MISSING_PARTITIONS") {
            config.missing_partitions = policy.parse()?;
        }
        if let Some(top_n) = lookup("FII_TOP_N") {
            config.top_n = top_n.trim().parse().map_err(|_| {
                PipelineError::InvalidArgument(format!("invalid FII_TOP_N '{}'", top_n))
            })?;
        }

        Ok(config)
    }

    pub fn date_policy(&self, category: Category) -> DatePolicy {
        self.date_policies
            .get(&category)
            .cloned()
            .unwrap_or_else(|| category.default_date_policy())
    }
}

/// Parse `2020,2022,2024` or `2020-2024` into an ascending, de-duplicated list
pub fn parse_years(value: &str) -> Result<Vec<i32>> {
    let invalid = || PipelineError::InvalidArgument(format!("invalid year list '{}'", value));

    let mut years = Vec::new();
    for part in value.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start: i32 = start.trim().parse().map_err(|_| invalid())?;
                let end: i32 = end.trim().parse().map_err(|_| invalid())?;
                if start > end {
                    return Err(invalid());
                }
                years.extend(start..=end);
            }
            None => years.push(part.parse().map_err(|_| invalid())?),
        }
    }

    if years.is_empty() {
        return Err(invalid());
    }
    years.sort_unstable();
    years.dedup();
    Ok(years)
}
