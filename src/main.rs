use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use fii_insights::export::{export_to_path, write_csv, ExportRequest};
use fii_insights::merger::MissingPartitionPolicy;
use fii_insights::models::parse_years;
use fii_insights::report::{self, Dashboard};
use fii_insights::{Category, Config, DatasetStore};

/// Real-estate investment fund (FII) filings explorer
#[derive(Parser)]
#[command(name = "fii-insights")]
#[command(version = "0.1.0")]
#[command(about = "Aggregate and rank monthly FII disclosures published by the CVM")]
#[command(long_about = "
Reads the yearly monthly-disclosure files (asset/liability, complement and
general information), merges each category across years and prints rankings:
top funds by assets and liabilities per year, segment counts per year and the
funds with the highest accumulated dividend yield.

Files are expected at <data-dir>/inf_mensal_fii_<year>/inf_mensal_fii_<kind>_<year>.csv.

Examples:
  fii-insights report
  fii-insights --data-dir ~/cvm --years 2022-2024 assets -n 10
  fii-insights --json dividends
  fii-insights export --dataset general --fund 11.728.688/0001-47 -o general.csv
")]
struct Cli {
    /// Directory holding the inf_mensal_fii_<year> folders (env: FII_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Years to merge, e.g. 2020-2024 or 2021,2023 (env: FII_YEARS)
    #[arg(long, global = true)]
    years: Option<String>,

    /// Abort a category when one of its yearly files is missing instead of skipping it
    #[arg(long, global = true)]
    fail_on_missing: bool,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every analysis; unavailable categories are reported, not fatal
    Report {
        #[arg(long, short = 'n', help = "Funds kept per ranking (env: FII_TOP_N, default 5)")]
        top: Option<usize>,
    },
    /// Largest total assets per year
    Assets {
        #[arg(long, short = 'n')]
        top: Option<usize>,
    },
    /// Largest reported liabilities per year
    Liabilities {
        #[arg(long, short = 'n')]
        top: Option<usize>,
    },
    /// Filings per segment of operation per year
    Segments,
    /// Funds with the highest dividend yield accumulated over all years
    Dividends {
        #[arg(long, short = 'n')]
        top: Option<usize>,
    },
    /// Show the first rows of a merged dataset
    Preview {
        #[arg(long, value_enum)]
        dataset: DatasetArg,

        #[arg(long, default_value_t = 20)]
        rows: usize,
    },
    /// Filter a merged dataset and write it as CSV
    Export {
        #[arg(long, value_enum)]
        dataset: DatasetArg,

        /// Columns to keep, comma-separated (default: all)
        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,

        /// Keep only rows with this reference date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Keep only rows of this fund registry id (CNPJ)
        #[arg(long)]
        fund: Option<String>,

        /// Output file (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DatasetArg {
    AssetLiability,
    Complement,
    General,
}

impl From<DatasetArg> for Category {
    fn from(arg: DatasetArg) -> Self {
        match arg {
            DatasetArg::AssetLiability => Category::AssetLiability,
            DatasetArg::Complement => Category::Complement,
            DatasetArg::General => Category::General,
        }
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fii_insights=info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env().context("Failed to load configuration")?;

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(years) = &cli.years {
        config.years = parse_years(years)?;
    }
    if cli.fail_on_missing {
        config.missing_partitions = MissingPartitionPolicy::Fail;
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a single analysis, or its unavailable block and fail
fn emit<T: Serialize>(
    json: bool,
    category: Category,
    result: fii_insights::Result<T>,
    render: impl FnOnce(&T) -> String,
) -> Result<()> {
    match result {
        Ok(value) if json => print_json(&value),
        Ok(value) => {
            print!("{}", render(&value));
            Ok(())
        }
        Err(e) => {
            eprint!("{}", report::render_error(category, &e));
            Err(e.into())
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let config = load_config(&cli)?;
    let default_top = config.top_n;
    info!(
        "🚀 Reading FII filings from {} for years {:?}",
        config.data_dir.display(),
        config.years
    );

    let store = Arc::new(DatasetStore::new(config));
    let session = store.open_session();

    match cli.command {
        Commands::Report { top } => {
            let dashboard = Dashboard::collect(&session, top.unwrap_or(default_top));
            if cli.json {
                print_json(&dashboard)?;
            } else {
                print!("{}", dashboard.render_text());
            }
            let failed = dashboard.unavailable_count();
            if failed == Category::ALL.len() {
                anyhow::bail!("no dataset could be loaded");
            }
            Ok(())
        }
        Commands::Assets { top } => emit(
            cli.json,
            Category::AssetLiability,
            session.top_assets_per_year(top.unwrap_or(default_top)),
            |subset| report::render_ranked("Top funds by total assets per year", subset),
        ),
        Commands::Liabilities { top } => emit(
            cli.json,
            Category::AssetLiability,
            session.top_liabilities_per_year(top.unwrap_or(default_top)),
            |subset| report::render_ranked("Top funds by total liabilities per year", subset),
        ),
        Commands::Segments => emit(
            cli.json,
            Category::General,
            session.segment_counts_per_year(),
            |counts| report::render_segments(counts),
        ),
        Commands::Dividends { top } => emit(
            cli.json,
            Category::Complement,
            report::dividend_section(&session, top.unwrap_or(default_top)),
            report::render_dividends,
        ),
        Commands::Preview { dataset, rows } => {
            let category = Category::from(dataset);
            let table = session.merged(category).map_err(|e| {
                eprint!("{}", report::render_error(category, &e));
                e
            })?;
            if cli.json {
                let mut view = ExportRequest::default().apply(&table)?;
                view.rows.truncate(rows);
                print_json(&view)?;
            } else {
                print!("{}", report::render_preview(&table, rows));
            }
            Ok(())
        }
        Commands::Export {
            dataset,
            columns,
            date,
            fund,
            output,
        } => {
            let category = Category::from(dataset);
            let table = session.merged(category)?;
            let request = ExportRequest {
                columns,
                reference_date: date,
                entity_id: fund,
            };
            let view = request.apply(&table)?;
            match output {
                Some(path) => {
                    export_to_path(&view, &path)?;
                }
                None => {
                    write_csv(&view, std::io::stdout().lock())?;
                }
            }
            Ok(())
        }
    }
}
