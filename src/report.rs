//! Text and JSON presentation of the analyses
//!
//! Each section is computed independently so that one unavailable category
//! still leaves the other sections on screen.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::analysis;
use crate::errors::{PipelineError, Result};
use crate::models::{
    AggregateRow, Category, Metric, PerFundSummary, RankedSubset, SegmentCount,
};
use crate::session::AnalysisSession;
use crate::table::CategoryTable;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Section<T> {
    Ready { data: T },
    Unavailable { category: Category, reason: String },
}

impl<T> Section<T> {
    fn from_result(category: Category, result: Result<T>) -> Self {
        match result {
            Ok(data) => Section::Ready { data },
            Err(e) => {
                tracing::error!("❌ {} section failed: {}", category, e);
                Section::Unavailable {
                    category,
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Section::Ready { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceSection {
    pub assets: RankedSubset,
    pub liabilities: RankedSubset,
}

/// One fund-year point, flagged when the fund is among the leaders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DividendPoint {
    pub entity_id: String,
    pub year: i32,
    pub value: f64,
    pub leader: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DividendSection {
    pub leaders: RankedSubset,
    pub summaries: Vec<PerFundSummary>,
    pub points: Vec<DividendPoint>,
}

impl DividendSection {
    pub fn build(yearly: Vec<AggregateRow>, leaders: RankedSubset, summaries: Vec<PerFundSummary>) -> Self {
        let leader_ids: BTreeSet<&str> = leaders.rows.iter().map(|r| r.entity_id.as_str()).collect();
        let points = yearly
            .into_iter()
            .map(|row| DividendPoint {
                leader: leader_ids.contains(row.entity_id.as_str()),
                entity_id: row.entity_id,
                year: row.year,
                value: row.value,
            })
            .collect();

        Self {
            leaders,
            summaries,
            points,
        }
    }
}

pub fn balance_section(session: &AnalysisSession, n: usize) -> Result<BalanceSection> {
    Ok(BalanceSection {
        assets: session.top_assets_per_year(n)?,
        liabilities: session.top_liabilities_per_year(n)?,
    })
}

pub fn dividend_section(session: &AnalysisSession, n: usize) -> Result<DividendSection> {
    let yearly = session.dividend_yield_per_year()?;
    let (leaders, summaries) = analysis::top_n_overall(&yearly, Metric::DividendYield, n);
    Ok(DividendSection::build(yearly, leaders, summaries))
}

/// All three analyses, each isolated from the others' failures
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub balance: Section<BalanceSection>,
    pub segments: Section<Vec<SegmentCount>>,
    pub dividends: Section<DividendSection>,
}

impl Dashboard {
    pub fn collect(session: &AnalysisSession, n: usize) -> Self {
        Self {
            balance: Section::from_result(Category::AssetLiability, balance_section(session, n)),
            segments: Section::from_result(Category::General, session.segment_counts_per_year()),
            dividends: Section::from_result(Category::Complement, dividend_section(session, n)),
        }
    }

    pub fn unavailable_count(&self) -> usize {
        [
            self.balance.is_ready(),
            self.segments.is_ready(),
            self.dividends.is_ready(),
        ]
        .iter()
        .filter(|ready| !**ready)
        .count()
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();

        match &self.balance {
            Section::Ready { data } => {
                out.push_str(&render_ranked("Top funds by total assets per year", &data.assets));
                out.push('\n');
                out.push_str(&render_ranked("Top funds by total liabilities per year", &data.liabilities));
            }
            Section::Unavailable { category, reason } => out.push_str(&render_unavailable(*category, reason)),
        }
        out.push('\n');

        match &self.segments {
            Section::Ready { data } => out.push_str(&render_segments(data)),
            Section::Unavailable { category, reason } => out.push_str(&render_unavailable(*category, reason)),
        }
        out.push('\n');

        match &self.dividends {
            Section::Ready { data } => out.push_str(&render_dividends(data)),
            Section::Unavailable { category, reason } => out.push_str(&render_unavailable(*category, reason)),
        }

        out
    }
}

fn heading(title: &str) -> String {
    format!("{}\n{}\n", title, "=".repeat(title.chars().count()))
}

pub fn render_unavailable(category: Category, reason: &str) -> String {
    format!("{}⚠️  Data unavailable: {}\n", heading(category.display_name()), reason)
}

pub fn render_error(category: Category, error: &PipelineError) -> String {
    render_unavailable(category, &error.to_string())
}

pub fn render_ranked(title: &str, subset: &RankedSubset) -> String {
    let mut out = heading(title);
    if subset.is_empty() {
        out.push_str("(no rows)\n");
        return out;
    }

    for row in &subset.rows {
        let period = row.year.map(|y| y.to_string()).unwrap_or_else(|| "all".to_string());
        out.push_str(&format!(
            "{:>5}  #{:<2} {:<22} {:>22.2}\n",
            period,
            row.rank,
            row.entity_id,
            row.value
        ));
    }
    out
}

pub fn render_segments(counts: &[SegmentCount]) -> String {
    let mut out = heading("Segments of operation per year");
    let mut current_year = None;
    for count in counts {
        if current_year != Some(count.year) {
            out.push_str(&format!("{}\n", count.year));
            current_year = Some(count.year);
        }
        out.push_str(&format!(
            "  {:<40} {:>7} filings {:>5} funds\n",
            count.segment, count.filings, count.funds
        ));
    }
    if counts.is_empty() {
        out.push_str("(no rows)\n");
    }
    out
}

pub fn render_dividends(section: &DividendSection) -> String {
    let mut out = render_ranked("Top funds by accumulated dividend yield", &section.leaders);
    out.push('\n');
    out.push_str(&heading("Leader metrics"));
    for summary in &section.summaries {
        out.push_str(&format!(
            "{:<22} yearly DY total: {:>8.2}  mean: {:>6.2}  ({} years)\n",
            summary.entity_id, summary.total, summary.mean, summary.years
        ));
    }
    let leader_points = section.points.iter().filter(|p| p.leader).count();
    out.push_str(&format!(
        "{} fund-year points, {} belong to leaders\n",
        section.points.len(),
        leader_points
    ));
    out
}

/// First `limit` rows of a merged table, `;`-separated like the source files
pub fn render_preview(table: &CategoryTable, limit: usize) -> String {
    let mut out = heading(&format!(
        "{} dataset ({} rows, years {:?})",
        table.category,
        table.len(),
        table.years()
    ));
    out.push_str(&table.columns.join(";"));
    out.push('\n');
    for row in table.rows.iter().take(limit) {
        out.push_str(&row.fields.join(";"));
        out.push('\n');
    }
    out
}
