//! `paypulse show <view>`: print one analysis to stdout.
//!
//! Views render as aligned text tables, or as JSON with `--json` for piping
//! into other tools.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::analytics::{self, Scope};
use crate::config::Config;
use crate::manager::LaborCostManager;
use crate::models::{Period, Variant};
use crate::report::{Table, TableRow};
use crate::store::PeriodStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum View {
    /// Per-department totals and cost ratios.
    Departments,
    /// Per-position averages.
    Positions,
    /// Monthly headcount and cost trend.
    Trend,
    /// Monthly overtime per department.
    Overtime,
    /// Per-employee efficiency index.
    Efficiency,
    /// Per-employee actual hourly cost.
    Hourly,
    /// Overtime bucket distribution per department.
    Buckets,
}

pub struct ShowOptions {
    pub view: View,
    pub period: Option<Period>,
    pub months: Option<usize>,
    pub json: bool,
}

pub async fn run_show(config: &Config, variant: Variant, opts: &ShowOptions) -> Result<()> {
    let manager = LaborCostManager::open(config, variant)
        .await
        .with_context(|| format!("failed to open {} ledger", variant))?;
    let months = opts.months.unwrap_or(config.report.trend_months).max(1);
    let result = render(manager.store(), variant, opts, months).await;
    manager.close().await;

    println!("{}", result?);
    Ok(())
}

async fn render(
    store: &dyn PeriodStore,
    variant: Variant,
    opts: &ShowOptions,
    months: usize,
) -> Result<String> {
    let scope = Scope::from(opts.period);
    match opts.view {
        View::Trend | View::Overtime => {
            let until = analytics::resolve_scope(store, scope).await?;
            let records = match until {
                Some(p) => analytics::recent_records(store, months, Some(p)).await?,
                None => Vec::new(),
            };
            if opts.view == View::Trend {
                output(&analytics::monthly_trend(&records), variant, opts.json)
            } else {
                output(&analytics::overtime_trend(&records), variant, opts.json)
            }
        }
        view => {
            let (_, records) = analytics::scoped_records(store, scope).await?;
            match view {
                View::Departments => {
                    output(&analytics::department_summary(&records), variant, opts.json)
                }
                View::Positions => {
                    output(&analytics::position_summary(&records), variant, opts.json)
                }
                View::Efficiency => {
                    output(&analytics::efficiency_analysis(&records), variant, opts.json)
                }
                View::Hourly => {
                    output(&analytics::hourly_cost_analysis(&records), variant, opts.json)
                }
                _ => output(&analytics::overtime_distribution(&records), variant, opts.json),
            }
        }
    }
}

fn output<T: TableRow + Serialize>(rows: &[T], variant: Variant, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(rows)?);
    }
    if rows.is_empty() {
        return Ok("No data.".to_string());
    }
    Ok(format_table(&Table::from_rows(rows, variant)))
}

/// Render a table with right-aligned numbers and left-aligned text.
pub fn format_table(table: &Table) -> String {
    let rendered: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|r| r.iter().map(|c| c.as_display()).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rendered
                .iter()
                .filter_map(|r| r.get(i))
                .map(|s| s.chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = table
        .columns
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{:<w$}", h, w = w))
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');
    out.push_str(&"-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));

    for (cells, raw) in rendered.iter().zip(&table.rows) {
        out.push('\n');
        let line: Vec<String> = cells
            .iter()
            .zip(raw)
            .zip(&widths)
            .map(|((s, cell), w)| match cell {
                crate::tabular::Cell::Number(_) => format!("{:>w$}", s, w = w),
                _ => format!("{:<w$}", s, w = w),
            })
            .collect();
        out.push_str(line.join("  ").trim_end());
    }
    out
}
