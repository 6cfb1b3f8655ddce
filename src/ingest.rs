//! `paypulse load`: spreadsheet → normalizer → period store.
//!
//! The whole file is validated before anything is written. With `--dry-run`
//! the store is never opened and the per-period breakdown is only printed.

use anyhow::{Context, Result};
use chrono::Local;
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::Config;
use crate::manager::LaborCostManager;
use crate::models::{PayrollRecord, Period, Variant};
use crate::normalize::Normalizer;
use crate::report::thousands;
use crate::tabular;

pub async fn run_load(config: &Config, variant: Variant, path: &Path, dry_run: bool) -> Result<()> {
    let today = Local::now().date_naive();
    let rejected = || format!("rejected {}; nothing was written", path.display());

    // The ledger is only opened once the whole input has been validated.
    let table = tabular::read_table(path).with_context(rejected)?;
    let records = Normalizer::from_config(config, variant)
        .normalize(&table, today)
        .with_context(rejected)?;

    if dry_run {
        println!(
            "Dry run: {} rows from {} would be loaded into the {} ledger",
            records.len(),
            path.display(),
            variant
        );
        print_breakdown(&records, &config.report.currency_unit);
        return Ok(());
    }

    let manager = LaborCostManager::open(config, variant)
        .await
        .with_context(|| format!("failed to open {} ledger", variant))?;
    let result = manager.load_records(records).await;
    manager.close().await;
    let summary = match result {
        Ok(summary) => summary,
        Err(e) if e.is_input_error() => return Err(e).with_context(rejected),
        Err(e) => return Err(e).with_context(|| format!("failed to load {}", path.display())),
    };

    if summary.periods.is_empty() {
        println!("No data rows in {}; nothing loaded.", path.display());
        return Ok(());
    }

    println!(
        "Loaded {} records from {} into the {} ledger:",
        summary.records(),
        path.display(),
        variant
    );
    for (period, count) in &summary.periods {
        println!("  {}  {:>6} records (replaced)", period, count);
    }
    Ok(())
}

fn print_breakdown(records: &[PayrollRecord], currency: &str) {
    let mut by_period: BTreeMap<Period, (usize, i64)> = BTreeMap::new();
    for r in records {
        let e = by_period.entry(r.period()).or_default();
        e.0 += 1;
        e.1 = e.1.saturating_add(r.total);
    }
    for (period, (count, total)) in by_period {
        println!(
            "  {}  {:>6} records  {:>18} {}",
            period,
            count,
            thousands(total),
            currency
        );
    }
}
