//! Ledger statistics: what is stored, per variant and per period.
//!
//! Used by `paypulse stats` to confirm that loads landed where expected.
//! A ledger file that does not exist yet is reported as such and is not
//! created.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::manager::LaborCostManager;
use crate::models::Variant;
use crate::report::thousands;
use crate::store::PeriodStore;

/// Run the stats command: query both ledgers and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    println!("PayPulse — Ledger Stats");
    println!("=======================");

    for variant in Variant::all() {
        let path = config.db.path_for(variant);
        println!();
        println!("  Ledger:      {} ({})", variant, path.display());

        if !path.exists() {
            println!("  Status:      not initialized");
            continue;
        }

        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        println!("  Size:        {}", format_bytes(size));

        let manager = LaborCostManager::open(config, variant)
            .await
            .with_context(|| format!("failed to open {} ledger", variant))?;
        let counts = manager.store().period_counts().await;
        manager.close().await;
        let counts = counts?;

        let records: usize = counts.iter().map(|c| c.records).sum();
        println!("  Periods:     {}", counts.len());
        println!("  Records:     {}", records);
        if let Some(latest) = counts.last() {
            println!("  Latest:      {}", latest.period);
        }

        if !counts.is_empty() {
            println!();
            println!(
                "  {:<10} {:>8} {:>20}",
                "PERIOD",
                "RECORDS",
                format!("TOTAL ({})", config.report.currency_unit)
            );
            println!("  {}", "-".repeat(40));
            for c in &counts {
                println!(
                    "  {:<10} {:>8} {:>20}",
                    c.period.to_string(),
                    c.records,
                    thousands(c.total)
                );
            }
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
