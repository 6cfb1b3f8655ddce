//! `paypulse report`: write the multi-sheet workbook for one variant.

use anyhow::{Context, Result};
use std::path::Path;

use crate::analytics::Scope;
use crate::config::Config;
use crate::manager::LaborCostManager;
use crate::models::{Period, Variant};

/// Build and write the report.
///
/// `output` defaults to the variant's `[report]` output path; `period`
/// defaults to the latest stored period.
pub async fn run_report(
    config: &Config,
    variant: Variant,
    output: Option<&Path>,
    period: Option<Period>,
) -> Result<()> {
    let output = output.unwrap_or_else(|| config.report.output_for(variant));

    let manager = LaborCostManager::open(config, variant)
        .await
        .with_context(|| format!("failed to open {} ledger", variant))?;
    let result = manager.export_report(Scope::from(period), output).await;
    manager.close().await;

    match result.with_context(|| format!("failed to write {}", output.display()))? {
        Some(bundle) => {
            let scope = bundle
                .period
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "Report for {} written to {} ({} sheets)",
                scope,
                output.display(),
                bundle.sections.len()
            );
            for name in bundle.section_names() {
                println!("  - {}", name);
            }
        }
        None => {
            println!("No {} payroll data to report; nothing written.", variant);
        }
    }
    Ok(())
}
