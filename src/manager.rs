//! Load and report orchestration for one variant's ledger.
//!
//! A [`LaborCostManager`] owns the store handle for its variant. It is only
//! constructed once the schema exists, and the CLI closes it on every exit
//! path.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::analytics::Scope;
use crate::config::{Config, ReportConfig};
use crate::error::PayrollResult;
use crate::models::{PayrollRecord, Period, Variant};
use crate::normalize::Normalizer;
use crate::report::{self, ReportBundle};
use crate::store::{PeriodStore, SqliteStore};
use crate::tabular::{self, RawTable};

/// Outcome of one load: records written per period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadSummary {
    pub periods: Vec<(Period, usize)>,
}

impl LoadSummary {
    pub fn records(&self) -> usize {
        self.periods.iter().map(|(_, n)| n).sum()
    }
}

pub struct LaborCostManager<S = SqliteStore> {
    variant: Variant,
    store: S,
    normalizer: Normalizer,
    report: ReportConfig,
}

impl LaborCostManager<SqliteStore> {
    /// Open the variant's SQLite ledger, creating its schema if needed.
    pub async fn open(config: &Config, variant: Variant) -> PayrollResult<Self> {
        let store = SqliteStore::open(config.db.path_for(variant), variant).await?;
        Ok(Self::with_store(config, variant, store))
    }

    pub async fn close(self) {
        self.store.close().await;
    }
}

impl<S: PeriodStore> LaborCostManager<S> {
    pub fn with_store(config: &Config, variant: Variant, store: S) -> Self {
        Self {
            variant,
            store,
            normalizer: Normalizer::from_config(config, variant),
            report: config.report.clone(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read and normalize `path` without touching the store.
    pub fn read_file(&self, path: &Path, today: NaiveDate) -> PayrollResult<Vec<PayrollRecord>> {
        let table = tabular::read_table(path)?;
        self.normalizer.normalize(&table, today)
    }

    pub async fn load_file(&self, path: &Path, today: NaiveDate) -> PayrollResult<LoadSummary> {
        info!(path = %path.display(), variant = %self.variant, "loading payroll file");
        let records = self.read_file(path, today)?;
        self.load_records(records).await
    }

    pub async fn load_table(&self, table: &RawTable, today: NaiveDate) -> PayrollResult<LoadSummary> {
        let records = self.normalizer.normalize(table, today)?;
        self.load_records(records).await
    }

    /// Replace each period present in `records`. The whole batch has already
    /// been validated; each period is committed in its own transaction.
    pub async fn load_records(&self, records: Vec<PayrollRecord>) -> PayrollResult<LoadSummary> {
        if records.is_empty() {
            warn!("input contained no data rows, nothing stored");
            return Ok(LoadSummary::default());
        }

        let mut by_period: BTreeMap<Period, Vec<PayrollRecord>> = BTreeMap::new();
        for r in records {
            by_period.entry(r.period()).or_default().push(r);
        }

        let mut summary = LoadSummary::default();
        for (period, batch) in by_period {
            let written = self.store.replace_period(&batch).await?;
            summary.periods.push((period, written));
        }
        Ok(summary)
    }

    pub async fn build_report(&self, scope: Scope) -> ReportBundle {
        report::build_report(
            &self.store,
            self.variant,
            scope,
            self.report.trend_months,
            &self.report.currency_unit,
        )
        .await
    }

    /// Build and write the report. `None` when there was nothing to write.
    pub async fn export_report(&self, scope: Scope, output: &Path) -> PayrollResult<Option<ReportBundle>> {
        let bundle = self.build_report(scope).await;
        if report::write_report(&bundle, output)? {
            Ok(Some(bundle))
        } else {
            Ok(None)
        }
    }
}
