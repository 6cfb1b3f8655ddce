//! Period-scoped persistence for payroll records.
//!
//! The [`PeriodStore`] trait is the only path by which records are written
//! or read. A period `(year, month)` is the unit of replacement: loading a
//! period again deletes every prior record of that exact period and inserts
//! the new batch, atomically.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`replace_period`](PeriodStore::replace_period) | Atomically replace one period's records |
//! | [`latest_period`](PeriodStore::latest_period) | Maximum stored period |
//! | [`query_period`](PeriodStore::query_period) | All records of one period |
//! | [`period_counts`](PeriodStore::period_counts) | Record count and total per period |
//! | [`periods`](PeriodStore::periods) | Distinct stored periods, ascending |

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{PayrollError, PayrollResult};
use crate::models::{PayrollRecord, Period};

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Stored records for one period, as reported by `stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodCount {
    pub period: Period,
    pub records: usize,
    pub total: i64,
}

#[async_trait]
pub trait PeriodStore: Send + Sync {
    /// Replace all records of the batch's period with the batch.
    ///
    /// Returns the number of records written. An empty batch is a no-op.
    async fn replace_period(&self, records: &[PayrollRecord]) -> PayrollResult<usize>;

    /// Maximum stored period, or [`PayrollError::EmptyStore`].
    async fn latest_period(&self) -> PayrollResult<Period>;

    /// All records of `period`, ordered by department then total descending.
    async fn query_period(&self, period: Period) -> PayrollResult<Vec<PayrollRecord>>;

    /// Per-period record counts and totals, ascending by period.
    async fn period_counts(&self) -> PayrollResult<Vec<PeriodCount>>;

    async fn periods(&self) -> PayrollResult<Vec<Period>> {
        Ok(self
            .period_counts()
            .await?
            .into_iter()
            .map(|c| c.period)
            .collect())
    }
}

/// The single period shared by a batch, `None` for an empty batch.
pub fn batch_period(records: &[PayrollRecord]) -> PayrollResult<Option<Period>> {
    let Some(first) = records.first().map(PayrollRecord::period) else {
        return Ok(None);
    };
    match records.iter().map(PayrollRecord::period).find(|p| *p != first) {
        Some(other) => Err(PayrollError::MixedPeriods { first, other }),
        None => Ok(Some(first)),
    }
}

/// Storage order shared by every backend.
pub(crate) fn sort_records(records: &mut [PayrollRecord]) {
    records.sort_by(|a, b| {
        a.department
            .cmp(&b.department)
            .then(b.total.cmp(&a.total))
            .then_with(|| a.employee_id.cmp(&b.employee_id))
    });
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;

    use crate::models::PayrollRecord;

    pub fn record(id: &str, dept: &str, year: i32, month: u32, total: i64) -> PayrollRecord {
        PayrollRecord {
            employee_id: id.to_string(),
            employee_name: format!("Employee {}", id),
            department: dept.to_string(),
            position: "general".to_string(),
            work_type: "regular".to_string(),
            base_salary: total,
            overtime_pay: 0,
            allowances: 0,
            bonuses: 0,
            deductions: 0,
            night_shift_pay: 0,
            holiday_pay: 0,
            skill_allowance: 0,
            total,
            work_hours: 40.0,
            overtime_hours: 0.0,
            hourly_rate: total as f64 / 173.2,
            overtime_rate: total as f64 / 173.2 * 1.5,
            productivity_score: 100.0,
            cost_center: dept.to_string(),
            project_code: "DEFAULT".to_string(),
            payment_date: NaiveDate::from_ymd_opt(year, month, 25).unwrap(),
            year,
            month,
        }
    }
}
