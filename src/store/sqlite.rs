//! SQLite-backed [`PeriodStore`].
//!
//! Replacement runs inside one transaction (delete the period, insert the
//! batch, commit) so WAL readers see either the old period or the new one.
//! Writers are additionally serialized process-wide.

use std::path::Path;
use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tokio::sync::Mutex;
use tracing::info;

use crate::db;
use crate::error::{PayrollError, PayrollResult};
use crate::models::{PayrollRecord, Period, Variant};
use crate::schema;

use super::{batch_period, PeriodCount, PeriodStore};

fn write_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

const RECORD_COLUMNS: &str = "employee_id, employee_name, department, position, work_type, \
    base_salary, overtime_pay, allowances, bonuses, deductions, night_shift_pay, holiday_pay, \
    skill_allowance, work_hours, overtime_hours, hourly_rate, overtime_rate, productivity_score, \
    cost_center, project_code, payment_date, year, month";

pub struct SqliteStore {
    pool: SqlitePool,
    variant: Variant,
}

impl SqliteStore {
    /// Wrap a pool whose schema is already in place.
    pub fn new(pool: SqlitePool, variant: Variant) -> Self {
        Self { pool, variant }
    }

    /// Connect to `path` and ensure the variant's schema exists.
    pub async fn open(path: &Path, variant: Variant) -> PayrollResult<Self> {
        let pool = db::connect(path).await?;
        if let Err(e) = schema::ensure_schema(&pool, variant).await {
            pool.close().await;
            return Err(e);
        }
        Ok(Self::new(pool, variant))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO {} ({}, {}) VALUES ({})",
            self.variant.table(),
            RECORD_COLUMNS,
            self.variant.total_column(),
            vec!["?"; 24].join(", ")
        )
    }
}

fn period_from_row(row: &SqliteRow) -> Result<Period, sqlx::Error> {
    let year: i64 = row.try_get("year")?;
    let month: i64 = row.try_get("month")?;
    i32::try_from(year)
        .ok()
        .zip(u32::try_from(month).ok())
        .and_then(|(y, m)| Period::new(y, m))
        .ok_or_else(|| sqlx::Error::ColumnDecode {
            index: "month".to_string(),
            source: format!("stored period {}-{} is out of range", year, month).into(),
        })
}

fn record_from_row(row: &SqliteRow) -> Result<PayrollRecord, sqlx::Error> {
    let payment_date: String = row.try_get("payment_date")?;
    let payment_date = NaiveDate::parse_from_str(&payment_date, "%Y-%m-%d").map_err(|e| {
        sqlx::Error::ColumnDecode {
            index: "payment_date".to_string(),
            source: Box::new(e),
        }
    })?;
    let period = period_from_row(row)?;

    Ok(PayrollRecord {
        employee_id: row.try_get("employee_id")?,
        employee_name: row.try_get("employee_name")?,
        department: row.try_get("department")?,
        position: row.try_get("position")?,
        work_type: row.try_get("work_type")?,
        base_salary: row.try_get("base_salary")?,
        overtime_pay: row.try_get("overtime_pay")?,
        allowances: row.try_get("allowances")?,
        bonuses: row.try_get("bonuses")?,
        deductions: row.try_get("deductions")?,
        night_shift_pay: row.try_get("night_shift_pay")?,
        holiday_pay: row.try_get("holiday_pay")?,
        skill_allowance: row.try_get("skill_allowance")?,
        total: row.try_get("total")?,
        work_hours: row.try_get("work_hours")?,
        overtime_hours: row.try_get("overtime_hours")?,
        hourly_rate: row.try_get("hourly_rate")?,
        overtime_rate: row.try_get("overtime_rate")?,
        productivity_score: row.try_get("productivity_score")?,
        cost_center: row.try_get("cost_center")?,
        project_code: row.try_get("project_code")?,
        payment_date,
        year: period.year,
        month: period.month,
    })
}

#[async_trait]
impl PeriodStore for SqliteStore {
    async fn replace_period(&self, records: &[PayrollRecord]) -> PayrollResult<usize> {
        let Some(period) = batch_period(records)? else {
            return Ok(0);
        };
        let write_err = |source: sqlx::Error| PayrollError::StorageWrite { period, source };

        let _guard = write_lock().lock().await;
        let mut tx = self.pool.begin().await.map_err(write_err)?;

        let deleted = sqlx::query(&format!(
            "DELETE FROM {} WHERE year = ? AND month = ?",
            self.variant.table()
        ))
        .bind(period.year as i64)
        .bind(period.month as i64)
        .execute(&mut *tx)
        .await
        .map_err(write_err)?
        .rows_affected();

        let insert = self.insert_sql();
        for r in records {
            sqlx::query(&insert)
                .bind(&r.employee_id)
                .bind(&r.employee_name)
                .bind(&r.department)
                .bind(&r.position)
                .bind(&r.work_type)
                .bind(r.base_salary)
                .bind(r.overtime_pay)
                .bind(r.allowances)
                .bind(r.bonuses)
                .bind(r.deductions)
                .bind(r.night_shift_pay)
                .bind(r.holiday_pay)
                .bind(r.skill_allowance)
                .bind(r.work_hours)
                .bind(r.overtime_hours)
                .bind(r.hourly_rate)
                .bind(r.overtime_rate)
                .bind(r.productivity_score)
                .bind(&r.cost_center)
                .bind(&r.project_code)
                .bind(r.payment_date.format("%Y-%m-%d").to_string())
                .bind(r.year as i64)
                .bind(r.month as i64)
                .bind(r.total)
                .execute(&mut *tx)
                .await
                .map_err(write_err)?;
        }

        tx.commit().await.map_err(write_err)?;

        info!(
            table = self.variant.table(),
            %period,
            replaced = deleted,
            inserted = records.len(),
            "period replaced"
        );
        Ok(records.len())
    }

    async fn latest_period(&self) -> PayrollResult<Period> {
        let row = sqlx::query(&format!(
            "SELECT year, month FROM {} ORDER BY year DESC, month DESC LIMIT 1",
            self.variant.table()
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(PayrollError::StorageRead)?;

        let row = row.ok_or(PayrollError::EmptyStore)?;
        period_from_row(&row).map_err(PayrollError::StorageRead)
    }

    async fn query_period(&self, period: Period) -> PayrollResult<Vec<PayrollRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {cols}, {total} AS total FROM {table} \
             WHERE year = ? AND month = ? \
             ORDER BY department, {total} DESC, employee_id",
            cols = RECORD_COLUMNS,
            total = self.variant.total_column(),
            table = self.variant.table(),
        ))
        .bind(period.year as i64)
        .bind(period.month as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(PayrollError::StorageRead)?;

        rows.iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(PayrollError::StorageRead)
    }

    async fn period_counts(&self) -> PayrollResult<Vec<PeriodCount>> {
        let rows = sqlx::query(&format!(
            "SELECT year, month, COUNT(*) AS records, COALESCE(SUM({total}), 0) AS total \
             FROM {table} GROUP BY year, month ORDER BY year, month",
            total = self.variant.total_column(),
            table = self.variant.table(),
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(PayrollError::StorageRead)?;

        rows.iter()
            .map(|row| {
                let records: i64 = row.try_get("records")?;
                Ok(PeriodCount {
                    period: period_from_row(row)?,
                    records: usize::try_from(records).unwrap_or_default(),
                    total: row.try_get("total")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(PayrollError::StorageRead)
    }
}
