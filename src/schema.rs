//! Idempotent table and index creation for one variant's store.
//!
//! Both variants share the same column layout; only the table name and the
//! name of the derived total column differ (see [`Variant::table`] and
//! [`Variant::total_column`]). Existing tables and data are never altered.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{PayrollError, PayrollResult};
use crate::models::Variant;

pub async fn ensure_schema(pool: &SqlitePool, variant: Variant) -> PayrollResult<()> {
    let table = variant.table();
    let total = variant.total_column();

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_id TEXT NOT NULL,
            employee_name TEXT NOT NULL,
            department TEXT NOT NULL,
            position TEXT NOT NULL DEFAULT 'general',
            work_type TEXT NOT NULL DEFAULT 'regular',
            base_salary INTEGER NOT NULL DEFAULT 0,
            overtime_pay INTEGER NOT NULL DEFAULT 0,
            allowances INTEGER NOT NULL DEFAULT 0,
            bonuses INTEGER NOT NULL DEFAULT 0,
            deductions INTEGER NOT NULL DEFAULT 0,
            night_shift_pay INTEGER NOT NULL DEFAULT 0,
            holiday_pay INTEGER NOT NULL DEFAULT 0,
            skill_allowance INTEGER NOT NULL DEFAULT 0,
            {total} INTEGER NOT NULL DEFAULT 0,
            work_hours REAL NOT NULL DEFAULT 40.0,
            overtime_hours REAL NOT NULL DEFAULT 0,
            hourly_rate REAL NOT NULL DEFAULT 0,
            overtime_rate REAL NOT NULL DEFAULT 0,
            productivity_score REAL NOT NULL DEFAULT 100.0,
            cost_center TEXT NOT NULL DEFAULT '',
            project_code TEXT NOT NULL DEFAULT 'DEFAULT',
            payment_date TEXT NOT NULL,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(year, month, employee_id)
        )
        "#
    ))
    .execute(pool)
    .await
    .map_err(PayrollError::StorageInit)?;

    let indexes = [
        format!("CREATE INDEX IF NOT EXISTS idx_{table}_period ON {table}(year, month)"),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_dept_period ON {table}(department, year, month)"
        ),
        format!("CREATE INDEX IF NOT EXISTS idx_{table}_employee ON {table}(employee_id)"),
    ];
    for sql in &indexes {
        sqlx::query(sql)
            .execute(pool)
            .await
            .map_err(PayrollError::StorageInit)?;
    }

    debug!(table, "schema ready");
    Ok(())
}
