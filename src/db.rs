use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::error::{PayrollError, PayrollResult};

/// Open (creating if needed) the SQLite file at `path` in WAL mode.
pub async fn connect(path: &Path) -> PayrollResult<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| PayrollError::StorageInit(sqlx::Error::Io(e)))?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
        .map_err(PayrollError::StorageInit)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(PayrollError::StorageInit)?;

    Ok(pool)
}
