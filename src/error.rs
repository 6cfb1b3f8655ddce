//! Error taxonomy for the load, storage, and report paths.
//!
//! Load-path failures ([`PayrollError::InputNotFound`],
//! [`PayrollError::MissingField`], [`PayrollError::StorageWrite`], ...) are
//! returned to the caller and never leave a partially written period behind.
//! [`PayrollError::StorageInit`] is the only fatal condition: a manager whose
//! schema could not be created is never constructed.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::Period;

#[derive(Debug, Error)]
pub enum PayrollError {
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("could not read {}: {reason}", .path.display())]
    InputUnreadable { path: PathBuf, reason: String },

    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("missing required columns: {}", .0.join(", "))]
    MissingField(Vec<String>),

    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("duplicate employee_id '{employee_id}' in period {period}")]
    DuplicateEmployee { employee_id: String, period: Period },

    #[error("batch spans more than one period ({first} and {other})")]
    MixedPeriods { first: Period, other: Period },

    #[error("failed to initialize storage: {0}")]
    StorageInit(#[source] sqlx::Error),

    #[error("failed to replace period {period}: {source}")]
    StorageWrite {
        period: Period,
        #[source]
        source: sqlx::Error,
    },

    #[error("storage query failed: {0}")]
    StorageRead(#[source] sqlx::Error),

    #[error("no payroll records stored")]
    EmptyStore,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type PayrollResult<T> = Result<T, PayrollError>;

impl PayrollError {
    /// True for failures caused by the input file rather than the store.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PayrollError::InputNotFound(_)
                | PayrollError::InputUnreadable { .. }
                | PayrollError::Spreadsheet(_)
                | PayrollError::MissingField(_)
                | PayrollError::InvalidRow { .. }
                | PayrollError::DuplicateEmployee { .. }
                | PayrollError::MixedPeriods { .. }
        )
    }
}
