//! Raw tabular input: a header row plus loosely typed cells.
//!
//! This is the boundary between spreadsheet files and the normalizer. Cells
//! keep whatever type the file gave them; coercion happens in
//! [`crate::normalize`].

use std::path::Path;

use crate::error::{PayrollError, PayrollResult};
use crate::xlsx;

/// A single cell value as read from a file (or written to a report).
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s)
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Display form; integral numbers print without a fractional part.
    pub fn as_display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => format!("{}", n),
        }
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Number(v as f64)
    }
}

impl From<usize> for Cell {
    fn from(v: usize) -> Self {
        Cell::Number(v as f64)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        if v.is_finite() {
            Cell::Number(v)
        } else {
            Cell::Empty
        }
    }
}

impl From<Option<f64>> for Cell {
    fn from(v: Option<f64>) -> Self {
        v.map(Cell::from).unwrap_or(Cell::Empty)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::text(v)
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::text(v)
    }
}

/// Header row and data rows of one sheet. Rows may be shorter than the
/// header; missing trailing cells read as [`Cell::Empty`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }
}

/// Read the first sheet of an `.xlsx` file, or a `.csv` file.
pub fn read_table(path: &Path) -> PayrollResult<RawTable> {
    if !path.exists() {
        return Err(PayrollError::InputNotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "xlsx" | "xlsm" => {
            let bytes = std::fs::read(path)?;
            xlsx::read_first_sheet(&bytes).map_err(|e| PayrollError::InputUnreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
        "csv" => read_csv(path),
        other => Err(PayrollError::InputUnreadable {
            path: path.to_path_buf(),
            reason: format!("unsupported file type '.{}' (expected .xlsx or .csv)", other),
        }),
    }
}

fn read_csv(path: &Path) -> PayrollResult<RawTable> {
    let unreadable = |e: csv::Error| PayrollError::InputUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(unreadable)?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(unreadable)?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(unreadable)?;
        rows.push(record.iter().map(Cell::text).collect());
    }

    Ok(RawTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn csv_strips_bom_and_keeps_blank_cells() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("payroll.csv");
        std::fs::write(
            &path,
            "\u{feff}사번,성명,기본급\nE001,Kim,3000000\nE002,,\n",
        )
        .unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.headers, vec!["사번", "성명", "기본급"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(0, 2), &Cell::Text("3000000".to_string()));
        assert!(table.cell(1, 1).is_empty());
        assert!(table.cell(5, 5).is_empty());
    }

    #[test]
    fn missing_file_is_input_not_found() {
        let err = read_table(Path::new("/nonexistent/payroll.xlsx")).unwrap_err();
        assert!(matches!(err, PayrollError::InputNotFound(_)));
    }

    #[test]
    fn unsupported_extension_is_unreadable() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("payroll.ods");
        std::fs::write(&path, b"whatever").unwrap();
        let err = read_table(&path).unwrap_err();
        assert!(matches!(err, PayrollError::InputUnreadable { .. }));
    }

    #[test]
    fn integral_numbers_display_without_fraction() {
        assert_eq!(Cell::Number(1001.0).as_display(), "1001");
        assert_eq!(Cell::Number(10.5).as_display(), "10.5");
        assert_eq!(Cell::from(f64::NAN), Cell::Empty);
    }
}
