use std::fmt;

use crate::error::{Result, ToolError};

/// Literal written in place of missing cells in every tabular output.
pub const NULL_TOKEN: &str = "nan";

/// Represents a single cell of an in-memory table.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Blank or unreadable cell.
    Missing,
    /// Floating point number.
    Number(f64),
    /// Plain string.
    Text(String),
    /// Boolean flag.
    Flag(bool),
}

impl CellValue {
    /// Wraps an optional measurement, mapping `None` onto [`CellValue::Missing`].
    pub fn from_measurement(value: Option<f64>) -> Self {
        value.map(CellValue::Number).unwrap_or(CellValue::Missing)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Returns the numeric value of the cell, parsing numeric text.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            CellValue::Text(value) => value.trim().parse().ok(),
            CellValue::Flag(_) | CellValue::Missing => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => f.write_str(NULL_TOKEN),
            CellValue::Number(value) if value.is_nan() => f.write_str(NULL_TOKEN),
            CellValue::Number(value) => write!(f, "{value}"),
            CellValue::Text(value) => f.write_str(value),
            CellValue::Flag(true) => f.write_str("True"),
            CellValue::Flag(false) => f.write_str("False"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Flag(value)
    }
}

/// A rectangular table that will be materialised as a tab-separated file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row, rejecting rows whose width differs from the header.
    pub fn push_row(&mut self, row: Vec<CellValue>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(ToolError::RaggedRow {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }
}
