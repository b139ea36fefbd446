//! Core table types for origin, partner and result datasets

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

static EMPTY_CELL: CellValue = CellValue::Empty;

/// A tabular dataset with an ordered column list shared by all rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Column definitions
    pub columns: Vec<Column>,
    /// Row data, each row holding one cell per column
    pub rows: Vec<Row>,
    /// Source file path
    pub source_path: PathBuf,
}

impl Table {
    /// Create an empty table with the given column names
    pub fn with_columns<S: AsRef<str>>(names: &[S], source_path: PathBuf) -> Self {
        Self {
            columns: names
                .iter()
                .enumerate()
                .map(|(i, name)| Column::new(name.as_ref().to_string(), i))
                .collect(),
            rows: Vec::new(),
            source_path,
        }
    }

    /// Create an empty table sharing this table's columns
    pub fn empty_like(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: Vec::new(),
            source_path: self.source_path.clone(),
        }
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.find_column(name).map(|c| c.index)
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Values of one column, top to bottom
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &CellValue> {
        self.rows.iter().map(move |r| r.get(index).unwrap_or(&EMPTY_CELL))
    }

    /// Append a column at the end, filling every row from `values`
    pub fn push_column(&mut self, name: String, values: Vec<CellValue>) {
        let index = self.columns.len();
        self.columns.push(Column::new(name, index));
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.cells.push(value);
        }
    }

    /// Append the rows of another table with the same columns
    pub fn append(&mut self, other: Table) -> Result<()> {
        if self.columns.len() != other.columns.len() {
            return Err(Error::ColumnMismatch {
                expected: self.column_names().join(","),
                found: other.column_names().join(","),
                path: other.source_path,
            });
        }
        for (ours, theirs) in self.columns.iter().zip(&other.columns) {
            if ours.name != theirs.name {
                return Err(Error::ColumnMismatch {
                    expected: ours.name.clone(),
                    found: theirs.name.clone(),
                    path: other.source_path,
                });
            }
        }

        self.rows.extend(other.rows);
        Ok(())
    }

    /// Upper-case every header and every string cell
    pub fn to_uppercase(mut self) -> Self {
        for column in &mut self.columns {
            column.name = column.name.to_uppercase();
        }
        for row in &mut self.rows {
            for cell in &mut row.cells {
                if let CellValue::String(s) = cell {
                    *s = s.to_uppercase();
                }
            }
        }
        self
    }
}

/// A column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Column index (0-based)
    pub index: usize,
}

impl Column {
    /// Create a new column
    pub fn new(name: String, index: usize) -> Self {
        Self { name, index }
    }
}

/// A row of data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Cell values for each column
    pub cells: Vec<CellValue>,
}

impl Row {
    /// Create a new row
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }
}

/// A cell value with type detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Integer value
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// String value
    String(String),
    /// Empty/null cell
    Empty,
}

impl CellValue {
    /// Parse a string into a CellValue, detecting the type.
    ///
    /// Surrounding whitespace is ignored for detection only; text cells keep
    /// their original content.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        // Try parsing as integer first
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Integer(i);
        }

        // Integer literals beyond i64 stay exact text rather than a lossy float
        if !is_integer_literal(trimmed) {
            if let Ok(f) = trimmed.parse::<f64>() {
                return CellValue::Float(f);
            }
        }

        match trimmed {
            "true" | "True" | "TRUE" => return CellValue::Boolean(true),
            "false" | "False" | "FALSE" => return CellValue::Boolean(false),
            _ => {}
        }

        CellValue::String(s.to_string())
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Convert to a display string
    pub fn to_string_value(&self) -> String {
        match self {
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Boolean(b) => b.to_string(),
            CellValue::String(s) => s.clone(),
            CellValue::Empty => String::new(),
        }
    }
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
