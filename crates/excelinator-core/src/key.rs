//! Key column references and hashable key values

use crate::error::{Dataset, Error, Result};
use crate::table::{CellValue, Column};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reference to a key column, by name or by 0-based position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyRef {
    Position(usize),
    Name(String),
}

impl KeyRef {
    /// Resolve to a concrete column name among `columns`.
    ///
    /// A name that is not a column but reads as an in-range position is
    /// taken as that position.
    pub fn resolve(&self, columns: &[Column], dataset: Dataset) -> Result<String> {
        let by_position = |pos: usize| columns.get(pos).map(|c| c.name.clone());

        let resolved = match self {
            KeyRef::Name(name) => columns
                .iter()
                .find(|c| &c.name == name)
                .map(|c| c.name.clone())
                .or_else(|| name.trim().parse::<usize>().ok().and_then(by_position)),
            KeyRef::Position(pos) => by_position(*pos),
        };

        resolved.ok_or_else(|| Error::InvalidKeyColumn {
            dataset,
            key: self.to_string(),
        })
    }
}

impl Default for KeyRef {
    fn default() -> Self {
        KeyRef::Position(0)
    }
}

impl fmt::Display for KeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRef::Position(pos) => write!(f, "{}", pos),
            KeyRef::Name(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for KeyRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(KeyRef::Name(s.to_string()))
    }
}

impl From<&str> for KeyRef {
    fn from(s: &str) -> Self {
        KeyRef::Name(s.to_string())
    }
}

/// Hashable form of a cell used for membership tests and joins.
///
/// Integral floats fold into `Integer` so `2` and `2.0` are the same key.
/// `Empty` is a key like any other and matches `Empty`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Integer(i64),
    Float(u64),
    Boolean(bool),
    String(String),
    Empty,
}

impl From<&CellValue> for KeyValue {
    fn from(cell: &CellValue) -> Self {
        match cell {
            CellValue::Integer(i) => KeyValue::Integer(*i),
            CellValue::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    KeyValue::Integer(*f as i64)
                } else if f.is_nan() {
                    KeyValue::Empty
                } else {
                    KeyValue::Float(f.to_bits())
                }
            }
            CellValue::Boolean(b) => KeyValue::Boolean(*b),
            CellValue::String(s) => KeyValue::String(s.clone()),
            CellValue::Empty => KeyValue::Empty,
        }
    }
}
