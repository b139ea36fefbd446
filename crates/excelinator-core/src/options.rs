//! Reconciliation options

use crate::error::{Error, Result};
use crate::key::KeyRef;
use serde::{Deserialize, Serialize};

/// Default name of the column receiving match markers
pub const DEFAULT_RESULT_COLUMN: &str = "RESULTS";
/// Default marker for rows whose key is found in the partner
pub const DEFAULT_MATCH_MARKER: &str = "1";
/// Default marker for rows whose key is not found in the partner
pub const DEFAULT_MISMATCH_MARKER: &str = "0";
/// Rows per chunk in chunked mode
pub const DEFAULT_CHUNK_ROW_LIMIT: usize = 100_000;
/// Origin files at or above this size (14 MiB) are read in chunks
pub const DEFAULT_CHUNK_SIZE_THRESHOLD_BYTES: u64 = 14_680_064;

/// Everything the reconciliation engine needs besides the two datasets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileOptions {
    /// Key column in the origin dataset
    pub origin_key: KeyRef,
    /// Key column in the partner dataset
    pub partner_key: KeyRef,
    /// Name of the marker column added to every origin row
    pub result_column: String,
    /// Marker written when the origin key is present in the partner
    pub match_marker: String,
    /// Marker written otherwise
    pub mismatch_marker: String,
    /// Partner columns to copy onto matching origin rows
    pub copy_columns: Vec<String>,
    /// Remove rows whose marker is not the match marker
    pub drop_unmatched: bool,
    /// Rows per chunk when the origin is streamed
    pub chunk_row_limit: usize,
    /// Origin file size that switches to chunked mode
    pub chunk_size_threshold_bytes: u64,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            origin_key: KeyRef::default(),
            partner_key: KeyRef::default(),
            result_column: DEFAULT_RESULT_COLUMN.to_string(),
            match_marker: DEFAULT_MATCH_MARKER.to_string(),
            mismatch_marker: DEFAULT_MISMATCH_MARKER.to_string(),
            copy_columns: Vec::new(),
            drop_unmatched: false,
            chunk_row_limit: DEFAULT_CHUNK_ROW_LIMIT,
            chunk_size_threshold_bytes: DEFAULT_CHUNK_SIZE_THRESHOLD_BYTES,
        }
    }
}

impl ReconcileOptions {
    /// Create options for the given key columns, everything else defaulted
    pub fn new(origin_key: impl Into<KeyRef>, partner_key: impl Into<KeyRef>) -> Self {
        Self {
            origin_key: origin_key.into(),
            partner_key: partner_key.into(),
            ..Self::default()
        }
    }

    /// Copy-columns with repeats removed, first occurrence kept
    pub fn unique_copy_columns(&self) -> Vec<String> {
        let mut unique: Vec<String> = Vec::with_capacity(self.copy_columns.len());
        for column in &self.copy_columns {
            if !unique.contains(column) {
                unique.push(column.clone());
            }
        }
        unique
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunk_row_limit == 0 {
            return Err(Error::InvalidChunkSize);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ReconcileOptions::default();
        assert_eq!(options.result_column, "RESULTS");
        assert_eq!(options.match_marker, "1");
        assert_eq!(options.mismatch_marker, "0");
        assert!(options.copy_columns.is_empty());
        assert!(!options.drop_unmatched);
        assert_eq!(options.chunk_row_limit, 100_000);
        assert_eq!(options.chunk_size_threshold_bytes, 14 * 1024 * 1024);
    }

    #[test]
    fn test_unique_copy_columns_keeps_first_occurrence() {
        let mut options = ReconcileOptions::new("id", "id");
        options.copy_columns = vec!["b".into(), "a".into(), "b".into()];
        assert_eq!(options.unique_copy_columns(), vec!["b", "a"]);
    }

    #[test]
    fn test_zero_chunk_rows_rejected() {
        let mut options = ReconcileOptions::new("id", "id");
        options.chunk_row_limit = 0;
        assert!(options.validate().unwrap_err().is_configuration());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options: ReconcileOptions =
            serde_json::from_str(r#"{"origin_key": "ID", "partner_key": 2}"#).unwrap();
        assert_eq!(options.origin_key, KeyRef::Name("ID".to_string()));
        assert_eq!(options.partner_key, KeyRef::Position(2));
        assert_eq!(options.result_column, "RESULTS");
    }
}
