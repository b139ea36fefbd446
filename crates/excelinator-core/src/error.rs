//! Error types for excelinator-core

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of the reconciliation a dataset belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Origin,
    Partner,
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::Origin => write!(f, "origin"),
            Dataset::Partner => write!(f, "partner"),
        }
    }
}

/// Errors that can occur in excelinator-core
#[derive(Debug, Error)]
pub enum Error {
    /// Key column does not exist in its dataset
    #[error("the key column '{key}' for the {dataset} file is invalid")]
    InvalidKeyColumn { dataset: Dataset, key: String },

    /// Copy-columns (or the partner key) absent from the partner dataset
    #[error("the following columns do not appear in the partner file: {}", .columns.join(", "))]
    MissingPartnerColumns { columns: Vec<String> },

    /// Chunk row limit of zero
    #[error("chunk row limit must be at least 1")]
    InvalidChunkSize,

    /// Input format could not be recognized
    #[error("the file type of '{path}' is not supported. Supported file types: Excel 2007+, CSV")]
    UnsupportedFormat { path: PathBuf },

    /// Failed to read a file
    #[error("the file '{path}' does not exist, or it is not readable: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse CSV
    #[error("failed to parse CSV '{path}': {message}")]
    CsvParse { path: PathBuf, message: String },

    /// CSV error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Failed to read a spreadsheet
    #[error("failed to read spreadsheet '{path}': {message}")]
    Xlsx { path: PathBuf, message: String },

    /// Failed to write a spreadsheet
    #[error("failed to write spreadsheet: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Column mismatch while accumulating chunks
    #[error("column mismatch: expected '{expected}', found '{found}' in {path}")]
    ColumnMismatch {
        expected: String,
        found: String,
        path: PathBuf,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error comes from invalid user configuration rather than I/O
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidKeyColumn { .. }
                | Error::MissingPartnerColumns { .. }
                | Error::InvalidChunkSize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_lists_every_name() {
        let err = Error::MissingPartnerColumns {
            columns: vec!["name".to_string(), "email".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "the following columns do not appear in the partner file: name, email"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn test_invalid_key_names_dataset() {
        let err = Error::InvalidKeyColumn {
            dataset: Dataset::Partner,
            key: "ID".to_string(),
        };
        assert!(err.to_string().contains("partner"));
        assert!(err.to_string().contains("'ID'"));
    }

    #[test]
    fn test_io_errors_are_not_configuration() {
        let err = Error::UnsupportedFormat {
            path: PathBuf::from("data.bin"),
        };
        assert!(!err.is_configuration());
    }
}
