//! excelinator-core: Core library for reconciling two tabular datasets
//!
//! This library provides functionality to:
//! - Mark every origin row as matched/unmatched against partner keys
//! - Copy selected partner columns onto origin rows by left join
//! - Process large origin CSV files in bounded row-count chunks
//! - Read CSV and XLSX inputs and write CSV or XLSX results

pub mod coordinator;
pub mod error;
pub mod job;
pub mod key;
pub mod matcher;
pub mod merger;
pub mod namer;
pub mod options;
pub mod reader;
pub mod table;
pub mod writer;

pub use coordinator::{
    reconcile_chunks, reconcile_files, reconcile_table, select_mode, ChunkSource, ProcessingMode,
    Reconciliation, TableChunks,
};
pub use error::{Dataset, Error, Result};
pub use job::{JobFile, JobReport};
pub use key::{KeyRef, KeyValue};
pub use matcher::mark_matches;
pub use merger::merge_datasets;
pub use namer::resolve_column_name;
pub use options::ReconcileOptions;
pub use reader::{detect_format, parse_csv, parse_csv_str, parse_xlsx, read_table, CsvChunkReader, InputFormat};
pub use table::{CellValue, Column, Row, Table};
pub use writer::{save_table, OutputFormat};
