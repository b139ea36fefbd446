//! Orchestration of match marking and merging over whole or chunked origins
//!
//! The partner is always loaded in full first. The origin is either read
//! whole or streamed in fixed row-count chunks; each chunk goes through the
//! same mark-then-merge steps and is appended to the result in arrival order.

use crate::error::{Dataset, Error, Result};
use crate::matcher::mark_matches;
use crate::merger::merge_datasets;
use crate::options::ReconcileOptions;
use crate::reader::{detect_format, read_table, CsvChunkReader, InputFormat};
use crate::table::{Column, Table};
use log::{debug, info};
use std::io::Read;
use std::path::Path;

/// How the origin dataset is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    /// Read fully, processed in one pass
    Whole,
    /// Streamed in windows of `rows` rows
    Chunked { rows: usize },
}

impl std::fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingMode::Whole => write!(f, "whole dataset"),
            ProcessingMode::Chunked { rows } => write!(f, "chunks of {} rows", rows),
        }
    }
}

/// Pick the processing mode for an origin of `format` and `size_bytes`
pub fn select_mode(format: InputFormat, size_bytes: u64, options: &ReconcileOptions) -> ProcessingMode {
    if format.supports_chunking() && size_bytes >= options.chunk_size_threshold_bytes {
        ProcessingMode::Chunked {
            rows: options.chunk_row_limit,
        }
    } else {
        ProcessingMode::Whole
    }
}

/// A source of sequential, order-preserving origin chunks sharing one header
pub trait ChunkSource {
    /// Header shared by every chunk
    fn columns(&self) -> &[Column];

    /// Path the chunks come from
    fn source_path(&self) -> &Path;

    /// Next chunk, or `None` when exhausted
    fn next_chunk(&mut self) -> Result<Option<Table>>;
}

impl<R: Read> ChunkSource for CsvChunkReader<R> {
    fn columns(&self) -> &[Column] {
        CsvChunkReader::columns(self)
    }

    fn source_path(&self) -> &Path {
        CsvChunkReader::source_path(self)
    }

    fn next_chunk(&mut self) -> Result<Option<Table>> {
        CsvChunkReader::next_chunk(self)
    }
}

/// Splits an in-memory table into chunks of a fixed row count
#[derive(Debug, Clone)]
pub struct TableChunks {
    table: Table,
    chunk_rows: usize,
    position: usize,
}

impl TableChunks {
    pub fn new(table: Table, chunk_rows: usize) -> Result<Self> {
        if chunk_rows == 0 {
            return Err(Error::InvalidChunkSize);
        }
        Ok(Self {
            table,
            chunk_rows,
            position: 0,
        })
    }
}

impl ChunkSource for TableChunks {
    fn columns(&self) -> &[Column] {
        &self.table.columns
    }

    fn source_path(&self) -> &Path {
        &self.table.source_path
    }

    fn next_chunk(&mut self) -> Result<Option<Table>> {
        if self.position >= self.table.row_count() {
            return Ok(None);
        }
        let end = self.position.saturating_add(self.chunk_rows).min(self.table.row_count());
        let mut chunk = self.table.empty_like();
        chunk.rows = self.table.rows[self.position..end].to_vec();
        self.position = end;
        Ok(Some(chunk))
    }
}

/// Outcome of a reconciliation run
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// The accumulated result dataset
    pub table: Table,
    /// Mode the origin was processed in
    pub mode: ProcessingMode,
    /// Number of origin chunks processed (1 in whole mode)
    pub chunks: usize,
}

/// Run mark then (if copy-columns were requested) merge on one origin unit
fn process_unit(
    origin: &Table,
    partner: &Table,
    origin_key: &str,
    partner_key: &str,
    options: &ReconcileOptions,
) -> Result<Table> {
    let marked = mark_matches(origin, partner, origin_key, partner_key, options)?;
    if options.copy_columns.is_empty() {
        return Ok(marked);
    }
    merge_datasets(&marked, partner, origin_key, partner_key, &options.copy_columns)
}

/// Reconcile an origin held fully in memory
pub fn reconcile_table(origin: &Table, partner: &Table, options: &ReconcileOptions) -> Result<Table> {
    options.validate()?;
    let partner_key = options.partner_key.resolve(&partner.columns, Dataset::Partner)?;
    let origin_key = options.origin_key.resolve(&origin.columns, Dataset::Origin)?;

    process_unit(origin, partner, &origin_key, &partner_key, options)
}

/// Reconcile an origin chunk by chunk, appending results in arrival order.
///
/// The origin key is resolved once against the shared header. An error in
/// any chunk aborts the whole run; nothing accumulated so far is returned.
pub fn reconcile_chunks<S: ChunkSource>(
    source: &mut S,
    partner: &Table,
    options: &ReconcileOptions,
) -> Result<Reconciliation> {
    options.validate()?;
    let partner_key = options.partner_key.resolve(&partner.columns, Dataset::Partner)?;
    let origin_key = options.origin_key.resolve(source.columns(), Dataset::Origin)?;

    let mut accumulator: Option<Table> = None;
    let mut chunks = 0;
    while let Some(chunk) = source.next_chunk()? {
        chunks += 1;
        debug!("processing chunk {} ({} rows)", chunks, chunk.row_count());
        let processed = process_unit(&chunk, partner, &origin_key, &partner_key, options)?;
        match accumulator.as_mut() {
            Some(acc) => acc.append(processed)?,
            None => accumulator = Some(processed),
        }
    }

    // An origin with a header but no rows still yields the result header
    let table = match accumulator {
        Some(table) => table,
        None => {
            let empty = Table::with_columns(
                &source.columns().iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                source.source_path().to_path_buf(),
            );
            process_unit(&empty, partner, &origin_key, &partner_key, options)?
        }
    };

    Ok(Reconciliation {
        table,
        mode: ProcessingMode::Chunked {
            rows: options.chunk_row_limit,
        },
        chunks,
    })
}

/// Read both files and reconcile them, choosing the origin mode by size and format
pub fn reconcile_files<P: AsRef<Path>, Q: AsRef<Path>>(
    origin_path: P,
    partner_path: Q,
    options: &ReconcileOptions,
) -> Result<Reconciliation> {
    let origin_path = origin_path.as_ref();
    let partner_path = partner_path.as_ref();
    options.validate()?;

    let origin_format = detect_format(origin_path)?;
    let partner_format = detect_format(partner_path)?;
    let origin_size = std::fs::metadata(origin_path)
        .map_err(|e| Error::FileRead {
            path: origin_path.to_path_buf(),
            source: e,
        })?
        .len();
    let mode = select_mode(origin_format, origin_size, options);

    info!("Loading the partner file...");
    let partner = read_table(partner_path, partner_format)?;

    match mode {
        ProcessingMode::Whole => {
            info!("Reading origin file in normal mode...");
            let origin = read_table(origin_path, origin_format)?;
            let table = reconcile_table(&origin, &partner, options)?;
            Ok(Reconciliation {
                table,
                mode,
                chunks: 1,
            })
        }
        ProcessingMode::Chunked { rows } => {
            info!("Your origin file seems heavy, reading in lazy load mode...");
            let mut source = CsvChunkReader::open(origin_path, rows)?;
            reconcile_chunks(&mut source, &partner, options)
        }
    }
}
