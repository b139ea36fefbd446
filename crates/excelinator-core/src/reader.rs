//! Dataset readers: format sniffing, CSV (whole or chunked) and XLSX

use crate::error::{Error, Result};
use crate::table::{CellValue, Column, Row, Table};
use calamine::{open_workbook, Data, Reader, Xlsx, XlsxError};
use chrono::{Duration, NaiveDate};
use log::warn;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Bytes inspected when sniffing a file's format
const SNIFF_LEN: usize = 8192;
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Xlsx,
}

impl InputFormat {
    /// Only row-oriented text can be streamed in chunks
    pub fn supports_chunking(self) -> bool {
        matches!(self, InputFormat::Csv)
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFormat::Csv => write!(f, "csv"),
            InputFormat::Xlsx => write!(f, "xlsx"),
        }
    }
}

/// Detect the format of a file from its content.
///
/// Fails with `FileRead` if the file cannot be opened and with
/// `UnsupportedFormat` if it is neither a ZIP container nor UTF-8 text.
pub fn detect_format<P: AsRef<Path>>(path: P) -> Result<InputFormat> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut head = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

    sniff(&head).ok_or_else(|| Error::UnsupportedFormat {
        path: path.to_path_buf(),
    })
}

fn sniff(head: &[u8]) -> Option<InputFormat> {
    if head.starts_with(ZIP_SIGNATURE) {
        return Some(InputFormat::Xlsx);
    }
    if head.is_empty() || head.contains(&0) {
        return None;
    }
    match std::str::from_utf8(head) {
        Ok(_) => Some(InputFormat::Csv),
        // A multi-byte character cut off by the sniff window is still text
        Err(e) if e.error_len().is_none() => Some(InputFormat::Csv),
        Err(_) => None,
    }
}

/// Read a whole dataset in the given format
pub fn read_table<P: AsRef<Path>>(path: P, format: InputFormat) -> Result<Table> {
    match format {
        InputFormat::Csv => parse_csv(path),
        InputFormat::Xlsx => parse_xlsx(path),
    }
}

/// Parse a CSV file into a Table
pub fn parse_csv<P: AsRef<Path>>(path: P) -> Result<Table> {
    CsvChunkReader::open(path, usize::MAX)?.read_remaining()
}

/// Parse CSV from a string (useful for testing)
pub fn parse_csv_str(content: &str, source_name: &str) -> Result<Table> {
    CsvChunkReader::from_reader(content.as_bytes(), source_name, usize::MAX)?.read_remaining()
}

/// Streams a CSV dataset as tables of at most `chunk_rows` rows.
///
/// The header is read once on construction and shared by every chunk.
pub struct CsvChunkReader<R: Read> {
    reader: csv::Reader<R>,
    columns: Vec<Column>,
    chunk_rows: usize,
    rows_read: usize,
    path: PathBuf,
}

impl CsvChunkReader<BufReader<File>> {
    /// Open a CSV file for chunked reading
    pub fn open<P: AsRef<Path>>(path: P, chunk_rows: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_reader(BufReader::new(file), path, chunk_rows)
    }
}

impl<R: Read> CsvChunkReader<R> {
    /// Wrap any reader; `source` names it in errors and on produced tables
    pub fn from_reader<P: AsRef<Path>>(reader: R, source: P, chunk_rows: usize) -> Result<Self> {
        let path = source.as_ref().to_path_buf();
        if chunk_rows == 0 {
            return Err(Error::InvalidChunkSize);
        }

        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // Allow varying number of fields
            .from_reader(reader);

        let headers = csv_reader.headers().map_err(|e| Error::Csv {
            path: path.clone(),
            source: e,
        })?;

        let columns = header_columns(headers.iter().map(str::to_string));

        if columns.is_empty() {
            return Err(Error::CsvParse {
                path,
                message: "no columns found in CSV".to_string(),
            });
        }

        Ok(Self {
            reader: csv_reader,
            columns,
            chunk_rows,
            rows_read: 0,
            path,
        })
    }

    /// Header shared by every chunk
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Path the rows come from
    pub fn source_path(&self) -> &Path {
        &self.path
    }

    /// Read the next chunk, or `None` once the input is exhausted
    pub fn next_chunk(&mut self) -> Result<Option<Table>> {
        let mut rows = Vec::new();
        let mut record = csv::StringRecord::new();

        while rows.len() < self.chunk_rows {
            let more = self.reader.read_record(&mut record).map_err(|e| Error::Csv {
                path: self.path.clone(),
                source: e,
            })?;
            if !more {
                break;
            }
            self.rows_read += 1;
            let cells = record.iter().map(CellValue::parse).collect();
            rows.push(fit_row(cells, self.columns.len(), self.rows_read, &self.path));
        }

        if rows.is_empty() {
            return Ok(None);
        }

        Ok(Some(Table {
            columns: self.columns.clone(),
            rows,
            source_path: self.path.clone(),
        }))
    }

    /// Read every row not yet consumed into one table
    pub fn read_remaining(mut self) -> Result<Table> {
        let mut table = Table {
            columns: self.columns.clone(),
            rows: Vec::new(),
            source_path: self.path.clone(),
        };
        while let Some(chunk) = self.next_chunk()? {
            table.rows.extend(chunk.rows);
        }
        Ok(table)
    }
}

/// Build columns from raw header names.
///
/// Blank names become `Unnamed: N` and repeats get `.1`, `.2`, ... so every
/// column name in a table is unique.
fn header_columns<I: IntoIterator<Item = String>>(names: I) -> Vec<Column> {
    let mut columns: Vec<Column> = Vec::new();
    let mut repeats: HashMap<String, usize> = HashMap::new();

    for (i, raw) in names.into_iter().enumerate() {
        let base = if raw.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            raw
        };

        let mut name = base.clone();
        while columns.iter().any(|c| c.name == name) {
            let count = repeats.entry(base.clone()).or_insert(0);
            *count += 1;
            name = format!("{}.{}", base, count);
        }
        columns.push(Column::new(name, i));
    }
    columns
}

/// Pad short rows with empty cells and truncate long ones
fn fit_row(mut cells: Vec<CellValue>, width: usize, row_number: usize, path: &Path) -> Row {
    if cells.len() > width {
        warn!(
            "row {} in {} has more cells than columns, truncating",
            row_number,
            path.display()
        );
        cells.truncate(width);
    }
    cells.resize(width, CellValue::Empty);
    Row::new(cells)
}

/// Parse the first worksheet of an XLSX workbook; the first row is the header
pub fn parse_xlsx<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let xlsx_error = |message: String| Error::Xlsx {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|e: XlsxError| xlsx_error(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| xlsx_error("workbook has no worksheets".to_string()))?
        .map_err(|e| xlsx_error(e.to_string()))?;

    let mut sheet_rows = range.rows();
    let header = sheet_rows
        .next()
        .ok_or_else(|| xlsx_error("no columns found in worksheet".to_string()))?;

    let columns = header_columns(header.iter().map(|cell| xlsx_cell(cell).to_string_value()));

    let rows = sheet_rows
        .enumerate()
        .map(|(i, cells)| fit_row(cells.iter().map(xlsx_cell).collect(), columns.len(), i + 1, path))
        .collect();

    Ok(Table {
        columns,
        rows,
        source_path: path.to_path_buf(),
    })
}

fn xlsx_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::String(s) if s.trim().is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::String(s.clone()),
        Data::DateTime(dt) => excel_serial_to_string(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        _ => CellValue::Empty,
    }
}

/// Render an Excel serial date (days since 1899-12-30) as `YYYY-MM-DD HH:MM:SS`
fn excel_serial_to_string(serial: f64) -> CellValue {
    let millis = (serial * 86_400_000.0).round() as i64;
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|epoch| epoch.and_hms_opt(0, 0, 0))
        .zip(Duration::try_milliseconds(millis))
        .and_then(|(epoch, offset)| epoch.checked_add_signed(offset))
        .map(|dt| CellValue::String(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
        .unwrap_or(CellValue::Float(serial))
}
