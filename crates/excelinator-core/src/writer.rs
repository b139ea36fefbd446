//! Writers for result datasets

use crate::error::{Error, Result};
use crate::table::{CellValue, Table};
use rust_xlsxwriter::{Workbook, XlsxError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Xlsx,
}

/// Path the result is saved to: spreadsheets always end in `.xlsx`
pub fn output_path(path: &Path, format: OutputFormat) -> PathBuf {
    match format {
        OutputFormat::Csv => path.to_path_buf(),
        OutputFormat::Xlsx => {
            if path.extension().is_some_and(|ext| ext == "xlsx") {
                path.to_path_buf()
            } else {
                PathBuf::from(format!("{}.xlsx", path.display()))
            }
        }
    }
}

/// Save a table, returning the path actually written
pub fn save_table(table: &Table, path: &Path, format: OutputFormat) -> Result<PathBuf> {
    let path = output_path(path, format);
    match format {
        OutputFormat::Csv => {
            let file = File::create(&path)?;
            write_csv(table, BufWriter::new(file))?;
        }
        OutputFormat::Xlsx => write_xlsx(table, &path)?,
    }
    Ok(path)
}

/// Write a table as UTF-8 CSV with a header row
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let csv_error = |e: csv::Error| Error::Csv {
        path: table.source_path.clone(),
        source: e,
    };
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);

    csv_writer
        .write_record(table.columns.iter().map(|c| c.name.as_str()))
        .map_err(csv_error)?;
    for row in &table.rows {
        csv_writer
            .write_record(row.cells.iter().map(|c| c.to_string_value()))
            .map_err(csv_error)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write a table to the first worksheet of a new workbook
pub fn write_xlsx(table: &Table, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for column in &table.columns {
        worksheet.write_string(0, xlsx_col(column.index)?, column.name.as_str())?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let xl_row = u32::try_from(row_idx + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col_idx, cell) in row.cells.iter().enumerate() {
            let xl_col = xlsx_col(col_idx)?;
            match cell {
                CellValue::Integer(i) => {
                    worksheet.write_number(xl_row, xl_col, *i as f64)?;
                }
                CellValue::Float(f) => {
                    worksheet.write_number(xl_row, xl_col, *f)?;
                }
                CellValue::Boolean(b) => {
                    worksheet.write_boolean(xl_row, xl_col, *b)?;
                }
                CellValue::String(s) => {
                    worksheet.write_string(xl_row, xl_col, s.as_str())?;
                }
                CellValue::Empty => {}
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

fn xlsx_col(index: usize) -> Result<u16> {
    u16::try_from(index).map_err(|_| Error::XlsxWrite(XlsxError::RowColumnLimitError))
}
