//! Match marking: tag each origin row by key presence in the partner

use crate::error::{Dataset, Error, Result};
use crate::key::KeyValue;
use crate::options::ReconcileOptions;
use crate::table::{CellValue, Table};
use log::debug;
use std::collections::HashSet;

/// Mark every origin row with the match or mismatch marker.
///
/// Membership is tested against every partner row, duplicates included.
/// The result column is appended, or overwritten in place if it already
/// exists. With `drop_unmatched`, rows whose marker differs from the match
/// marker are removed.
pub fn mark_matches(
    origin: &Table,
    partner: &Table,
    origin_key: &str,
    partner_key: &str,
    options: &ReconcileOptions,
) -> Result<Table> {
    let origin_idx = origin
        .column_index(origin_key)
        .ok_or_else(|| Error::InvalidKeyColumn {
            dataset: Dataset::Origin,
            key: origin_key.to_string(),
        })?;
    let partner_idx = partner
        .column_index(partner_key)
        .ok_or_else(|| Error::InvalidKeyColumn {
            dataset: Dataset::Partner,
            key: partner_key.to_string(),
        })?;

    let partner_keys: HashSet<KeyValue> =
        partner.column_values(partner_idx).map(KeyValue::from).collect();

    let match_cell = CellValue::String(options.match_marker.clone());
    let mismatch_cell = CellValue::String(options.mismatch_marker.clone());

    let markers: Vec<CellValue> = origin
        .column_values(origin_idx)
        .map(|value| {
            if partner_keys.contains(&KeyValue::from(value)) {
                match_cell.clone()
            } else {
                mismatch_cell.clone()
            }
        })
        .collect();

    let mut marked = origin.clone();
    let result_idx = match marked.column_index(&options.result_column) {
        Some(idx) => {
            for (row, marker) in marked.rows.iter_mut().zip(markers) {
                row.cells[idx] = marker;
            }
            idx
        }
        None => {
            marked.push_column(options.result_column.clone(), markers);
            marked.column_count() - 1
        }
    };

    if options.drop_unmatched {
        let before = marked.row_count();
        marked.rows.retain(|row| row.cells[result_idx] == match_cell);
        debug!(
            "dropped {} unmatched rows of {}",
            before - marked.row_count(),
            before
        );
    }

    Ok(marked)
}
