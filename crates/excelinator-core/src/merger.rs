//! Left-join merge of selected partner columns onto origin rows
//!
//! The partner is projected down to its key plus the requested columns,
//! deduplicated by key (first row wins), and the copied columns are renamed
//! away from any origin column they collide with. The join never changes
//! the origin row count.

use crate::error::{Dataset, Error, Result};
use crate::key::KeyValue;
use crate::namer::resolve_column_name;
use crate::table::{CellValue, Column, Row, Table};
use log::debug;
use std::collections::{HashMap, HashSet};

/// Copy `copy_columns` from `partner` onto `origin` by left join on the keys.
///
/// Every origin row is kept in order. Rows without a partner match get
/// `Empty` in every copied column. The partner key column itself is not
/// part of the output unless it is listed in `copy_columns`.
pub fn merge_datasets(
    origin: &Table,
    partner: &Table,
    origin_key: &str,
    partner_key: &str,
    copy_columns: &[String],
) -> Result<Table> {
    let origin_idx = origin
        .column_index(origin_key)
        .ok_or_else(|| Error::InvalidKeyColumn {
            dataset: Dataset::Origin,
            key: origin_key.to_string(),
        })?;

    // Copy-columns are idempotent: each name copied once
    let mut copy_list: Vec<&str> = Vec::with_capacity(copy_columns.len());
    for column in copy_columns {
        if !copy_list.contains(&column.as_str()) {
            copy_list.push(column);
        }
    }

    let mut needed = copy_list.clone();
    if !needed.contains(&partner_key) {
        needed.push(partner_key);
    }

    let missing: Vec<String> = needed
        .iter()
        .filter(|name| partner.find_column(name).is_none())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingPartnerColumns { columns: missing });
    }

    let reduced = dedup_by_key(&project(partner, &needed), partner_key);

    // Rename in request order, feeding each result forward
    let mut taken: Vec<String> = origin.columns.iter().map(|c| c.name.clone()).collect();
    let mut renames: HashMap<&str, String> = HashMap::new();
    for column in &copy_list {
        let resolved = resolve_column_name(column, &taken);
        taken.push(resolved.clone());
        renames.insert(*column, resolved);
    }

    let key_idx = reduced
        .column_index(partner_key)
        .ok_or_else(|| Error::InvalidKeyColumn {
            dataset: Dataset::Partner,
            key: partner_key.to_string(),
        })?;
    let lookup: HashMap<KeyValue, usize> = reduced
        .column_values(key_idx)
        .enumerate()
        .map(|(row_idx, value)| (KeyValue::from(value), row_idx))
        .collect();

    let matched: Vec<Option<usize>> = origin
        .column_values(origin_idx)
        .map(|value| lookup.get(&KeyValue::from(value)).copied())
        .collect();

    let mut result = origin.clone();
    for column in &reduced.columns {
        let Some(new_name) = renames.get(column.name.as_str()) else {
            continue;
        };
        let values = matched
            .iter()
            .map(|hit| match hit {
                Some(row_idx) => reduced.rows[*row_idx].cells[column.index].clone(),
                None => CellValue::Empty,
            })
            .collect();
        result.push_column(new_name.clone(), values);
    }

    debug!(
        "merged {} of {} rows with {} partner columns",
        matched.iter().filter(|hit| hit.is_some()).count(),
        result.row_count(),
        renames.len()
    );

    Ok(result)
}

/// Keep only the named columns, in the table's own column order
pub fn project<S: AsRef<str>>(table: &Table, keep: &[S]) -> Table {
    let kept: Vec<&Column> = table
        .columns
        .iter()
        .filter(|c| keep.iter().any(|k| k.as_ref() == c.name))
        .collect();

    let columns = kept
        .iter()
        .enumerate()
        .map(|(i, c)| Column::new(c.name.clone(), i))
        .collect();
    let rows = table
        .rows
        .iter()
        .map(|row| {
            Row::new(
                kept.iter()
                    .map(|c| row.get(c.index).cloned().unwrap_or(CellValue::Empty))
                    .collect(),
            )
        })
        .collect();

    Table {
        columns,
        rows,
        source_path: table.source_path.clone(),
    }
}

/// Drop rows whose `key` value already appeared higher up
pub fn dedup_by_key(table: &Table, key: &str) -> Table {
    let Some(key_idx) = table.column_index(key) else {
        return table.clone();
    };

    let mut seen: HashSet<KeyValue> = HashSet::new();
    let mut deduped = table.empty_like();
    for row in &table.rows {
        let value = row.get(key_idx).map(KeyValue::from).unwrap_or(KeyValue::Empty);
        if seen.insert(value) {
            deduped.rows.push(row.clone());
        }
    }

    if deduped.row_count() < table.row_count() {
        debug!(
            "dropped {} partner rows with repeated key '{}'",
            table.row_count() - deduped.row_count(),
            key
        );
    }
    deduped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse_csv_str;

    fn copy(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn column(table: &Table, name: &str) -> Vec<String> {
        let idx = table.column_index(name).unwrap();
        table.column_values(idx).map(|c| c.to_string_value()).collect()
    }

    #[test]
    fn test_merge_copies_matching_values() {
        let origin = parse_csv_str("id,v\n1,a\n2,b\n3,c\n", "o.csv").unwrap();
        let partner = parse_csv_str("key,email,phone\n2,b@x,22\n3,c@x,33\n4,d@x,44\n", "p.csv").unwrap();

        let result = merge_datasets(&origin, &partner, "id", "key", &copy(&["email"])).unwrap();

        assert_eq!(result.column_names(), vec!["id", "v", "email"]);
        assert_eq!(column(&result, "email"), vec!["", "b@x", "c@x"]);
        assert!(result.rows[0].cells[2].is_empty());
    }

    #[test]
    fn test_merge_dedups_and_renames_collision() {
        let origin = parse_csv_str("id,name\n1,orig\n", "o.csv").unwrap();
        let partner = parse_csv_str("key,name\n1,first\n1,second\n", "p.csv").unwrap();

        let result = merge_datasets(&origin, &partner, "id", "key", &copy(&["name"])).unwrap();

        assert_eq!(result.row_count(), 1);
        assert_eq!(result.column_names(), vec!["id", "name", "name_2"]);
        assert_eq!(column(&result, "name_2"), vec!["first"]);
        assert_eq!(column(&result, "name"), vec!["orig"]);
    }

    #[test]
    fn test_merge_never_fans_out() {
        let origin = parse_csv_str("id\n1\n2\n1\n", "o.csv").unwrap();
        let partner = parse_csv_str("key,x\n1,a\n1,b\n2,c\n2,d\n", "p.csv").unwrap();

        let result = merge_datasets(&origin, &partner, "id", "key", &copy(&["x"])).unwrap();

        assert_eq!(result.row_count(), 3);
        assert_eq!(column(&result, "x"), vec!["a", "c", "a"]);
    }

    #[test]
    fn test_merge_reports_every_missing_column() {
        let origin = parse_csv_str("id\n1\n", "o.csv").unwrap();
        let partner = parse_csv_str("key,x\n1,a\n", "p.csv").unwrap();

        let err = merge_datasets(&origin, &partner, "id", "nokey", &copy(&["x", "y", "z"])).unwrap_err();

        match err {
            Error::MissingPartnerColumns { columns } => {
                assert_eq!(columns, vec!["y", "z", "nokey"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_merge_output_follows_partner_column_order() {
        let origin = parse_csv_str("id\n1\n", "o.csv").unwrap();
        let partner = parse_csv_str("a,key,b\nA,1,B\n", "p.csv").unwrap();

        let result = merge_datasets(&origin, &partner, "id", "key", &copy(&["b", "a"])).unwrap();

        assert_eq!(result.column_names(), vec!["id", "a", "b"]);
    }

    #[test]
    fn test_merge_duplicate_copy_columns_copied_once() {
        let origin = parse_csv_str("id\n1\n", "o.csv").unwrap();
        let partner = parse_csv_str("key,x\n1,a\n", "p.csv").unwrap();

        let result = merge_datasets(&origin, &partner, "id", "key", &copy(&["x", "x"])).unwrap();

        assert_eq!(result.column_names(), vec!["id", "x"]);
    }

    #[test]
    fn test_merge_colliding_names_get_distinct_suffixes() {
        // "name" collides with origin and takes name_2; the partner's own
        // "name_2" must then move on to name_2_2.
        let origin = parse_csv_str("id,name\n1,o\n", "o.csv").unwrap();
        let partner = parse_csv_str("key,name,name_2\n1,p,q\n", "p.csv").unwrap();

        let result = merge_datasets(&origin, &partner, "id", "key", &copy(&["name", "name_2"])).unwrap();

        assert_eq!(result.column_names(), vec!["id", "name", "name_2", "name_2_2"]);
        assert_eq!(column(&result, "name_2"), vec!["p"]);
        assert_eq!(column(&result, "name_2_2"), vec!["q"]);
    }

    #[test]
    fn test_merge_partner_key_as_copy_column() {
        let origin = parse_csv_str("id\n1\n2\n", "o.csv").unwrap();
        let partner = parse_csv_str("key\n1\n", "p.csv").unwrap();

        let result = merge_datasets(&origin, &partner, "id", "key", &copy(&["key"])).unwrap();

        assert_eq!(result.column_names(), vec!["id", "key"]);
        assert_eq!(column(&result, "key"), vec!["1", ""]);
    }

    #[test]
    fn test_merge_same_key_name_not_renamed_or_kept() {
        let origin = parse_csv_str("id,x\n1,o\n", "o.csv").unwrap();
        let partner = parse_csv_str("id,x\n1,p\n", "p.csv").unwrap();

        let result = merge_datasets(&origin, &partner, "id", "id", &copy(&["x"])).unwrap();

        assert_eq!(result.column_names(), vec!["id", "x", "x_2"]);
    }

    #[test]
    fn test_merge_repeated_partner_header_copies_first_column() {
        let origin = parse_csv_str("id\n1\n", "o.csv").unwrap();
        let partner = parse_csv_str("key,x,x\n1,a,b\n", "p.csv").unwrap();

        let result = merge_datasets(&origin, &partner, "id", "key", &copy(&["x"])).unwrap();

        assert_eq!(result.column_names(), vec!["id", "x"]);
        assert_eq!(column(&result, "x"), vec!["a"]);
    }

    #[test]
    fn test_project_keeps_table_order() {
        let table = parse_csv_str("a,b,c\n1,2,3\n", "t.csv").unwrap();
        let projected = project(&table, &["c", "a"]);

        assert_eq!(projected.column_names(), vec!["a", "c"]);
        assert_eq!(projected.rows[0].cells, vec![CellValue::Integer(1), CellValue::Integer(3)]);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let table = parse_csv_str("k,v\n1,a\n2,b\n1,c\n", "t.csv").unwrap();
        let deduped = dedup_by_key(&table, "k");

        assert_eq!(deduped.row_count(), 2);
        assert_eq!(column(&deduped, "v"), vec!["a", "b"]);
    }
}
