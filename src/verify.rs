//! Verification of split organizer columns.
//!
//! Compares an original CSV, where an organizer blob sits in one JSON column,
//! with a transformed CSV where that blob was split into
//! `<blob>_<subfield>` columns. Checks that no rows were lost or added, that
//! every other shared column is unchanged, and that each split column holds
//! the matching value from the blob.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::coerce::display_string;
use crate::columns::ORGANIZER_FIELDS;
use crate::error::{DashboardError, Result};
use crate::loader::CsvTable;

#[derive(Debug, Clone)]
pub struct VerifyOptions {
    pub id_column: String,
    pub blob_column: String,
    /// Stop collecting after this many diffs
    pub max_diffs: usize,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            id_column: "id".to_string(),
            blob_column: "organizer_primary".to_string(),
            max_diffs: 50,
        }
    }
}

/// One field that differs between the two files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    pub id: String,
    pub field: String,
    pub original: String,
    pub new: String,
}

#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub orig_rows: usize,
    pub new_rows: usize,
    pub orig_cols: usize,
    pub new_cols: usize,
    pub missing_in_new: Vec<String>,
    pub extra_in_new: Vec<String>,
    pub shared_cols_compared: Vec<String>,
    pub new_split_cols: Vec<String>,
    pub seen_blob_keys: BTreeSet<String>,
    /// Rows whose blob carries keys outside the expected sub-fields
    pub unexpected_blob_key_rows: usize,
}

impl Summary {
    /// 0 when clean, 2 on field diffs, 3 when only the id sets differ
    pub fn exit_code(&self, diffs: &[Diff]) -> i32 {
        if !diffs.is_empty() {
            2
        } else if !self.missing_in_new.is_empty() || !self.extra_in_new.is_empty() {
            3
        } else {
            0
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- orig_rows: {}", self.orig_rows)?;
        writeln!(f, "- new_rows: {}", self.new_rows)?;
        writeln!(f, "- orig_cols: {}", self.orig_cols)?;
        writeln!(f, "- new_cols: {}", self.new_cols)?;
        writeln!(f, "- missing_in_new_count: {}", self.missing_in_new.len())?;
        writeln!(f, "- extra_in_new_count: {}", self.extra_in_new.len())?;
        writeln!(f, "- missing_in_new_sample: {:?}", sample(&self.missing_in_new))?;
        writeln!(f, "- extra_in_new_sample: {:?}", sample(&self.extra_in_new))?;
        writeln!(f, "- unexpected_blob_key_rows: {}", self.unexpected_blob_key_rows)?;
        write!(f, "- seen_blob_keys: {:?}", self.seen_blob_keys)
    }
}

fn sample(ids: &[String]) -> &[String] {
    &ids[..ids.len().min(10)]
}

fn index_by_id<'a>(
    table: &'a CsvTable,
    id_column: &str,
    source: &str,
) -> Result<BTreeMap<&'a str, &'a HashMap<String, String>>> {
    let mut out = BTreeMap::new();
    let mut dups = Vec::new();
    for row in &table.rows {
        let id = row.get(id_column).map(String::as_str).unwrap_or("");
        if id.is_empty() {
            return Err(DashboardError::Verify(format!(
                "{source}: row missing '{id_column}'"
            )));
        }
        if out.insert(id, row).is_some() {
            dups.push(id);
        }
    }
    if !dups.is_empty() {
        return Err(DashboardError::Verify(format!(
            "{source}: duplicate ids found (showing up to 10): {:?}",
            &dups[..dups.len().min(10)]
        )));
    }
    Ok(out)
}

/// Decode a blob cell: empty or `null` means absent; single-quoted JSON is
/// retried with double quotes before giving up
fn parse_blob_cell(cell: &str) -> Result<Option<Value>> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    let value: Value = match serde_json::from_str(cell) {
        Ok(value) => value,
        Err(first) => serde_json::from_str(&cell.replace('\'', "\""))
            .map_err(|_| DashboardError::Json(first))?,
    };
    Ok(match value {
        Value::Null => None,
        other => Some(other),
    })
}

fn cell<'a>(row: &'a HashMap<String, String>, column: &str) -> &'a str {
    row.get(column).map(String::as_str).unwrap_or("")
}

/// Compare `orig` against its split counterpart `new`
pub fn compare(
    orig: &CsvTable,
    new: &CsvTable,
    options: &VerifyOptions,
) -> Result<(Summary, Vec<Diff>)> {
    let orig_by_id = index_by_id(orig, &options.id_column, "original")?;
    let new_by_id = index_by_id(new, &options.id_column, "new")?;

    let split_prefix = format!("{}_", options.blob_column);
    let mut summary = Summary {
        orig_rows: orig.rows.len(),
        new_rows: new.rows.len(),
        orig_cols: orig.header.len(),
        new_cols: new.header.len(),
        missing_in_new: orig_by_id
            .keys()
            .filter(|id| !new_by_id.contains_key(*id))
            .map(|id| id.to_string())
            .collect(),
        extra_in_new: new_by_id
            .keys()
            .filter(|id| !orig_by_id.contains_key(*id))
            .map(|id| id.to_string())
            .collect(),
        shared_cols_compared: orig
            .header
            .iter()
            .filter(|c| new.header.contains(c) && **c != options.blob_column)
            .cloned()
            .collect(),
        new_split_cols: new
            .header
            .iter()
            .filter(|c| c.starts_with(&split_prefix))
            .cloned()
            .collect(),
        ..Summary::default()
    };

    let mut diffs = Vec::new();
    let full = |diffs: &Vec<Diff>| diffs.len() >= options.max_diffs;

    'rows: for (id, o) in &orig_by_id {
        let Some(n) = new_by_id.get(id) else {
            continue;
        };

        for column in &summary.shared_cols_compared {
            let (ov, nv) = (cell(o, column), cell(n, column));
            if ov != nv {
                diffs.push(Diff {
                    id: id.to_string(),
                    field: column.clone(),
                    original: ov.to_string(),
                    new: nv.to_string(),
                });
                if full(&diffs) {
                    break 'rows;
                }
            }
        }

        let blob = match parse_blob_cell(cell(o, &options.blob_column))? {
            None => {
                // No blob: any split column present must be empty
                for field in ORGANIZER_FIELDS {
                    let column = format!("{split_prefix}{field}");
                    let nv = cell(n, &column);
                    if n.contains_key(&column) && !nv.is_empty() {
                        diffs.push(Diff {
                            id: id.to_string(),
                            field: column,
                            original: String::new(),
                            new: nv.to_string(),
                        });
                        if full(&diffs) {
                            break 'rows;
                        }
                    }
                }
                continue;
            }
            Some(Value::Object(map)) => map,
            Some(other) => {
                diffs.push(Diff {
                    id: id.to_string(),
                    field: options.blob_column.clone(),
                    original: display_string(Some(&other)),
                    new: "<non-dict blob>".to_string(),
                });
                if full(&diffs) {
                    break 'rows;
                }
                continue;
            }
        };

        summary.seen_blob_keys.extend(blob.keys().cloned());
        if blob.keys().any(|k| !ORGANIZER_FIELDS.contains(&k.as_str())) {
            summary.unexpected_blob_key_rows += 1;
        }

        for field in ORGANIZER_FIELDS {
            let column = format!("{split_prefix}{field}");
            let ov = display_string(blob.get(field));
            let nv = match n.get(&column) {
                Some(v) => v.clone(),
                None => "<missing column>".to_string(),
            };
            if ov != nv {
                diffs.push(Diff {
                    id: id.to_string(),
                    field: column,
                    original: ov,
                    new: nv,
                });
                if full(&diffs) {
                    break 'rows;
                }
            }
        }
    }

    Ok((summary, diffs))
}
