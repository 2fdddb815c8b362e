//! Wide-format normalization of list-shaped payloads.
//!
//! Endpoints shape their JSON in one of a handful of ways: a bare list of objects, an
//! object wrapping a single list, objects carrying one list of sub-records, or objects with
//! nested objects. [`normalize`] infers which applies from the first record and produces a
//! [`Table`] without per-endpoint configuration.

use crate::error::{ApiError, ApiResult};
use crate::table::Table;
use crate::{FlatRecord, Scalar};
use log::debug;
use serde_json::{Map, Value};

/// Explicit record path for payloads the inference cannot handle on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPlan {
    /// Key whose list value supplies the table rows.
    pub record_path: String,
    /// Keys broadcast onto every row produced from the same parent record.
    pub meta: Vec<String>,
}

impl RecordPlan {
    pub fn new(record_path: impl Into<String>, meta: &[&str]) -> Self {
        Self {
            record_path: record_path.into(),
            meta: meta.iter().map(|m| (*m).to_owned()).collect(),
        }
    }
}

/// How the keys of a record classify.
#[derive(Debug, Default, PartialEq, Eq)]
struct KeyKinds<'a> {
    scalars: Vec<&'a str>,
    objects: Vec<&'a str>,
    lists: Vec<&'a str>,
}

impl<'a> KeyKinds<'a> {
    fn of(record: &'a Map<String, Value>) -> Self {
        let mut kinds = KeyKinds::default();
        for (key, value) in record {
            match value {
                Value::Object(_) => kinds.objects.push(key),
                Value::Array(_) => kinds.lists.push(key),
                Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                    kinds.scalars.push(key)
                }
            }
        }
        kinds
    }
}

/// Converts a JSON document into a table, inferring the layout from its first record.
pub fn normalize(doc: &Value) -> ApiResult<Table> {
    let doc = unwrap_single_key(doc)?;
    let records = as_records(doc)?;
    let Some(first) = records.first() else {
        return Ok(Table::default());
    };

    let kinds = KeyKinds::of(first);
    let rows = if let [record_path] = kinds.lists.as_slice() {
        debug!("normalizing with record path `{record_path}`");
        expand_records(&records, record_path, &kinds.scalars)?
    } else if !kinds.objects.is_empty() || kinds.lists.len() > 1 {
        debug!("normalizing nested records into dotted columns");
        records.iter().map(|r| flatten_wide(r)).collect()
    } else {
        records.iter().map(|r| read_flat(r)).collect()
    };
    Ok(Table::from_records(rows))
}

/// Converts a JSON document into a table using an explicit record path.
pub fn normalize_with_plan(doc: &Value, plan: &RecordPlan) -> ApiResult<Table> {
    let records = as_records(doc)?;
    let meta: Vec<&str> = plan.meta.iter().map(String::as_str).collect();
    let rows = expand_records(&records, &plan.record_path, &meta)?;
    Ok(Table::from_records(rows))
}

/// Strips `{"key": [...]}` wrappers. A lone key must hold a list.
fn unwrap_single_key(mut doc: &Value) -> ApiResult<&Value> {
    while let Value::Object(map) = doc {
        let mut entries = map.iter();
        let (Some((key, value)), None) = (entries.next(), entries.next()) else {
            break;
        };
        match value {
            Value::Array(_) => {
                debug!("unwrapping single-key object `{key}`");
                doc = value;
            }
            _ => {
                return Err(ApiError::malformed(format!(
                    "single-key object `{key}` must hold a list"
                )));
            }
        }
    }
    Ok(doc)
}

fn as_records(doc: &Value) -> ApiResult<Vec<&Map<String, Value>>> {
    match doc {
        Value::Object(map) => Ok(vec![map]),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                item.as_object().ok_or_else(|| {
                    ApiError::malformed(format!("list element {idx} is not an object"))
                })
            })
            .collect(),
        other => Err(ApiError::malformed(format!(
            "expected an object or a list of objects, found {}",
            kind_name(other)
        ))),
    }
}

/// One row per element of `record_path`, with the `meta` keys of the parent broadcast
/// onto each row.
fn expand_records(
    records: &[&Map<String, Value>],
    record_path: &str,
    meta: &[&str],
) -> ApiResult<Vec<FlatRecord>> {
    let mut rows = Vec::new();
    for record in records {
        let mut broadcast = FlatRecord::new();
        for key in meta {
            match record.get(*key) {
                Some(Value::Object(nested)) => flatten_into(nested, key, &mut broadcast),
                Some(value) => {
                    broadcast.insert((*key).to_owned(), Scalar::lossy(value));
                }
                None => {
                    broadcast.insert((*key).to_owned(), Scalar::Null);
                }
            }
        }

        let items = match record.get(record_path) {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(ApiError::malformed(format!(
                    "record path `{record_path}` holds {}, not a list",
                    kind_name(other)
                )));
            }
            None => {
                return Err(ApiError::malformed(format!(
                    "record path `{record_path}` missing from a record"
                )));
            }
        };
        for item in items {
            let mut row = match item {
                Value::Object(map) => flatten_wide(map),
                leaf => FlatRecord::from([(record_path.to_owned(), Scalar::lossy(leaf))]),
            };
            for (key, value) in &broadcast {
                if row.contains_key(key) {
                    return Err(ApiError::malformed(format!(
                        "record field `{key}` under `{record_path}` conflicts with a broadcast key"
                    )));
                }
                row.insert(key.clone(), value.clone());
            }
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Scalar leaves keyed by dotted path. Lists and empty objects are dropped.
fn flatten_wide(record: &Map<String, Value>) -> FlatRecord {
    let mut row = FlatRecord::new();
    flatten_into(record, "", &mut row);
    row
}

fn flatten_into(record: &Map<String, Value>, prefix: &str, row: &mut FlatRecord) {
    for (key, value) in record {
        let column = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(nested) => flatten_into(nested, &column, row),
            Value::Array(_) => {}
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                row.insert(column, Scalar::lossy(value));
            }
        }
    }
}

/// A record read as-is. Nested values in records after the first are kept as JSON text.
fn read_flat(record: &Map<String, Value>) -> FlatRecord {
    record
        .iter()
        .map(|(key, value)| (key.clone(), Scalar::lossy(value)))
        .collect()
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
