//! Long-format flattening of singleton documents such as `/status`.
//!
//! Every leaf of the document becomes one `(label, value)` pair, where the label is the
//! path to the leaf joined with underscores: `{"qual": {"ranking": {"rank": 3}}}` gives
//! `("qual_ranking_rank", 3)`. Empty objects and empty lists are leaves valued `null`.

use crate::Scalar;
use crate::table::FromScalars;
use serde_json::Value;

/// Flattens `value` depth-first in document key order.
///
/// Top-level keys start labels without a separator; an empty top-level document yields
/// nothing. Spaces inside key names are replaced with underscores.
pub fn flatten_scalars(value: &Value) -> Vec<(String, Scalar)> {
    let mut out = Vec::new();
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                visit(label_component(key), child, &mut out);
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                visit(idx.to_string(), child, &mut out);
            }
        }
        leaf => visit(String::new(), leaf, &mut out),
    }
    out
}

/// Flattens `value` and packages the pairs as a [`crate::Table`] or [`crate::Series`].
pub fn flatten_into<T: FromScalars>(value: &Value) -> T {
    T::from_scalars(flatten_scalars(value))
}

fn visit(label: String, value: &Value, out: &mut Vec<(String, Scalar)>) {
    match value {
        Value::Object(map) if map.is_empty() => out.push((label, Scalar::Null)),
        Value::Object(map) => {
            for (key, child) in map {
                visit(format!("{label}_{}", label_component(key)), child, out);
            }
        }
        Value::Array(items) if items.is_empty() => out.push((label, Scalar::Null)),
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                visit(format!("{label}_{idx}"), child, out);
            }
        }
        Value::Null => out.push((label, Scalar::Null)),
        Value::Bool(b) => out.push((label, Scalar::Bool(*b))),
        Value::Number(n) => out.push((label, Scalar::Number(n.clone()))),
        Value::String(s) => out.push((label, Scalar::String(s.clone()))),
    }
}

fn label_component(key: &str) -> String {
    key.replace(' ', "_")
}
