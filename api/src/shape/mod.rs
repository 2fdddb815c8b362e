//! Shaping for endpoints whose nesting goes beyond the patterns [`crate::normalize`]
//! infers: matches nest teams inside alliances inside score breakdowns, rankings carry
//! positional stats named by a side table, and so on. Each shaper pre-extracts flat records
//! and hands them to [`Table::from_records`].

mod event;
mod matches;
mod predictions;
mod status;

pub use event::{DistrictPointTables, alliances, district_points, event_rankings, insights, oprs};
pub use matches::matches;
pub use predictions::{PredictionTables, predictions};
pub use status::event_team_status;

use crate::error::{ApiError, ApiResult};
use crate::table::Table;
use crate::{FlatRecord, Scalar};
use crate::session::Zone;
use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// `keys` responses: a list of strings as a one-column `key` table.
pub fn keys(doc: &Value) -> ApiResult<Table> {
    single_column(doc, "key")
}

/// A list of scalars as a one-column table indexed by that column.
pub fn single_column(doc: &Value, column: &str) -> ApiResult<Table> {
    let items = doc
        .as_array()
        .ok_or_else(|| ApiError::malformed(format!("expected a list of {column} values")))?;
    let rows = items
        .iter()
        .map(|item| FlatRecord::from([(column.to_owned(), Scalar::lossy(item))]))
        .collect();
    indexed(Table::from_records(rows), &[column])
}

fn decode<T: DeserializeOwned + Default>(doc: &Value, what: &str) -> ApiResult<T> {
    if doc.is_null() {
        return Ok(T::default());
    }
    T::deserialize(doc).map_err(|e| ApiError::malformed(format!("{what}: {e}")))
}

/// Sets the index unless the table has no rows (and therefore no columns).
fn indexed(table: Table, columns: &[&str]) -> ApiResult<Table> {
    if table.is_empty() {
        return Ok(table);
    }
    table.with_index(columns)
}

fn row<const N: usize>(pairs: [(&str, Scalar); N]) -> FlatRecord {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect()
}

/// Unix seconds to `YYYY-MM-DD HH:MM:SS` in `zone`. Anything else becomes `Null`.
pub(crate) fn localize_timestamp(value: &Scalar, zone: Zone) -> Scalar {
    value
        .as_i64()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| zone.wall_clock(dt))
        .into()
}
