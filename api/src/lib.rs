//! Client for The Blue Alliance read API that reshapes its JSON payloads into tables.
//!
//! Every fetch returns a [`Fetched`] value: a shaped result bound to the response
//! metadata, a synthetic "not modified" table, or the raw response when the session asks
//! for text output or the server answered with an unexpected status.

pub mod client;
pub mod error;
pub mod flatten;
pub mod freshness;
pub mod normalize;
pub mod query;
pub mod response;
pub mod session;
pub mod shape;
pub mod table;
mod wire;

pub use client::TbaClient;
pub use error::{ApiError, ApiResult};
pub use freshness::{ConditionalHeader, Freshness, NotModified};
pub use query::{
    AwardsQuery, Detail, DistrictsQuery, EventsQuery, MatchesQuery, TeamDetail, TeamsQuery,
};
pub use response::{Fetched, Frame, RawResponse, TableMetadata};
pub use session::{DataFormat, Session, Zone};
pub use shape::{DistrictPointTables, PredictionTables};
pub use table::{FromScalars, Series, Table};

use indexmap::IndexMap;
use serde_json::{Number, Value};
use std::fmt;

/// One table row: column name to cell value, in insertion order.
pub type FlatRecord = IndexMap<String, Scalar>;

/// A single table cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Scalar {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Scalar {
    /// Converts a JSON leaf. Arrays and objects are not leaves and give `None`.
    pub fn from_leaf(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Scalar::Null),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => Some(Scalar::Number(n.clone())),
            Value::String(s) => Some(Scalar::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Like [`Scalar::from_leaf`], but nested values are kept as compact JSON text.
    pub fn lossy(value: &Value) -> Self {
        Self::from_leaf(value).unwrap_or_else(|| Scalar::String(value.to_string()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => n.as_f64(),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n.into())
    }
}

impl From<u64> for Scalar {
    fn from(n: u64) -> Self {
        Scalar::Number(n.into())
    }
}

impl From<f64> for Scalar {
    /// NaN and infinities have no JSON representation and become `Null`.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map(Scalar::Number).unwrap_or_default()
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}
