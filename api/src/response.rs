use crate::table::Table;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// What the transport hands back for one request.
///
/// `body` is present exactly when `status_code` is 200. On 304 the conditional header
/// that was sent is echoed into `headers`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status_code: u16,
    pub body: Option<String>,
    /// The service's explanation on statuses other than 200 and 304.
    pub error_body: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    /// Path segments the request URL was built from.
    pub request_descriptor: Vec<String>,
}

impl RawResponse {
    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Everything about a response except its body, bound to one shaped result.
#[derive(Debug, Clone, PartialEq)]
pub struct TableMetadata {
    pub status_code: u16,
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub headers: BTreeMap<String, String>,
    pub request_descriptor: Vec<String>,
}

impl TableMetadata {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn last_modified(&self) -> Option<&str> {
        self.header("Last-Modified")
    }
}

impl From<&RawResponse> for TableMetadata {
    fn from(response: &RawResponse) -> Self {
        Self {
            status_code: response.status_code,
            url: response.url.clone(),
            fetched_at: response.fetched_at,
            headers: response.headers.clone(),
            request_descriptor: response.request_descriptor.clone(),
        }
    }
}

/// A shaped value together with the metadata of the response it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<T = Table> {
    data: T,
    meta: TableMetadata,
}

impl<T> Frame<T> {
    pub fn from_parts(data: T, meta: TableMetadata) -> Self {
        Self { data, meta }
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn metadata(&self) -> &TableMetadata {
        &self.meta
    }

    pub fn into_parts(self) -> (T, TableMetadata) {
        (self.data, self.meta)
    }
}

/// Binds `data` to a copy of every response field except the body.
pub fn attach<T>(data: T, response: &RawResponse) -> Frame<T> {
    Frame { data, meta: TableMetadata::from(response) }
}

/// Outcome of one fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    /// 200 with a body, shaped.
    Shaped(Frame<T>),
    /// 304: a single-row table naming the conditional header and its timestamp.
    NotModified(Frame<Table>),
    /// Text output was requested, or the status was neither 200 nor 304.
    Raw(RawResponse),
}

impl<T> Fetched<T> {
    pub fn shaped(self) -> Option<Frame<T>> {
        match self {
            Fetched::Shaped(frame) => Some(frame),
            _ => None,
        }
    }
}
