//! Conditional requests: `If-Modified-Since` and the server-side filter header.
//!
//! A request carries at most one of the two headers. A 304 reply has no body, so the
//! transport echoes the conditional header it sent into the response headers and
//! [`NotModified::from_response`] reads it back from there.

use crate::error::{ApiError, ApiResult};
use crate::response::RawResponse;
use crate::table::Table;
use crate::{FlatRecord, Scalar};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// The two conditional headers a request may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalHeader {
    /// Standard conditional GET: 304 with no body when nothing changed.
    ModifiedSince,
    /// Vendor filter: 200 with only the records changed since the timestamp.
    OnlyModifiedSince,
}

impl ConditionalHeader {
    pub const ALL: [ConditionalHeader; 2] = [
        ConditionalHeader::ModifiedSince,
        ConditionalHeader::OnlyModifiedSince,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConditionalHeader::ModifiedSince => "If-Modified-Since",
            ConditionalHeader::OnlyModifiedSince => "FMS-OnlyModifiedSince",
        }
    }
}

/// Freshness condition attached to one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Freshness {
    condition: Option<(ConditionalHeader, String)>,
}

impl Freshness {
    /// No conditional header.
    pub fn always() -> Self {
        Self::default()
    }

    /// Builds the condition from the two optional timestamps.
    ///
    /// Supplying both is a configuration error whatever their values. A supplied timestamp
    /// must be an HTTP date such as `Wed, 30 Aug 2017 06:49:32 GMT`.
    pub fn new(
        modified_since: Option<&str>,
        only_modified_since: Option<&str>,
    ) -> ApiResult<Self> {
        let condition = match (modified_since, only_modified_since) {
            (Some(_), Some(_)) => {
                return Err(ApiError::config(
                    "cannot specify both modified_since and only_modified_since",
                ));
            }
            (Some(ts), None) => Some((ConditionalHeader::ModifiedSince, ts)),
            (None, Some(ts)) => Some((ConditionalHeader::OnlyModifiedSince, ts)),
            (None, None) => None,
        };

        if let Some((header, ts)) = condition {
            parse_http_date(ts).map_err(|_| {
                ApiError::config(format!(
                    "{} value `{ts}` is not an HTTP date (e.g. `Wed, 30 Aug 2017 06:49:32 GMT`)",
                    header.name()
                ))
            })?;
        }

        Ok(Self {
            condition: condition.map(|(header, ts)| (header, ts.to_owned())),
        })
    }

    pub fn modified_since(timestamp: &str) -> ApiResult<Self> {
        Self::new(Some(timestamp), None)
    }

    pub fn only_modified_since(timestamp: &str) -> ApiResult<Self> {
        Self::new(None, Some(timestamp))
    }

    pub fn condition(&self) -> Option<(ConditionalHeader, &str)> {
        self.condition
            .as_ref()
            .map(|(header, ts)| (*header, ts.as_str()))
    }

    /// Request headers implementing the condition; empty when unconditional.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        self.condition
            .iter()
            .map(|(header, ts)| (header.name(), ts.clone()))
            .collect()
    }
}

/// Result of a 304 reply: which condition fired and the timestamp it carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotModified {
    pub header: ConditionalHeader,
    pub timestamp: String,
}

impl NotModified {
    /// Attributes a 304 response to exactly one echoed conditional header.
    pub fn from_response(response: &RawResponse) -> ApiResult<Self> {
        if response.status_code != 304 {
            return Err(ApiError::InconsistentState(format!(
                "expected status 304 from {}, got {}",
                response.url, response.status_code
            )));
        }

        let echoed: Vec<(ConditionalHeader, &str)> = ConditionalHeader::ALL
            .into_iter()
            .filter_map(|h| response.header(h.name()).map(|ts| (h, ts)))
            .collect();

        match echoed.as_slice() {
            [(header, timestamp)] => Ok(NotModified {
                header: *header,
                timestamp: (*timestamp).to_owned(),
            }),
            [] => Err(ApiError::InconsistentState(format!(
                "304 from {} carries no conditional header",
                response.url
            ))),
            _ => Err(ApiError::InconsistentState(format!(
                "304 from {} carries both conditional headers",
                response.url
            ))),
        }
    }

    /// Single-row table with one column named after the header that fired.
    pub fn to_table(&self) -> Table {
        Table::from_records(vec![FlatRecord::from([(
            self.header.name().to_owned(),
            Scalar::String(self.timestamp.clone()),
        )])])
    }
}

pub fn parse_http_date(text: &str) -> ApiResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, HTTP_DATE_FORMAT)
        .map(|dt| dt.and_utc())
        .map_err(|e| ApiError::config(format!("invalid HTTP date `{text}`: {e}")))
}

pub fn format_http_date(dt: DateTime<Utc>) -> String {
    dt.format(HTTP_DATE_FORMAT).to_string()
}

/// Shifts an HTTP date by `secs` seconds. One second past `Last-Modified` is the usual
/// value for a follow-up conditional request.
pub fn http_date_add_secs(text: &str, secs: i64) -> ApiResult<String> {
    let dt = parse_http_date(text)?;
    Ok(format_http_date(dt + TimeDelta::seconds(secs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const STAMP: &str = "Wed, 30 Aug 2017 06:49:32 GMT";

    fn not_modified_reply(headers: Vec<(&'static str, String)>) -> RawResponse {
        RawResponse {
            status_code: 304,
            body: None,
            error_body: None,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect(),
            url: "https://www.thebluealliance.com/api/v3/districts/2017".into(),
            fetched_at: Utc::now(),
            request_descriptor: vec!["districts".into(), "2017".into()],
        }
    }

    #[test]
    fn both_timestamps_are_rejected_whatever_their_values() {
        for (a, b) in [(STAMP, STAMP), ("garbage", STAMP), ("", "")] {
            assert!(matches!(
                Freshness::new(Some(a), Some(b)),
                Err(ApiError::Configuration(_))
            ));
        }
    }

    #[test]
    fn invalid_date_is_a_configuration_error() {
        assert!(matches!(
            Freshness::modified_since("2017-08-30"),
            Err(ApiError::Configuration(_))
        ));
    }

    #[test]
    fn each_timestamp_maps_to_its_header() {
        let ms = Freshness::modified_since(STAMP).unwrap();
        assert_eq!(ms.headers(), vec![("If-Modified-Since", STAMP.to_owned())]);

        let oms = Freshness::only_modified_since(STAMP).unwrap();
        assert_eq!(oms.headers(), vec![("FMS-OnlyModifiedSince", STAMP.to_owned())]);

        assert!(Freshness::always().headers().is_empty());
    }

    #[test]
    fn timestamp_round_trips_through_a_not_modified_reply() {
        for freshness in [
            Freshness::modified_since(STAMP).unwrap(),
            Freshness::only_modified_since(STAMP).unwrap(),
        ] {
            let reply = not_modified_reply(freshness.headers());
            let nm = NotModified::from_response(&reply).unwrap();
            assert_eq!(nm.timestamp, STAMP);
            assert_eq!(Some(nm.header), freshness.condition().map(|(h, _)| h));
        }
    }

    #[test]
    fn echoed_header_lookup_ignores_case() {
        let reply = not_modified_reply(vec![("if-modified-since", STAMP.to_owned())]);
        let nm = NotModified::from_response(&reply).unwrap();
        assert_eq!(nm.header, ConditionalHeader::ModifiedSince);
    }

    #[test]
    fn unattributable_reply_is_inconsistent() {
        let none = not_modified_reply(vec![]);
        assert!(matches!(
            NotModified::from_response(&none),
            Err(ApiError::InconsistentState(_))
        ));

        let both = not_modified_reply(vec![
            ("If-Modified-Since", STAMP.to_owned()),
            ("FMS-OnlyModifiedSince", STAMP.to_owned()),
        ]);
        assert!(matches!(
            NotModified::from_response(&both),
            Err(ApiError::InconsistentState(_))
        ));
    }

    #[test]
    fn not_modified_table_names_the_fired_header() {
        let nm = NotModified {
            header: ConditionalHeader::OnlyModifiedSince,
            timestamp: STAMP.into(),
        };
        let table = nm.to_table();
        assert_eq!(table.columns(), ["FMS-OnlyModifiedSince"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.value(0, "FMS-OnlyModifiedSince"), &Scalar::from(STAMP));
    }

    #[test]
    fn http_dates_parse_format_and_shift() {
        let dt = parse_http_date(STAMP).unwrap();
        assert_eq!(dt.hour(), 6);
        assert_eq!(dt.month(), 8);
        assert_eq!(format_http_date(dt), STAMP);
        assert_eq!(
            http_date_add_secs(STAMP, 1).unwrap(),
            "Wed, 30 Aug 2017 06:49:33 GMT"
        );
    }
}
