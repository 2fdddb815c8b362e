use crate::error::{ApiError, ApiResult};
use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.thebluealliance.com/api/v3";
const USER_AGENT: &str = concat!("tbap/", env!("CARGO_PKG_VERSION"));

/// What fetch functions return for a successful response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataFormat {
    /// Shaped tables.
    #[default]
    Table,
    /// Raw JSON text.
    Json,
    /// Raw XML text, passed through unparsed.
    Xml,
}

impl DataFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            DataFormat::Table => "table",
            DataFormat::Json => "json",
            DataFormat::Xml => "xml",
        }
    }

    pub(crate) fn accept_header(self) -> &'static str {
        match self {
            DataFormat::Xml => "application/xml",
            DataFormat::Table | DataFormat::Json => "application/json",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataFormat {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" | "dataframe" => Ok(DataFormat::Table),
            "json" => Ok(DataFormat::Json),
            "xml" => Ok(DataFormat::Xml),
            other => Err(ApiError::config(format!(
                "data format must be 'table', 'json' or 'xml', got '{other}'"
            ))),
        }
    }
}

/// Zone in which match timestamps are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// IANA zone such as `America/Los_Angeles`, with daylight saving rules.
    Named(Tz),
    /// Fixed offset such as `+05:30`.
    Fixed(FixedOffset),
}

impl Zone {
    /// `YYYY-MM-DD HH:MM:SS` wall-clock time of `instant` in this zone.
    pub fn wall_clock(&self, instant: DateTime<Utc>) -> String {
        const FORMAT: &str = "%Y-%m-%d %H:%M:%S";
        match self {
            Zone::Named(tz) => instant.with_timezone(tz).format(FORMAT).to_string(),
            Zone::Fixed(offset) => instant.with_timezone(offset).format(FORMAT).to_string(),
        }
    }
}

impl Default for Zone {
    fn default() -> Self {
        Zone::Named(Tz::UTC)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Named(tz) => write!(f, "{tz}"),
            Zone::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

impl FromStr for Zone {
    type Err = ApiError;

    /// An IANA zone name, or an offset like `+05:30`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if let Ok(tz) = text.parse::<Tz>() {
            return Ok(Zone::Named(tz));
        }
        text.parse::<FixedOffset>().map(Zone::Fixed).map_err(|_| {
            ApiError::config(format!(
                "'{text}' is neither a time zone like America/Chicago nor an offset like +05:30"
            ))
        })
    }
}

/// Read-only settings shared by every request of a client.
#[derive(Debug, Clone)]
pub struct Session {
    auth_key: String,
    base_url: String,
    format: DataFormat,
    zone: Zone,
    timeout: Duration,
}

impl Session {
    pub fn new(auth_key: impl Into<String>) -> Self {
        Self {
            auth_key: auth_key.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            format: DataFormat::default(),
            zone: Zone::default(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Reads the session from the process environment.
    ///
    /// `TBA_AUTH_KEY` is required. `TBAP_BASE_URL`, `TBAP_FORMAT`, `TBAP_TIME_ZONE` and
    /// `TBAP_TIMEOUT_SECS` override the defaults.
    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`Session::from_env`], reading each variable through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ApiResult<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let auth_key = var("TBA_AUTH_KEY")
            .ok_or_else(|| ApiError::config("TBA_AUTH_KEY is not set"))?;
        let mut session = Session::new(auth_key);

        if let Some(url) = var("TBAP_BASE_URL") {
            session = session.with_base_url(url);
        }
        if let Some(format) = var("TBAP_FORMAT") {
            session = session.with_format(format.parse()?);
        }
        if let Some(zone) = var("TBAP_TIME_ZONE") {
            session = session.with_zone(zone.parse()?);
        }
        if let Some(secs) = var("TBAP_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ApiError::config(format!("TBAP_TIMEOUT_SECS must be whole seconds, got '{secs}'"))
            })?;
            session = session.with_timeout(Duration::from_secs(secs));
        }
        Ok(session)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_format(mut self, format: DataFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.zone = zone;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn auth_key(&self) -> &str {
        &self.auth_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn format(&self) -> DataFormat {
        self.format
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn user_agent(&self) -> &'static str {
        USER_AGENT
    }

    /// `base_url` followed by each descriptor segment.
    pub fn url_for(&self, descriptor: &[String]) -> String {
        let mut url = self.base_url.clone();
        for segment in descriptor {
            url.push('/');
            url.push_str(segment);
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let session = Session::new("key");
        assert_eq!(session.format(), DataFormat::Table);
        assert_eq!(session.base_url(), DEFAULT_BASE_URL);
        assert_eq!(session.zone(), Zone::Named(Tz::UTC));
    }

    #[test]
    fn environment_overrides_defaults() {
        let session = Session::from_lookup(lookup(&[
            ("TBA_AUTH_KEY", "secret"),
            ("TBAP_BASE_URL", "http://localhost:1234/"),
            ("TBAP_FORMAT", "XML"),
            ("TBAP_TIME_ZONE", "America/Los_Angeles"),
            ("TBAP_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        assert_eq!(session.auth_key(), "secret");
        assert_eq!(session.base_url(), "http://localhost:1234");
        assert_eq!(session.format(), DataFormat::Xml);
        assert_eq!(session.zone(), Zone::Named(Tz::America__Los_Angeles));
        assert_eq!(session.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn missing_key_and_bad_values_are_configuration_errors() {
        assert!(matches!(
            Session::from_lookup(lookup(&[])),
            Err(ApiError::Configuration(_))
        ));
        assert!(matches!(
            Session::from_lookup(lookup(&[("TBA_AUTH_KEY", "k"), ("TBAP_FORMAT", "yaml")])),
            Err(ApiError::Configuration(_))
        ));
        assert!(matches!(
            Session::from_lookup(lookup(&[("TBA_AUTH_KEY", "k"), ("TBAP_TIMEOUT_SECS", "soon")])),
            Err(ApiError::Configuration(_))
        ));
    }

    #[test]
    fn zones_by_name_or_offset() {
        assert_eq!("UTC".parse::<Zone>().unwrap(), Zone::Named(Tz::UTC));
        assert_eq!(
            " America/Chicago ".parse::<Zone>().unwrap(),
            Zone::Named(Tz::America__Chicago)
        );
        let Zone::Fixed(offset) = "+05:30".parse::<Zone>().unwrap() else {
            panic!("expected a fixed offset");
        };
        assert_eq!(offset.local_minus_utc(), 19800);
        assert!(matches!(
            "Mars/Olympus_Mons".parse::<Zone>(),
            Err(ApiError::Configuration(_))
        ));
    }

    #[test]
    fn named_zones_follow_daylight_saving() {
        let pacific: Zone = "America/Los_Angeles".parse().unwrap();
        let april = DateTime::from_timestamp(1_491_062_400, 0).unwrap();
        let january = DateTime::from_timestamp(1_484_496_000, 0).unwrap();
        assert_eq!(pacific.wall_clock(april), "2017-04-01 09:00:00");
        assert_eq!(pacific.wall_clock(january), "2017-01-15 08:00:00");

        let fixed: Zone = "-07:00".parse().unwrap();
        assert_eq!(fixed.wall_clock(january), "2017-01-15 09:00:00");
    }

    #[test]
    fn url_joins_descriptor_segments() {
        let session = Session::new("k").with_base_url("http://host/api/v3");
        let url = session.url_for(&["team".into(), "frc1318".into(), "simple".into()]);
        assert_eq!(url, "http://host/api/v3/team/frc1318/simple");
    }
}
