//! Typed requests for the endpoints that accept several argument combinations.
//!
//! Each query turns into a request descriptor (the URL path segments). Combinations the
//! API has no endpoint for are rejected with [`ApiError::Configuration`].

use crate::error::{ApiError, ApiResult};
use std::fmt;
use std::str::FromStr;

/// Response model of list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Detail {
    #[default]
    Full,
    Simple,
    /// A bare list of keys.
    Keys,
}

impl Detail {
    fn suffix(self) -> Option<&'static str> {
        match self {
            Detail::Full => None,
            Detail::Simple => Some("simple"),
            Detail::Keys => Some("keys"),
        }
    }
}

impl FromStr for Detail {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Detail::Full),
            "simple" => Ok(Detail::Simple),
            "keys" => Ok(Detail::Keys),
            other => Err(ApiError::config(format!(
                "detail must be 'full', 'simple' or 'keys', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix().unwrap_or("full"))
    }
}

/// Response model of the single-team endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TeamDetail {
    #[default]
    Full,
    Simple,
    YearsParticipated,
    Robots,
}

impl TeamDetail {
    fn suffix(self) -> Option<&'static str> {
        match self {
            TeamDetail::Full => None,
            TeamDetail::Simple => Some("simple"),
            TeamDetail::YearsParticipated => Some("years_participated"),
            TeamDetail::Robots => Some("robots"),
        }
    }
}

impl FromStr for TeamDetail {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(TeamDetail::Full),
            "simple" => Ok(TeamDetail::Simple),
            "years_participated" => Ok(TeamDetail::YearsParticipated),
            "robots" => Ok(TeamDetail::Robots),
            other => Err(ApiError::config(format!(
                "team detail must be 'full', 'simple', 'years_participated' or 'robots', got '{other}'"
            ))),
        }
    }
}

pub(crate) fn team_descriptor(team: &str, detail: TeamDetail) -> Vec<String> {
    segments(&["team", team], detail.suffix())
}

fn segments(parts: &[&str], suffix: Option<&str>) -> Vec<String> {
    parts
        .iter()
        .copied()
        .chain(suffix)
        .map(str::to_owned)
        .collect()
}

fn incorrect(what: &str) -> ApiError {
    ApiError::config(format!("incorrect arguments for {what}"))
}

/// `teams/{page}`, `teams/{year}/{page}`, `district/{key}/teams` or `event/{key}/teams`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamsQuery {
    pub page: Option<u32>,
    pub year: Option<u16>,
    pub event: Option<String>,
    pub district: Option<String>,
    pub detail: Detail,
}

impl TeamsQuery {
    pub fn page(page: u32) -> Self {
        Self { page: Some(page), ..Self::default() }
    }

    pub fn descriptor(&self) -> ApiResult<Vec<String>> {
        let parts = match (self.page, self.year, self.event.as_deref(), self.district.as_deref()) {
            (Some(page), None, None, None) => vec!["teams".to_owned(), page.to_string()],
            (Some(page), Some(year), None, None) => {
                vec!["teams".to_owned(), year.to_string(), page.to_string()]
            }
            (None, None, None, Some(district)) => {
                vec!["district".to_owned(), district.to_owned(), "teams".to_owned()]
            }
            (None, None, Some(event), None) => {
                vec!["event".to_owned(), event.to_owned(), "teams".to_owned()]
            }
            _ => return Err(incorrect("teams")),
        };
        Ok(with_suffix(parts, self.detail.suffix()))
    }
}

/// `events/{year}`, `district/{key}/events`, `team/{key}/events[/{year}]` or `event/{key}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventsQuery {
    pub year: Option<u16>,
    pub district: Option<String>,
    pub team: Option<String>,
    pub event: Option<String>,
    pub detail: Detail,
}

impl EventsQuery {
    pub fn descriptor(&self) -> ApiResult<Vec<String>> {
        let parts = match (
            self.year,
            self.district.as_deref(),
            self.team.as_deref(),
            self.event.as_deref(),
        ) {
            (Some(year), None, None, None) => vec!["events".to_owned(), year.to_string()],
            (None, Some(district), None, None) => {
                vec!["district".to_owned(), district.to_owned(), "events".to_owned()]
            }
            (None, None, Some(team), None) => {
                vec!["team".to_owned(), team.to_owned(), "events".to_owned()]
            }
            (Some(year), None, Some(team), None) => vec![
                "team".to_owned(),
                team.to_owned(),
                "events".to_owned(),
                year.to_string(),
            ],
            (None, None, None, Some(event)) => {
                if self.detail == Detail::Keys {
                    return Err(ApiError::config("keys detail is not available for a single event"));
                }
                vec!["event".to_owned(), event.to_owned()]
            }
            _ => return Err(incorrect("events")),
        };
        Ok(with_suffix(parts, self.detail.suffix()))
    }
}

/// `event/{key}/matches`, `team/{key}/event/{key}/matches`, `team/{key}/matches/{year}`
/// or `match/{key}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchesQuery {
    pub event: Option<String>,
    pub team: Option<String>,
    pub year: Option<u16>,
    pub match_key: Option<String>,
    pub detail: Detail,
}

impl MatchesQuery {
    pub fn descriptor(&self) -> ApiResult<Vec<String>> {
        let parts = match (
            self.event.as_deref(),
            self.team.as_deref(),
            self.year,
            self.match_key.as_deref(),
        ) {
            (Some(event), None, None, None) => {
                vec!["event".to_owned(), event.to_owned(), "matches".to_owned()]
            }
            (Some(event), Some(team), None, None) => vec![
                "team".to_owned(),
                team.to_owned(),
                "event".to_owned(),
                event.to_owned(),
                "matches".to_owned(),
            ],
            (None, Some(team), Some(year), None) => vec![
                "team".to_owned(),
                team.to_owned(),
                "matches".to_owned(),
                year.to_string(),
            ],
            (None, None, None, Some(key)) => {
                if self.detail == Detail::Keys {
                    return Err(ApiError::config("keys detail is not available for a single match"));
                }
                vec!["match".to_owned(), key.to_owned()]
            }
            _ => return Err(incorrect("matches")),
        };
        Ok(with_suffix(parts, self.detail.suffix()))
    }
}

/// `team/{key}/districts` or `districts/{year}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistrictsQuery {
    pub team: Option<String>,
    pub year: Option<u16>,
}

impl DistrictsQuery {
    pub fn descriptor(&self) -> ApiResult<Vec<String>> {
        match (self.team.as_deref(), self.year) {
            (Some(team), None) => Ok(segments(&["team", team, "districts"], None)),
            (None, Some(year)) => Ok(vec!["districts".to_owned(), year.to_string()]),
            _ => Err(incorrect("districts")),
        }
    }
}

/// `team/{key}/awards[/{year}]` or `team/{key}/event/{key}/awards`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwardsQuery {
    pub team: Option<String>,
    pub event: Option<String>,
    pub year: Option<u16>,
}

impl AwardsQuery {
    pub fn descriptor(&self) -> ApiResult<Vec<String>> {
        match (self.team.as_deref(), self.event.as_deref(), self.year) {
            (Some(team), None, Some(year)) => Ok(vec![
                "team".to_owned(),
                team.to_owned(),
                "awards".to_owned(),
                year.to_string(),
            ]),
            (Some(team), None, None) => Ok(segments(&["team", team, "awards"], None)),
            (Some(team), Some(event), None) => {
                Ok(segments(&["team", team, "event", event, "awards"], None))
            }
            _ => Err(incorrect("awards")),
        }
    }
}

fn with_suffix(mut parts: Vec<String>, suffix: Option<&str>) -> Vec<String> {
    parts.extend(suffix.map(str::to_owned));
    parts
}
