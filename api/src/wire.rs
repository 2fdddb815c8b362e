//! Blue Alliance wire types for the endpoints whose nesting the normalizer cannot infer.
//! The shapers in `shape` turn these into flat records.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Alliances  (/event/{key}/alliances)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct Alliance {
    pub name: Option<String>,
    #[serde(default)]
    pub picks: Vec<String>,
    pub backup: Option<Backup>,
    #[serde(default)]
    pub declines: Vec<Value>,
    pub status: Option<AllianceStatus>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Backup {
    #[serde(rename = "in")]
    pub team_in: Option<String>,
    pub out: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AllianceStatus {
    pub status: Option<String>,
    pub level: Option<String>,
    pub playoff_average: Option<f64>,
    pub current_level_record: Option<WinLossRecord>,
    pub record: Option<WinLossRecord>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
pub struct WinLossRecord {
    pub wins: i64,
    pub losses: i64,
    pub ties: i64,
}

// ---------------------------------------------------------------------------
// Event rankings  (/event/{key}/rankings)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone, Default)]
pub struct EventRankings {
    #[serde(default)]
    pub rankings: Vec<Ranking>,
    #[serde(default)]
    pub sort_order_info: Vec<StatInfo>,
    #[serde(default)]
    pub extra_stats_info: Vec<StatInfo>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatInfo {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Ranking {
    pub record: Option<WinLossRecord>,
    #[serde(default)]
    pub sort_orders: Vec<Value>,
    #[serde(default)]
    pub extra_stats: Vec<Value>,
    /// rank, team_key, matches_played, dq, ...
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// District points  (/event/{key}/district_points)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DistrictPoints {
    #[serde(default)]
    pub points: IndexMap<String, Map<String, Value>>,
    #[serde(default)]
    pub tiebreakers: IndexMap<String, Tiebreaker>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Tiebreaker {
    #[serde(default)]
    pub highest_qual_scores: Vec<Value>,
    pub qual_wins: Option<Value>,
}

// ---------------------------------------------------------------------------
// OPRs  (/event/{key}/oprs): metric -> team -> value
// ---------------------------------------------------------------------------

pub type Oprs = IndexMap<String, IndexMap<String, Value>>;

// ---------------------------------------------------------------------------
// Predictions  (/event/{key}/predictions)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Predictions {
    /// level -> statistic -> value or {sub_statistic: value}; null before a level starts
    pub match_prediction_stats: Option<IndexMap<String, Option<Map<String, Value>>>>,
    /// level -> match key -> prediction
    pub match_predictions: Option<IndexMap<String, Option<IndexMap<String, MatchPrediction>>>>,
    /// [team key, [rank, ..., ..., ..., points, ...]]
    pub ranking_predictions: Option<Vec<(String, Vec<Value>)>>,
    /// level -> statistic -> point -> team -> value
    pub stat_mean_vars: Option<IndexMap<String, Option<StatMeanVars>>>,
}

/// statistic -> point -> team -> value
pub type StatMeanVars = IndexMap<String, IndexMap<String, Map<String, Value>>>;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MatchPrediction {
    #[serde(default)]
    pub red: Map<String, Value>,
    #[serde(default)]
    pub blue: Map<String, Value>,
    pub prob: Option<Value>,
    pub winning_alliance: Option<String>,
}
