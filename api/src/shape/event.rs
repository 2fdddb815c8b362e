use super::{decode, indexed, row};
use crate::error::{ApiError, ApiResult};
use crate::table::Table;
use crate::wire::{Alliance, DistrictPoints, EventRankings, Oprs, WinLossRecord};
use crate::{FlatRecord, Scalar};
use serde_json::Value;

/// One row per alliance member (picks, then the backup that came in), indexed by
/// alliance name and team.
pub fn alliances(doc: &Value) -> ApiResult<Table> {
    let alliances: Vec<Alliance> = decode(doc, "alliances")?;
    let mut rows = Vec::new();
    for alliance in &alliances {
        let backup_in = alliance.backup.as_ref().and_then(|b| b.team_in.as_deref());
        for team in alliance.picks.iter().map(String::as_str).chain(backup_in) {
            rows.push(alliance_row(alliance, team));
        }
    }
    indexed(Table::from_records(rows), &["name", "team"])
}

fn alliance_row(alliance: &Alliance, team: &str) -> FlatRecord {
    let backup = match &alliance.backup {
        Some(b) if b.out.as_deref() == Some(team) => Scalar::from("out"),
        Some(b) if b.team_in.as_deref() == Some(team) => Scalar::from("in"),
        _ => Scalar::from(false),
    };
    let status = alliance.status.clone().unwrap_or_default();
    let declines = Value::Array(alliance.declines.clone());

    let mut record = row([
        ("name", alliance.name.clone().into()),
        ("team", team.into()),
        ("backup", backup),
        ("status", status.status.into()),
        ("declines", Scalar::lossy(&declines)),
        ("level", status.level.into()),
        ("playoff_average", status.playoff_average.into()),
    ]);
    extend_record(&mut record, "current_level", status.current_level_record);
    extend_record(&mut record, "overall", status.record);
    record
}

fn extend_record(target: &mut FlatRecord, prefix: &str, record: Option<WinLossRecord>) {
    let fields = [
        ("wins", record.map(|r| r.wins)),
        ("losses", record.map(|r| r.losses)),
        ("ties", record.map(|r| r.ties)),
    ];
    for (field, value) in fields {
        let column = if prefix.is_empty() {
            field.to_owned()
        } else {
            format!("{prefix}_{field}")
        };
        target.insert(column, value.into());
    }
}

/// Event insights, one row per level and statistic. List values spread over
/// `value_0`, `value_1`, ... columns.
pub fn insights(doc: &Value) -> ApiResult<Table> {
    let levels = match doc {
        Value::Object(levels) => levels,
        Value::Null => return Ok(Table::default()),
        _ => return Err(ApiError::malformed("insights response is not an object")),
    };

    let mut rows = Vec::new();
    for (level, stats) in levels {
        let stats = match stats {
            Value::Object(stats) => stats,
            Value::Null => continue,
            _ => {
                return Err(ApiError::malformed(format!(
                    "insights level {level} is not an object"
                )));
            }
        };
        for (statistic, value) in stats {
            let mut record = row([
                ("level", level.as_str().into()),
                ("statistic", statistic.as_str().into()),
            ]);
            let values = match value {
                Value::Array(items) => items.as_slice(),
                single => std::slice::from_ref(single),
            };
            for (i, item) in values.iter().enumerate() {
                record.insert(format!("value_{i}"), Scalar::lossy(item));
            }
            rows.push(record);
        }
    }
    indexed(Table::from_records(rows), &["level", "statistic"])
}

/// OPR, DPR and CCWM as one row per team, indexed by team.
pub fn oprs(doc: &Value) -> ApiResult<Table> {
    let metrics: Oprs = decode(doc, "oprs")?;
    let Some(teams) = metrics.get("oprs").or_else(|| metrics.values().next()) else {
        return Ok(Table::default());
    };

    let rows = teams
        .keys()
        .map(|team| {
            let mut record = FlatRecord::from([("team".to_owned(), Scalar::from(team.as_str()))]);
            for (metric, values) in &metrics {
                let value = values.get(team).map(Scalar::lossy).unwrap_or_default();
                record.insert(metric.clone(), value);
            }
            record
        })
        .collect();
    indexed(Table::from_records(rows), &["team"])
}

/// Qualification rankings with sort orders and extra stats named by their info tables.
///
/// Columns lead with `rank`, `team`, `matches_played`, then extra stats, sort orders and
/// the win/loss/tie record; indexed by `rank`.
pub fn event_rankings(doc: &Value) -> ApiResult<Table> {
    let rankings: EventRankings = decode(doc, "event rankings")?;
    let extra_names: Vec<&str> = rankings.extra_stats_info.iter().map(|s| s.name.as_str()).collect();
    let sort_names: Vec<&str> = rankings.sort_order_info.iter().map(|s| s.name.as_str()).collect();

    let mut rows = Vec::new();
    for ranking in &rankings.rankings {
        let mut record = FlatRecord::new();
        for (field, value) in &ranking.fields {
            if !value.is_array() && !value.is_object() {
                record.insert(field.clone(), Scalar::lossy(value));
            }
        }
        extend_record(&mut record, "", ranking.record);
        for (name, value) in sort_names.iter().zip(&ranking.sort_orders) {
            record.insert((*name).to_owned(), Scalar::lossy(value));
        }
        for (name, value) in extra_names.iter().zip(&ranking.extra_stats) {
            record.insert((*name).to_owned(), Scalar::lossy(value));
        }
        rows.push(record);
    }

    let mut table = Table::from_records(rows);
    table.rename_column("team_key", "team")?;

    let mut leading = vec!["rank", "team", "matches_played"];
    leading.extend(&extra_names);
    leading.extend(&sort_names);
    leading.extend(["wins", "losses", "ties"]);
    indexed(table.reorder(&leading), &["rank"])
}

/// District points earned at one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistrictPointTables {
    /// One row per team with each point category, indexed by team.
    pub points: Table,
    /// One row per team per qualification high score, ranked, indexed by team.
    pub high_scores: Table,
}

pub fn district_points(doc: &Value) -> ApiResult<DistrictPointTables> {
    let district: DistrictPoints = decode(doc, "district points")?;

    let points = district
        .points
        .iter()
        .map(|(team, fields)| {
            let mut record = FlatRecord::from([("team".to_owned(), Scalar::from(team.as_str()))]);
            for (field, value) in fields {
                record.insert(field.clone(), Scalar::lossy(value));
            }
            record
        })
        .collect();

    let mut high_scores = Vec::new();
    for (team, tiebreaker) in &district.tiebreakers {
        let qual_wins = tiebreaker.qual_wins.as_ref().map(Scalar::lossy).unwrap_or_default();
        for (rank, score) in (1i64..).zip(&tiebreaker.highest_qual_scores) {
            high_scores.push(row([
                ("team", team.as_str().into()),
                ("highest_qual_score", Scalar::lossy(score)),
                ("score_rank", rank.into()),
                ("qual_wins", qual_wins.clone()),
            ]));
        }
    }

    Ok(DistrictPointTables {
        points: indexed(Table::from_records(points), &["team"])?,
        high_scores: indexed(Table::from_records(high_scores), &["team"])?,
    })
}
