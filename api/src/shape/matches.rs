use super::{indexed, localize_timestamp};
use crate::error::{ApiError, ApiResult};
use crate::session::Zone;
use crate::table::Table;
use crate::{FlatRecord, Scalar};
use serde_json::{Map, Value};

const LEADING: &[&str] = &[
    "key",
    "comp_level",
    "set_number",
    "match_number",
    "predicted_time",
    "team_key",
    "surrogate",
    "alliance",
    "winning_alliance",
    "score",
    "time",
    "actual_time",
    "event_key",
    "videos",
    "post_result_time",
];

const ALLIANCES: [&str; 2] = ["blue", "red"];
const TEAM_LISTS: [(&str, bool); 2] = [("team_keys", false), ("surrogate_team_keys", true)];

/// One row per team per match, indexed by match `key`.
///
/// Rows follow blue teams, blue surrogates, red teams, red surrogates. Each row carries
/// the match's scalar fields, the alliance's score and that alliance's score breakdown.
/// Fields ending in `time` are converted from Unix seconds to local time in `zone`.
pub fn matches(doc: &Value, zone: Zone) -> ApiResult<Table> {
    let matches: Vec<&Map<String, Value>> = match doc {
        Value::Array(items) => items
            .iter()
            .map(|m| {
                m.as_object()
                    .ok_or_else(|| ApiError::malformed("match list holds a non-object"))
            })
            .collect::<ApiResult<_>>()?,
        Value::Object(m) => vec![m],
        Value::Null => Vec::new(),
        _ => return Err(ApiError::malformed("matches response is not a list or object")),
    };

    let mut rows = Vec::new();
    for m in matches {
        rows.extend(match_rows(m)?);
    }

    let mut table = Table::from_records(rows).reorder(LEADING);
    let time_columns: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| c.ends_with("time"))
        .cloned()
        .collect();
    for column in time_columns {
        table.map_column(&column, |v| localize_timestamp(v, zone));
    }
    indexed(table, &["key"])
}

fn match_rows(m: &Map<String, Value>) -> ApiResult<Vec<FlatRecord>> {
    let key = m.get("key").and_then(Value::as_str).unwrap_or("?");
    let alliances = m
        .get("alliances")
        .and_then(Value::as_object)
        .ok_or_else(|| ApiError::malformed(format!("match {key} has no alliances")))?;

    let mut base = FlatRecord::new();
    for (field, value) in m {
        if !value.is_array() && !value.is_object() {
            base.insert(field.clone(), Scalar::lossy(value));
        }
    }
    if let Some(videos) = m.get("videos") {
        base.insert("videos".to_owned(), Scalar::lossy(videos));
    }

    let mut rows = Vec::new();
    for color in ALLIANCES {
        let alliance = alliances
            .get(color)
            .and_then(Value::as_object)
            .ok_or_else(|| ApiError::malformed(format!("match {key} has no {color} alliance")))?;
        let breakdown = m
            .get("score_breakdown")
            .and_then(|b| b.get(color))
            .and_then(Value::as_object);

        for (list, surrogate) in TEAM_LISTS {
            let teams = alliance.get(list).and_then(Value::as_array);
            for team in teams.into_iter().flatten() {
                let mut row = base.clone();
                row.insert("team_key".to_owned(), Scalar::lossy(team));
                row.insert("surrogate".to_owned(), surrogate.into());
                row.insert("alliance".to_owned(), color.into());
                row.insert(
                    "score".to_owned(),
                    alliance.get("score").map(Scalar::lossy).unwrap_or_default(),
                );
                for (stat, value) in breakdown.into_iter().flatten() {
                    row.entry(stat.clone()).or_insert_with(|| Scalar::lossy(value));
                }
                rows.push(row);
            }
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn qm1() -> Value {
        json!({
            "key": "2017wasno_qm1",
            "comp_level": "qm",
            "set_number": 1,
            "match_number": 1,
            "event_key": "2017wasno",
            "winning_alliance": "red",
            "time": 1_491_062_400,
            "actual_time": null,
            "predicted_time": 1_491_062_460,
            "alliances": {
                "blue": {"score": 120, "team_keys": ["frc1", "frc2"], "surrogate_team_keys": ["frc3"]},
                "red": {"score": 150, "team_keys": ["frc4", "frc5", "frc6"], "surrogate_team_keys": []}
            },
            "score_breakdown": {
                "blue": {"autoPoints": 20, "teleopPoints": 100},
                "red": {"autoPoints": 30, "teleopPoints": 120}
            },
            "videos": [{"type": "youtube", "key": "abc"}]
        })
    }

    #[test]
    fn one_row_per_team_in_alliance_order() {
        let table = matches(&json!([qm1()]), Zone::default()).unwrap();
        assert_eq!(table.len(), 6);

        let teams: Vec<_> = table
            .column("team_key")
            .unwrap()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(teams, ["frc1", "frc2", "frc3", "frc4", "frc5", "frc6"]);

        assert_eq!(table.value(2, "surrogate"), &Scalar::from(true));
        assert_eq!(table.value(0, "surrogate"), &Scalar::from(false));
        assert_eq!(table.value(0, "alliance"), &Scalar::from("blue"));
        assert_eq!(table.value(3, "score"), &Scalar::from(150i64));
        assert_eq!(table.value(0, "autoPoints"), &Scalar::from(20i64));
        assert_eq!(table.value(5, "teleopPoints"), &Scalar::from(120i64));
    }

    #[test]
    fn columns_lead_with_match_identity_and_index_by_key() {
        let table = matches(&qm1(), Zone::default()).unwrap();
        assert_eq!(
            &table.columns()[..6],
            ["key", "comp_level", "set_number", "match_number", "predicted_time", "team_key"]
        );
        assert!(table.has_column("autoPoints"));
        assert_eq!(table.index(), ["key"]);
        assert_eq!(table.index_groups().len(), 1);
        assert!(table.value(0, "videos").as_str().unwrap().contains("youtube"));
    }

    #[test]
    fn time_fields_become_local_timestamps() {
        let pacific: Zone = "America/Los_Angeles".parse().unwrap();
        let table = matches(&qm1(), pacific).unwrap();
        assert_eq!(table.value(0, "time"), &Scalar::from("2017-04-01 09:00:00"));
        assert_eq!(table.value(0, "predicted_time"), &Scalar::from("2017-04-01 09:01:00"));
        assert!(table.value(0, "actual_time").is_null());
    }

    #[test]
    fn simple_matches_without_breakdowns() {
        let mut m = qm1();
        let obj = m.as_object_mut().unwrap();
        obj.remove("score_breakdown");
        obj.remove("videos");
        let table = matches(&json!([m]), Zone::default()).unwrap();
        assert_eq!(table.len(), 6);
        assert!(!table.has_column("videos"));
        assert!(!table.has_column("autoPoints"));
    }

    #[test]
    fn empty_and_malformed_inputs() {
        let utc = Zone::default();
        assert!(matches(&json!([]), utc).unwrap().is_empty());
        assert!(matches!(
            matches(&json!([{"key": "x"}]), utc),
            Err(ApiError::MalformedPayload(_))
        ));
        assert!(matches!(matches(&json!("x"), utc), Err(ApiError::MalformedPayload(_))));
    }
}
