use super::{decode, indexed, row};
use crate::error::ApiResult;
use crate::table::Table;
use crate::wire::{Predictions, StatMeanVars};
use crate::{FlatRecord, Scalar};
use serde_json::Value;

/// The four views of an event's predictions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionTables {
    /// Prediction accuracy per level, indexed by `level`/`statistic`.
    pub event_stats: Table,
    /// Per-match predicted scores, indexed by `level`/`match`/`alliance`/`statistic`.
    pub match_predictions: Table,
    /// Predicted final rank and ranking points, indexed by `team`.
    pub team_rankings: Table,
    /// Per-team statistic means and variances, indexed by
    /// `team`/`statistic`/`point`/`level`.
    pub team_stats: Table,
}

pub fn predictions(doc: &Value) -> ApiResult<PredictionTables> {
    let predictions: Predictions = decode(doc, "predictions")?;
    Ok(PredictionTables {
        event_stats: indexed(event_stats(&predictions), &["level", "statistic"])?,
        match_predictions: indexed(
            match_predictions(&predictions),
            &["level", "match", "alliance", "statistic"],
        )?,
        team_rankings: indexed(team_rankings(&predictions), &["team"])?,
        team_stats: indexed(team_stats(&predictions), &["team", "statistic", "point", "level"])?,
    })
}

fn event_stats(predictions: &Predictions) -> Table {
    let mut rows = Vec::new();
    for (level, stats) in predictions.match_prediction_stats.iter().flatten() {
        let Some(stats) = stats else { continue };
        for (statistic, value) in stats {
            match value {
                Value::Object(parts) => {
                    for (part, value) in parts {
                        rows.push(stat_row(level, &format!("{statistic}_{part}"), value));
                    }
                }
                _ => rows.push(stat_row(level, statistic, value)),
            }
        }
    }
    Table::from_records(rows)
}

fn stat_row(level: &str, statistic: &str, value: &Value) -> FlatRecord {
    row([
        ("level", level.into()),
        ("statistic", statistic.into()),
        ("value", Scalar::lossy(value)),
    ])
}

fn match_predictions(predictions: &Predictions) -> Table {
    let mut rows = Vec::new();
    for (level, matches) in predictions.match_predictions.iter().flatten() {
        let Some(matches) = matches else { continue };
        for (match_key, prediction) in matches {
            let sides = [("red", &prediction.red), ("blue", &prediction.blue)];
            for (alliance, stats) in sides {
                for (statistic, value) in stats {
                    rows.push(row([
                        ("level", level.as_str().into()),
                        ("match", match_key.as_str().into()),
                        ("alliance", alliance.into()),
                        ("statistic", statistic.as_str().into()),
                        ("value", Scalar::lossy(value)),
                    ]));
                }
            }
            let summary = [
                ("prob", prediction.prob.as_ref().map(Scalar::lossy).unwrap_or_default()),
                ("winning_alliance", prediction.winning_alliance.clone().into()),
            ];
            for (statistic, value) in summary {
                rows.push(row([
                    ("level", level.as_str().into()),
                    ("match", match_key.as_str().into()),
                    ("alliance", Scalar::Null),
                    ("statistic", statistic.into()),
                    ("value", value),
                ]));
            }
        }
    }
    Table::from_records(rows)
}

fn team_rankings(predictions: &Predictions) -> Table {
    let rows = predictions
        .ranking_predictions
        .iter()
        .flatten()
        .map(|(team, values)| {
            let at = |i: usize| values.get(i).map(Scalar::lossy).unwrap_or_default();
            row([("team", team.as_str().into()), ("rank", at(0)), ("points", at(4))])
        })
        .collect();
    Table::from_records(rows)
}

fn team_stats(predictions: &Predictions) -> Table {
    let Some(levels) = &predictions.stat_mean_vars else {
        return Table::default();
    };
    let levels: Vec<(&String, &StatMeanVars)> = levels
        .iter()
        .filter_map(|(level, stats)| stats.as_ref().map(|stats| (level, stats)))
        .collect();
    let teams: Vec<&String> = levels
        .iter()
        .flat_map(|(_, stats)| stats.values())
        .flat_map(|points| points.values())
        .next()
        .map(|by_team| by_team.keys().collect())
        .unwrap_or_default();

    let mut rows = Vec::new();
    for team in teams {
        for &(level, stats) in &levels {
            for (statistic, points) in stats {
                for (point, by_team) in points {
                    rows.push(row([
                        ("team", team.as_str().into()),
                        ("level", level.as_str().into()),
                        ("statistic", statistic.as_str().into()),
                        ("point", point.as_str().into()),
                        ("value", by_team.get(team).map(Scalar::lossy).unwrap_or_default()),
                    ]));
                }
            }
        }
    }
    Table::from_records(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "match_prediction_stats": {
                "qual": {
                    "score_pred": {"brier_scores": 0.2, "err_mean": 30.5},
                    "wl_accuracy": 70.0
                },
                "playoff": {"wl_accuracy": 60.0}
            },
            "match_predictions": {
                "qual": {
                    "2017wasno_qm1": {
                        "red": {"score": 150, "score_var": 20.0},
                        "blue": {"score": 120, "score_var": 18.0},
                        "prob": 0.8,
                        "winning_alliance": "red"
                    }
                },
                "playoff": {}
            },
            "ranking_predictions": [
                ["frc1", [1, 0.9, 0.1, 0.95, 30, 2.5]],
                ["frc2", [2, 0.8, 0.2, 0.85, 26, 2.1]]
            ],
            "stat_mean_vars": {
                "qual": {
                    "score": {
                        "mean": {"frc1": 40.0, "frc2": 30.0},
                        "var": {"frc1": 5.0, "frc2": 7.0}
                    }
                }
            }
        })
    }

    #[test]
    fn event_stats_expand_nested_statistics() {
        let tables = predictions(&doc()).unwrap();
        let stats = tables.event_stats;
        assert_eq!(stats.len(), 4);
        assert_eq!(stats.value(0, "statistic"), &Scalar::from("score_pred_brier_scores"));
        assert_eq!(stats.value(2, "statistic"), &Scalar::from("wl_accuracy"));
        assert_eq!(stats.value(3, "level"), &Scalar::from("playoff"));
    }

    #[test]
    fn match_predictions_per_alliance_then_summary() {
        let table = predictions(&doc()).unwrap().match_predictions;
        assert_eq!(table.len(), 6);
        assert_eq!(table.index(), ["level", "match", "alliance", "statistic"]);
        assert_eq!(table.value(0, "alliance"), &Scalar::from("red"));
        assert_eq!(table.value(2, "alliance"), &Scalar::from("blue"));
        assert_eq!(table.value(4, "statistic"), &Scalar::from("prob"));
        assert!(table.value(4, "alliance").is_null());
        assert_eq!(table.value(5, "value"), &Scalar::from("red"));
    }

    #[test]
    fn rankings_pick_rank_and_points() {
        let table = predictions(&doc()).unwrap().team_rankings;
        assert_eq!(table.columns(), ["team", "rank", "points"]);
        assert_eq!(table.value(1, "rank"), &Scalar::from(2i64));
        assert_eq!(table.value(0, "points"), &Scalar::from(30i64));
    }

    #[test]
    fn team_stats_one_row_per_team_level_statistic_point() {
        let table = predictions(&doc()).unwrap().team_stats;
        assert_eq!(table.len(), 4);
        assert_eq!(table.index(), ["team", "statistic", "point", "level"]);
        assert_eq!(table.value(1, "point"), &Scalar::from("var"));
        assert_eq!(table.value(3, "value"), &Scalar::from(7.0));
    }

    #[test]
    fn levels_not_yet_played_are_skipped() {
        let tables = predictions(&json!({
            "match_prediction_stats": {"qual": {"wl_accuracy": 70.0}, "playoff": null},
            "match_predictions": {"qual": {}, "playoff": null},
            "ranking_predictions": [],
            "stat_mean_vars": {
                "qual": {"score": {"mean": {"frc1": 40.0}}},
                "playoff": null
            }
        }))
        .unwrap();
        assert_eq!(tables.event_stats.len(), 1);
        assert_eq!(tables.event_stats.value(0, "level"), &Scalar::from("qual"));
        assert!(tables.match_predictions.is_empty());
        assert!(tables.team_rankings.is_empty());
        assert_eq!(tables.team_stats.len(), 1);
        assert_eq!(tables.team_stats.value(0, "value"), &Scalar::from(40.0));
    }

    #[test]
    fn missing_predictions_yield_empty_tables() {
        let tables = predictions(&Value::Null).unwrap();
        assert_eq!(tables, PredictionTables::default());
        let partial = predictions(&json!({"match_prediction_stats": null})).unwrap();
        assert!(partial.team_stats.is_empty());
    }
}
