use crate::flatten::flatten_into;
use crate::table::FromScalars;
use serde_json::Value;

/// Team status at an event, flattened into `T`.
///
/// The qualification ranking's positional `sort_orders` are first renamed after
/// `qual.sort_order_info`, which is then dropped.
pub fn event_team_status<T: FromScalars>(doc: &Value) -> T {
    let mut doc = doc.clone();
    if let Some(qual) = doc.get_mut("qual").and_then(Value::as_object_mut) {
        let names: Vec<String> = qual
            .get("sort_order_info")
            .and_then(Value::as_array)
            .map(|info| {
                info.iter()
                    .filter_map(|i| i.get("name").and_then(Value::as_str).map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default();
        qual.shift_remove("sort_order_info");

        if let Some(ranking) = qual.get_mut("ranking").and_then(Value::as_object_mut) {
            if let Some(Value::Array(sort_orders)) = ranking.shift_remove("sort_orders") {
                for (name, value) in names.into_iter().zip(sort_orders) {
                    ranking.insert(name, value);
                }
            }
        }
    }
    flatten_into(&doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Scalar, Series, Table};
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "qual": {
                "num_teams": 60,
                "ranking": {
                    "rank": 3,
                    "team_key": "frc1318",
                    "sort_orders": [2.4, 150],
                    "record": {"wins": 8, "losses": 2, "ties": 0}
                },
                "sort_order_info": [{"name": "Ranking Score"}, {"name": "Auto"}],
                "status": "completed"
            },
            "alliance": {"name": "Alliance 2", "number": 2, "pick": 0},
            "playoff": null,
            "overall_status_str": "Team 1318 was Rank 3/60"
        })
    }

    #[test]
    fn sort_orders_take_their_names() {
        let series: Series = event_team_status(&doc());
        assert_eq!(series.get("qual_ranking_Ranking_Score"), Some(&Scalar::from(2.4)));
        assert_eq!(series.get("qual_ranking_Auto"), Some(&Scalar::from(150i64)));
        assert_eq!(series.get("qual_ranking_record_wins"), Some(&Scalar::from(8i64)));
        assert!(series.get("qual_ranking_sort_orders_0").is_none());
        assert!(series.entries().iter().all(|(l, _)| !l.contains("sort_order_info")));
        assert_eq!(series.get("playoff"), Some(&Scalar::Null));
    }

    #[test]
    fn table_form_matches_series_form() {
        let series: Series = event_team_status(&doc());
        let table: Table = event_team_status(&doc());
        assert_eq!(table.len(), series.len());
        assert_eq!(table.index(), ["label"]);
        assert_eq!(table.value(0, "label"), &Scalar::from(series.entries()[0].0.as_str()));
    }

    #[test]
    fn team_not_at_event() {
        let series: Series = event_team_status(&Value::Null);
        assert!(series.get("qual").is_none());
    }
}
