//! Screening response validation.
//!
//! Only an unparsable body is an error. Every other deviation from the
//! schema is corrected: scores clamped, verdict recomputed, lists filtered.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::normalizer::value_as_string;
use crate::response::parse_json_object;
use crate::schema::{
    AffectedDatabase, DIMENSION_MAX, Dimension, DimensionScores, Label, ScreeningResult, Verdict,
};

pub const MAX_KEY_SIGNALS: usize = 5;

/// Parse raw screener output and reconcile it into a [`ScreeningResult`].
pub fn validate_screening(raw: &str) -> Result<ScreeningResult, ExtractError> {
    let data = parse_json_object(raw)?;
    Ok(reconcile_screening(&data))
}

pub fn reconcile_screening(data: &Map<String, Value>) -> ScreeningResult {
    let dimension_scores = data.get("dimension_scores").and_then(dimension_scores);
    let penalties = data.get("penalties").and_then(integer).map(|p| p.min(0) as i32);

    let stated = clamp_score(data.get("score").and_then(integer).unwrap_or(0));
    let score = match &dimension_scores {
        Some(dims) if dims.len() == Dimension::ALL.len() => {
            let derived = score_from_dimensions(dims, penalties.unwrap_or(0));
            if derived != stated {
                debug!(stated, derived, "score recomputed from dimension scores");
            }
            derived
        }
        _ => stated,
    };

    let verdict = data
        .get("verdict")
        .and_then(Value::as_str)
        .and_then(Verdict::parse)
        .unwrap_or_else(|| Verdict::from_score(score));

    ScreeningResult {
        score,
        verdict,
        reasoning: data.get("reasoning").map(value_as_string).unwrap_or_default(),
        affected_databases: data
            .get("affected_databases")
            .map(affected_databases)
            .unwrap_or_default(),
        key_signals: data.get("key_signals").map(key_signals).unwrap_or_default(),
        dimension_scores,
        penalties,
    }
}

/// Sum of dimensions plus (non-positive) penalties, clamped to [0, 100].
pub fn score_from_dimensions(dims: &DimensionScores, penalties: i32) -> u8 {
    let sum: i64 = dims.values().map(|v| i64::from(*v)).sum();
    clamp_score(sum + i64::from(penalties.min(0)))
}

pub fn clamp_score(score: i64) -> u8 {
    score.clamp(0, 100) as u8
}

/// Integer view of a JSON value: numbers truncate toward zero, numeric
/// strings are parsed, everything else is `None`.
fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| u.min(i64::MAX as u64) as i64))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn dimension_scores(value: &Value) -> Option<DimensionScores> {
    let object = value.as_object()?;
    let scores = object
        .iter()
        .filter_map(|(key, value)| {
            let dimension = Dimension::parse(key)?;
            let score = integer(value)?.clamp(0, i64::from(DIMENSION_MAX)) as u8;
            Some((dimension, score))
        })
        .collect();
    Some(scores)
}

fn affected_databases(value: &Value) -> Vec<AffectedDatabase> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    let mut databases = Vec::new();
    for item in items {
        match item.as_str().and_then(AffectedDatabase::parse) {
            Some(db) if !databases.contains(&db) => databases.push(db),
            Some(_) => {}
            None => debug!(value = %item, "dropping unknown affected database"),
        }
    }
    databases
}

fn key_signals(value: &Value) -> Vec<String> {
    match value.as_array() {
        Some(items) => items
            .iter()
            .take(MAX_KEY_SIGNALS)
            .map(value_as_string)
            .collect(),
        None => {
            warn!("key_signals is not a list, ignoring");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn reconcile(value: Value) -> ScreeningResult {
        reconcile_screening(value.as_object().unwrap())
    }

    #[test]
    fn test_fenced_response_without_verdict() {
        let raw = "```json\n{\"score\": 85, \"reasoning\": \"Coup in the capital.\"}\n```";
        let result = validate_screening(raw).unwrap();
        assert_eq!(result.score, 85);
        assert_eq!(result.verdict, Verdict::StrongMatch);
        assert_eq!(result.reasoning, "Coup in the capital.");
        assert!(result.affected_databases.is_empty());
        assert!(result.key_signals.is_empty());
    }

    #[test]
    fn test_dimensions_and_penalties_drive_score() {
        let result = reconcile(json!({
            "dimension_scores": {
                "sovereignty_gap": 8,
                "actor_relevance": 12,
                "event_actionability": 10,
                "scope": 9,
                "source_quality": 8
            },
            "penalties": -10,
            "verdict": "bogus"
        }));
        assert_eq!(result.score, 37);
        assert_eq!(result.verdict, Verdict::WeakMatch);
        assert_eq!(result.penalties, Some(-10));
    }

    #[test]
    fn test_partial_dimensions_keep_model_score() {
        let result = reconcile(json!({
            "score": 55,
            "dimension_scores": {"sovereignty_gap": 30, "actor_relevance": -4, "made_up": 7}
        }));
        assert_eq!(result.score, 55);
        let dims = result.dimension_scores.unwrap();
        assert_eq!(dims.len(), 2);
        assert_eq!(dims[&Dimension::SovereigntyGap], 20);
        assert_eq!(dims[&Dimension::ActorRelevance], 0);
    }

    #[test]
    fn test_score_clamped_and_truncated() {
        assert_eq!(reconcile(json!({"score": 150})).score, 100);
        assert_eq!(reconcile(json!({"score": -20})).score, 0);
        assert_eq!(reconcile(json!({"score": 69.9})).score, 69);
        assert_eq!(reconcile(json!({"score": "42"})).score, 42);
        assert_eq!(reconcile(json!({"score": "high"})).score, 0);
    }

    #[test]
    fn test_valid_stated_verdict_is_kept() {
        let result = reconcile(json!({"score": 80, "verdict": "Weak Match"}));
        assert_eq!(result.verdict, Verdict::WeakMatch);
    }

    #[test]
    fn test_positive_penalty_is_clamped_to_zero() {
        assert_eq!(reconcile(json!({"penalties": 5})).penalties, Some(0));
        assert_eq!(reconcile(json!({"penalties": "n/a"})).penalties, None);
    }

    #[test]
    fn test_affected_databases_filtered_in_order() {
        let result = reconcile(json!({
            "affected_databases": [
                "Conflicts Registry", "Marketing CRM", "Events Timeline", 7, "Conflicts Registry"
            ]
        }));
        assert_eq!(
            result.affected_databases,
            vec![AffectedDatabase::ConflictsRegistry, AffectedDatabase::EventsTimeline]
        );
    }

    #[test]
    fn test_key_signals_truncated_and_stringified() {
        let result = reconcile(json!({"key_signals": ["a", 2, true, "d", "e", "f", "g"]}));
        assert_eq!(result.key_signals, vec!["a", "2", "true", "d", "e"]);

        let result = reconcile(json!({"key_signals": "one long string"}));
        assert!(result.key_signals.is_empty());
    }

    #[test]
    fn test_unparsable_body_is_an_error() {
        let err = validate_screening("Score: 85, Strong Match").unwrap_err();
        assert!(matches!(err, ExtractError::MalformedResponse { .. }));
    }

    proptest! {
        #[test]
        fn verdict_follows_score_when_label_invalid(score in -500i64..500, label in "[a-z ]{0,12}") {
            let result = reconcile(json!({"score": score, "verdict": label}));
            let s = result.score;
            prop_assert!(s <= 100);
            let expected = if s >= 70 {
                Verdict::StrongMatch
            } else if s >= 40 {
                Verdict::ModerateMatch
            } else if s >= 10 {
                Verdict::WeakMatch
            } else {
                Verdict::NotRelevant
            };
            prop_assert_eq!(result.verdict, expected);
        }

        #[test]
        fn validation_is_idempotent(
            score in 0i64..=100,
            dims in proptest::collection::vec(0i64..=20, 5),
            penalties in -40i64..=0,
            signals in proptest::collection::vec("[a-z]{1,8}", 0..9),
        ) {
            let first = reconcile(json!({
                "score": score,
                "reasoning": "r",
                "dimension_scores": {
                    "sovereignty_gap": dims[0],
                    "actor_relevance": dims[1],
                    "event_actionability": dims[2],
                    "scope": dims[3],
                    "source_quality": dims[4]
                },
                "penalties": penalties,
                "key_signals": signals,
                "affected_databases": ["Actors Registry", "Nope"]
            }));
            let raw = serde_json::to_string(&first).unwrap();
            let second = validate_screening(&raw).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn key_signals_never_exceed_five(signals in proptest::collection::vec(".*", 0..20)) {
            let result = reconcile(json!({"key_signals": signals}));
            prop_assert!(result.key_signals.len() <= MAX_KEY_SIGNALS);
        }

        #[test]
        fn affected_databases_subset_of_allow_list(
            names in proptest::collection::vec(
                prop_oneof![
                    Just("Events Timeline".to_string()),
                    Just("Geopolitical Units".to_string()),
                    Just("Actors Registry".to_string()),
                    "[A-Za-z ]{0,20}",
                ],
                0..12,
            )
        ) {
            let result = reconcile(json!({"affected_databases": names}));
            let allowed: Vec<&str> = names
                .iter()
                .map(String::as_str)
                .filter(|n| AffectedDatabase::parse(n).is_some())
                .collect();
            let mut expected: Vec<&str> = Vec::new();
            for name in allowed {
                if !expected.contains(&name) {
                    expected.push(name);
                }
            }
            let got: Vec<&str> = result.affected_databases.iter().map(|d| d.as_str()).collect();
            prop_assert_eq!(got, expected);
        }
    }
}
