//! Normalization of loosely-typed specialist output.
//!
//! Provider responses are JSON by request but not by contract: models drift
//! between the dimension-specific keys they were asked for and generic
//! `score`/`rationale` keys, emit numbers as strings, and occasionally skip
//! fields entirely. Everything is reshaped here, once, so downstream code
//! never touches a raw `Value`.

use serde_json::Value;
use tracing::debug;

use crate::dimensions::Dimension;

/// Rationale substituted when a specialist returns none.
pub const NO_RATIONALE: &str = "No rationale provided.";

/// What one specialist call produced: a parsed but untrusted report, or the
/// reason the call failed (error or timeout).
#[derive(Debug, Clone)]
pub enum SpecialistOutput {
    Report(Value),
    Failure(String),
}

/// A specialist output forced into canonical shape. Always carries a score
/// in 0..=100 and a non-empty rationale.
#[derive(Debug, Clone)]
pub struct DimensionReport {
    pub dimension: Dimension,
    pub score: u8,
    pub rationale: String,
}

pub fn normalize(dimension: Dimension, output: SpecialistOutput) -> DimensionReport {
    match output {
        SpecialistOutput::Failure(error) => DimensionReport {
            dimension,
            score: 0,
            rationale: format!("Specialist call failed: {error}"),
        },
        SpecialistOutput::Report(value) => {
            let score = value
                .get(dimension.score_key())
                .or_else(|| value.get("score"))
                .and_then(clamp_score)
                .unwrap_or_else(|| {
                    debug!(dimension = dimension.key(), "Specialist returned no usable score");
                    0
                });
            let rationale = value
                .get(dimension.rationale_key())
                .or_else(|| value.get("rationale"))
                .or_else(|| value.get("analysis"))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .unwrap_or_else(|| NO_RATIONALE.to_string());
            DimensionReport { dimension, score, rationale }
        }
    }
}

/// Read a score out of whatever the model sent: integer, float, or numeric
/// string. Clamped to 0..=100.
pub fn clamp_score(value: &Value) -> Option<u8> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if n.is_nan() {
        return None;
    }
    Some(n.clamp(0.0, 100.0).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dimension_key_wins_over_generic_score() {
        let report = normalize(
            Dimension::Visual,
            SpecialistOutput::Report(json!({ "score_visual": 88, "score": 12 })),
        );
        assert_eq!(report.score, 88);
    }

    #[test]
    fn generic_score_fills_in_for_missing_dimension_key() {
        let report = normalize(
            Dimension::Mobile,
            SpecialistOutput::Report(json!({ "score": 73, "rationale": "fine" })),
        );
        assert_eq!(report.score, 73);
        assert_eq!(report.rationale, "fine");
    }

    #[test]
    fn missing_everything_defaults_to_zero_and_placeholder() {
        let report = normalize(Dimension::Syntax, SpecialistOutput::Report(json!({})));
        assert_eq!(report.score, 0);
        assert_eq!(report.rationale, NO_RATIONALE);
    }

    #[test]
    fn analysis_key_is_accepted_as_rationale() {
        let report = normalize(
            Dimension::Fidelity,
            SpecialistOutput::Report(json!({ "score_fidelity": 50, "analysis": "meets the brief" })),
        );
        assert_eq!(report.rationale, "meets the brief");
    }

    #[test]
    fn blank_rationale_gets_the_placeholder() {
        let report = normalize(
            Dimension::Accessibility,
            SpecialistOutput::Report(json!({ "score_accessibility": 40, "rationale_accessibility": "   " })),
        );
        assert_eq!(report.rationale, NO_RATIONALE);
    }

    #[test]
    fn failure_carries_the_error_text_at_zero() {
        let report = normalize(
            Dimension::Interaction,
            SpecialistOutput::Failure("timed out after 60s".to_string()),
        );
        assert_eq!(report.score, 0);
        assert!(report.rationale.contains("timed out after 60s"));
    }

    #[test]
    fn scores_clamp_and_coerce() {
        assert_eq!(clamp_score(&json!(250)), Some(100));
        assert_eq!(clamp_score(&json!(-4)), Some(0));
        assert_eq!(clamp_score(&json!(86.6)), Some(87));
        assert_eq!(clamp_score(&json!("91")), Some(91));
        assert_eq!(clamp_score(&json!(" 55.4 ")), Some(55));
        assert_eq!(clamp_score(&json!("high")), None);
        assert_eq!(clamp_score(&json!(null)), None);
        assert_eq!(clamp_score(&json!([10])), None);
    }
}
