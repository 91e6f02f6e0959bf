//! Response parsing and normalization.
//!
//! Turns raw model output into a validated [`SolveResult`] or a
//! failure-shaped result. This boundary never panics and never propagates a
//! decode error: unparseable text becomes a failure result carrying
//! [`NON_CONFORMING_REASON`].

use super::request::SolveMode;
use super::result::{EssayResult, McqResult, SolveResult, UNDETERMINED_ANSWER_INDEX};
use serde::Deserialize;
use tracing::debug;

/// Fixed failure reason used when the backend response cannot be decoded.
pub const NON_CONFORMING_REASON: &str = "backend returned a non-conforming response";

/// Partial MCQ wire object; every field optional so that failure-shaped
/// responses (often just `{"fail_reason": ...}`) still decode.
#[derive(Debug, Deserialize)]
struct PartialMcq {
    #[serde(default)]
    answer_index: Option<i32>,
    #[serde(default)]
    answer_text: Option<String>,
    #[serde(default)]
    normalized_expression: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    fail_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PartialEssay {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    fail_reason: Option<String>,
}

/// Strips a surrounding Markdown code fence, if any.
///
/// Handles ```json / ``` openers and a trailing ``` closer; anything else
/// is returned trimmed as-is.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string ("json", "JSON", ...) up to the first newline.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };

    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parses raw backend text into a full result for `mode`.
///
/// Missing fields in a decodable-but-partial object are back-filled with
/// defaults (`answer_index = -1`, empty strings, confidence 0.0) so callers
/// can treat the result uniformly regardless of success or failure shape.
pub fn parse_solve(raw: &str, mode: SolveMode) -> SolveResult {
    let body = strip_code_fences(raw);

    match mode {
        SolveMode::Mcq => match serde_json::from_str::<PartialMcq>(body) {
            Ok(partial) => SolveResult::Mcq(McqResult {
                answer_index: partial.answer_index.unwrap_or(UNDETERMINED_ANSWER_INDEX),
                answer_text: partial.answer_text.unwrap_or_default(),
                normalized_expression: partial.normalized_expression.unwrap_or_default(),
                value: partial.value.unwrap_or_default(),
                confidence: partial.confidence.unwrap_or(0.0),
                explanation: partial.explanation.unwrap_or_default(),
                fail_reason: partial.fail_reason,
            }),
            Err(err) => {
                debug!(error = %err, "MCQ response did not decode");
                SolveResult::failure(mode, NON_CONFORMING_REASON)
            }
        },
        SolveMode::Essay => match serde_json::from_str::<PartialEssay>(body) {
            Ok(partial) => SolveResult::Essay(EssayResult {
                answer: partial.answer.unwrap_or_default(),
                explanation: partial.explanation.unwrap_or_default(),
                fail_reason: partial.fail_reason,
            }),
            Err(err) => {
                debug!(error = %err, "essay response did not decode");
                SolveResult::failure(mode, NON_CONFORMING_REASON)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED_MCQ: &str = r#"{"answer_index": 1, "answer_text": "5", "normalized_expression": "2+3", "value": "5", "confidence": 0.9, "explanation": "2 plus 3 equals 5."}"#;

    #[test]
    fn test_parses_well_formed_mcq() {
        let result = parse_solve(WELL_FORMED_MCQ, SolveMode::Mcq);

        match result {
            SolveResult::Mcq(r) => {
                assert_eq!(r.answer_index, 1);
                assert_eq!(r.answer_text, "5");
                assert_eq!(r.normalized_expression, "2+3");
                assert!(r.fail_reason.is_none());
            }
            _ => panic!("Expected MCQ variant"),
        }
    }

    #[test]
    fn test_parses_fenced_payload() {
        let fenced = format!("```json\n{WELL_FORMED_MCQ}\n```");
        let plain = parse_solve(WELL_FORMED_MCQ, SolveMode::Mcq);

        let result = parse_solve(&fenced, SolveMode::Mcq);

        assert_eq!(result, plain);
    }

    #[test]
    fn test_parses_bare_fence_payload() {
        let fenced = format!("```\n{WELL_FORMED_MCQ}\n```");

        let result = parse_solve(&fenced, SolveMode::Mcq);

        assert!(result.is_answer_bearing());
    }

    #[test]
    fn test_unparseable_text_yields_failure_not_panic() {
        let result = parse_solve("I cannot help", SolveMode::Mcq);

        match result {
            SolveResult::Mcq(r) => {
                assert_eq!(r.answer_index, UNDETERMINED_ANSWER_INDEX);
                assert_eq!(r.fail_reason.as_deref(), Some(NON_CONFORMING_REASON));
            }
            _ => panic!("Expected MCQ variant"),
        }
    }

    #[test]
    fn test_truncated_json_yields_failure() {
        let result = parse_solve(r#"{"answer": "x ="#, SolveMode::Essay);

        assert_eq!(result.fail_reason(), Some(NON_CONFORMING_REASON));
    }

    #[test]
    fn test_partial_failure_object_is_backfilled() {
        let result = parse_solve(r#"{"fail_reason": "ambiguous question"}"#, SolveMode::Mcq);

        match result {
            SolveResult::Mcq(r) => {
                assert_eq!(r.answer_index, UNDETERMINED_ANSWER_INDEX);
                assert!(r.answer_text.is_empty());
                assert!(r.value.is_empty());
                assert_eq!(r.confidence, 0.0);
                assert_eq!(r.fail_reason.as_deref(), Some("ambiguous question"));
            }
            _ => panic!("Expected MCQ variant"),
        }
    }

    #[test]
    fn test_essay_round_trip() {
        let result = parse_solve(
            r#"{"answer": "x = 2", "explanation": "subtract 3 from both sides"}"#,
            SolveMode::Essay,
        );

        match result {
            SolveResult::Essay(r) => {
                assert_eq!(r.answer, "x = 2");
                assert!(r.fail_reason.is_none());
            }
            _ => panic!("Expected essay variant"),
        }
    }
}
