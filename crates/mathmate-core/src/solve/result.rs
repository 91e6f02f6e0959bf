//! Solve result domain model.
//!
//! The wire schemas here are bit-exact contracts with the remote backend:
//! MCQ responses are `{answer_index, answer_text, normalized_expression,
//! value, confidence, explanation, fail_reason?}` and essay responses are
//! `{answer, explanation, fail_reason?}`, all snake_case.

use super::request::SolveMode;
use serde::{Deserialize, Serialize};

/// Sentinel `answer_index` meaning the backend could not pick an option.
pub const UNDETERMINED_ANSWER_INDEX: i32 = -1;

/// Structured result of an MCQ solve attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqResult {
    /// Zero-based index of the correct option, or -1 if undetermined.
    pub answer_index: i32,
    /// The text of the chosen option.
    pub answer_text: String,
    /// The question expression after the normalization ruleset was applied.
    pub normalized_expression: String,
    /// The evaluated value of the expression.
    pub value: String,
    /// Backend confidence in [0, 1].
    pub confidence: f64,
    /// Natural-language explanation of the solution.
    pub explanation: String,
    /// Present iff the backend acknowledged it could not answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_reason: Option<String>,
}

/// Structured result of an essay solve attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EssayResult {
    /// The prose answer.
    pub answer: String,
    /// Natural-language explanation of the solution.
    pub explanation: String,
    /// Present iff the backend acknowledged it could not answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_reason: Option<String>,
}

/// A solve result, polymorphic over the question mode.
///
/// Invariant: `fail_reason` is present exactly when the attempt failed;
/// absence means all substantive fields are populated (the parser back-fills
/// anything the backend omitted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum SolveResult {
    Mcq(McqResult),
    Essay(EssayResult),
}

impl SolveResult {
    /// Returns the mode tag of this result.
    pub fn mode(&self) -> SolveMode {
        match self {
            SolveResult::Mcq(_) => SolveMode::Mcq,
            SolveResult::Essay(_) => SolveMode::Essay,
        }
    }

    /// Returns the fail reason, if the attempt failed.
    pub fn fail_reason(&self) -> Option<&str> {
        match self {
            SolveResult::Mcq(r) => r.fail_reason.as_deref(),
            SolveResult::Essay(r) => r.fail_reason.as_deref(),
        }
    }

    /// Returns the explanation text.
    pub fn explanation(&self) -> &str {
        match self {
            SolveResult::Mcq(r) => &r.explanation,
            SolveResult::Essay(r) => &r.explanation,
        }
    }

    /// Returns the answer text (chosen option for MCQ, prose for essay).
    pub fn answer_text(&self) -> &str {
        match self {
            SolveResult::Mcq(r) => &r.answer_text,
            SolveResult::Essay(r) => &r.answer,
        }
    }

    /// A result is answer-bearing when it carries no fail reason.
    pub fn is_answer_bearing(&self) -> bool {
        self.fail_reason().is_none()
    }

    /// Builds a failure-shaped result for `mode` with defaulted fields.
    ///
    /// MCQ failures carry the -1 sentinel index and empty strings so that
    /// callers can treat every result uniformly as the mode's full type.
    pub fn failure(mode: SolveMode, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        match mode {
            SolveMode::Mcq => SolveResult::Mcq(McqResult {
                answer_index: UNDETERMINED_ANSWER_INDEX,
                answer_text: String::new(),
                normalized_expression: String::new(),
                value: String::new(),
                confidence: 0.0,
                explanation: String::new(),
                fail_reason: Some(reason),
            }),
            SolveMode::Essay => SolveResult::Essay(EssayResult {
                answer: String::new(),
                explanation: String::new(),
                fail_reason: Some(reason),
            }),
        }
    }
}
