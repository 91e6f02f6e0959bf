//! Prompt construction for solve attempts.
//!
//! `build_prompt` is a pure function of the request and the response
//! language. It produces an ordered multi-part payload: an optional inline
//! image (the primary problem statement when present) followed by a single
//! instruction text block that pins the backend to the mode's strict JSON
//! output schema.

use super::request::{SolveMode, SolveRequest};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// One part of a prompt payload, in send order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PromptPart {
    /// Plain instruction/question text.
    Text(String),
    /// Inline base64 image data.
    InlineImage {
        mime_type: String,
        data_base64: String,
    },
}

/// The full payload handed to the remote solve capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptPayload {
    pub parts: Vec<PromptPart>,
}

impl PromptPayload {
    /// Returns the concatenated text of all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                PromptPart::Text(t) => Some(t.as_str()),
                PromptPart::InlineImage { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// True when the payload carries an inline image part.
    pub fn has_image(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, PromptPart::InlineImage { .. }))
    }
}

const MCQ_SCHEMA: &str = r#"{"answer_index": <int, zero-based index of the correct option, or -1 if undetermined>, "answer_text": <string>, "normalized_expression": <string>, "value": <string>, "confidence": <number between 0 and 1>, "explanation": <string>, "fail_reason": <string, only present if you cannot answer>}"#;

const ESSAY_SCHEMA: &str = r#"{"answer": <string>, "explanation": <string>, "fail_reason": <string, only present if you cannot answer>}"#;

/// Builds the instruction payload for one solve attempt.
///
/// The request is expected to be normalized already (blank MCQ options
/// removed); the builder reflects the options exactly as given.
pub fn build_prompt(request: &SolveRequest, language: &str) -> PromptPayload {
    let mut text = String::new();

    writeln!(
        text,
        "You are a precise math solver. Respond with a single JSON object and nothing else - no markdown, no code fences, no commentary."
    )
    .ok();
    writeln!(
        text,
        "All natural-language content in the response must be written in {language}."
    )
    .ok();

    if request.image.is_some() {
        writeln!(
            text,
            "An image of the problem is attached. Treat the image as the primary problem statement; the question text below, if any, is optional supplementary context."
        )
        .ok();
    }

    match request.mode {
        SolveMode::Mcq => {
            writeln!(text, "The response JSON object must match exactly this schema:").ok();
            writeln!(text, "{MCQ_SCHEMA}").ok();
            writeln!(
                text,
                "Before evaluating the expression, normalize the question text deterministically:"
            )
            .ok();
            writeln!(
                text,
                "- convert any non-Latin digit script (Arabic-Indic, Devanagari, etc.) to ASCII digits"
            )
            .ok();
            writeln!(
                text,
                "- normalize decimal and thousands separators to '.' decimal point, no grouping separators"
            )
            .ok();
            writeln!(
                text,
                "- canonicalize multiplication (x, X, *, \u{00d7} -> *), division (\u{00f7}, : -> /), subtraction (\u{2212}, \u{2013} -> -), roots (\u{221a} -> sqrt), and percent (% -> /100)"
            )
            .ok();
            writeln!(text, "- preserve exponent notation as written").ok();
            writeln!(text, "- remove extraneous whitespace").ok();
            writeln!(
                text,
                "When comparing the evaluated value against the options, treat numbers as equal if they differ by at most {}.",
                request.numeric_tolerance
            )
            .ok();

            if !request.options.is_empty() {
                writeln!(text, "The answer options, in order:").ok();
                for (i, option) in request.options.iter().enumerate() {
                    writeln!(text, "{i}. {option}").ok();
                }
            }
        }
        SolveMode::Essay => {
            writeln!(text, "The response JSON object must match exactly this schema:").ok();
            writeln!(text, "{ESSAY_SCHEMA}").ok();
            writeln!(
                text,
                "Answer the question fully and give a step-by-step explanation."
            )
            .ok();
        }
    }

    if !request.question_text.trim().is_empty() {
        writeln!(text, "Question: {}", request.question_text).ok();
    }

    let mut parts = Vec::new();
    if let Some(image) = &request.image {
        parts.push(PromptPart::InlineImage {
            mime_type: image.mime_type.clone(),
            data_base64: image.data_base64.clone(),
        });
    }
    parts.push(PromptPart::Text(text));

    PromptPayload { parts }
}
