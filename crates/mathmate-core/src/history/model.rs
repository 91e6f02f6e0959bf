//! History record domain model.

use crate::solve::{ImageData, SolveMode, SolveRequest, SolveResult};
use serde::{Deserialize, Serialize};

/// Number of option slots the UI renders; replay pads or truncates to this.
pub const OPTION_SLOTS: usize = 4;

/// A snapshot of one completed solve attempt.
///
/// Created for every attempt that produced a parseable result, successful
/// or failure-shaped. Transport failures never produce a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Unique record identifier (UUID format).
    pub id: String,
    /// Question variant of the attempt.
    pub mode: SolveMode,
    /// The submitted question text.
    pub question_text: String,
    /// The submitted options (normalized, MCQ only).
    #[serde(default)]
    pub options: Vec<String>,
    /// The submitted problem image, if any.
    #[serde(default)]
    pub image: Option<ImageData>,
    /// The parsed result, success- or failure-shaped.
    pub result: SolveResult,
    /// Creation timestamp (ISO 8601 format).
    pub created_at: String,
}

impl HistoryRecord {
    /// Builds a record from a normalized request and its parsed result.
    pub fn from_attempt(request: &SolveRequest, result: SolveResult) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            mode: request.mode,
            question_text: request.question_text.clone(),
            options: request.options.clone(),
            image: request.image.clone(),
            result,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Returns the stored options padded or truncated to exactly
    /// [`OPTION_SLOTS`] entries, as the option grid expects on replay.
    pub fn padded_options(&self) -> Vec<String> {
        let mut options = self.options.clone();
        options.resize(OPTION_SLOTS, String::new());
        options
    }
}
