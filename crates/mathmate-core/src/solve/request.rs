//! Solve request domain model.
//!
//! A [`SolveRequest`] captures everything the user submitted for one solve
//! attempt: the question mode, the question text, MCQ options, the numeric
//! comparison tolerance, and an optional photographed problem statement.

use serde::{Deserialize, Serialize};

/// The question variant being solved.
///
/// All consumers of solve data match exhaustively on this tag; there is no
/// structural duck-typing on which fields happen to be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveMode {
    /// Multiple-choice question: pick one of an ordered option list.
    Mcq,
    /// Free-form question producing a prose answer.
    Essay,
}

impl SolveMode {
    /// Short lowercase name used in prompts and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            SolveMode::Mcq => "mcq",
            SolveMode::Essay => "essay",
        }
    }
}

/// An attached problem image in the form the remote capability accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    /// Base64-encoded image bytes.
    pub data_base64: String,
    /// MIME type of the image (e.g. "image/jpeg").
    pub mime_type: String,
}

/// A single solve attempt as submitted by the user.
///
/// Immutable once submitted; the orchestrator works on a normalized copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveRequest {
    /// Question variant (MCQ or essay).
    pub mode: SolveMode,
    /// The question text. May be empty when an image carries the problem.
    pub question_text: String,
    /// Ordered answer options. Only meaningful in MCQ mode.
    #[serde(default)]
    pub options: Vec<String>,
    /// Tolerance governing numeric equality when comparing option values.
    pub numeric_tolerance: f64,
    /// Optional photographed/captured problem statement.
    #[serde(default)]
    pub image: Option<ImageData>,
}

impl SolveRequest {
    /// Creates a text-only request.
    pub fn new(mode: SolveMode, question_text: impl Into<String>) -> Self {
        Self {
            mode,
            question_text: question_text.into(),
            options: Vec::new(),
            numeric_tolerance: 0.01,
            image: None,
        }
    }

    /// Sets the MCQ options.
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    /// Sets the numeric comparison tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.numeric_tolerance = tolerance;
        self
    }

    /// Attaches a problem image.
    pub fn with_image(mut self, image: ImageData) -> Self {
        self.image = Some(image);
        self
    }

    /// Returns a normalized copy ready for prompt construction.
    ///
    /// Blank MCQ options are dropped (order of the rest preserved); essay
    /// mode ignores options entirely.
    pub fn normalized(&self) -> Self {
        let options = match self.mode {
            SolveMode::Mcq => self
                .options
                .iter()
                .filter(|o| !o.trim().is_empty())
                .cloned()
                .collect(),
            SolveMode::Essay => Vec::new(),
        };

        Self {
            mode: self.mode,
            question_text: self.question_text.clone(),
            options,
            numeric_tolerance: self.numeric_tolerance,
            image: self.image.clone(),
        }
    }
}
