//! Follow-up conversation types.
//!
//! A [`ConversationSession`] is a derived object: it is rebuilt from the
//! owning solve result (plus the original question and options) whenever a
//! result is produced or a history record is loaded. It is never persisted;
//! only the seed turns survive a reload, and the live transcript always
//! starts empty.

use crate::solve::SolveResult;
use serde::{Deserialize, Serialize};

/// Represents the role of a turn in a follow-up conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnRole {
    /// Turn from the user.
    User,
    /// Turn from the model.
    Model,
}

impl TurnRole {
    /// Wire name used by the chat capability ("user" / "model").
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        }
    }
}

/// A single turn in a conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            text: text.into(),
        }
    }
}

/// A scoped follow-up chat session owned by the current solve result.
///
/// `seed_turns` prime the remote chat channel and are never shown in the
/// visible transcript; `transcript` holds only the turns added after the
/// session was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSession {
    /// Synthetic priming turns (question restatement + explanation).
    pub seed_turns: Vec<ChatTurn>,
    /// Visible live turns, in order.
    pub transcript: Vec<ChatTurn>,
}

/// Derives a fresh conversation session from a solve result.
///
/// Returns `Some` iff the result is answer-bearing (no fail reason) and
/// carries a non-empty explanation. The same derivation runs right after a
/// solve and when replaying a history record, so the seeding logic lives in
/// exactly one place.
pub fn derive_session(
    result: &SolveResult,
    question_text: &str,
    options: &[String],
) -> Option<ConversationSession> {
    if !result.is_answer_bearing() || result.explanation().trim().is_empty() {
        return None;
    }

    let mut question = String::from("I asked this math question: ");
    if question_text.trim().is_empty() {
        question.push_str("(the question was provided as an image)");
    } else {
        question.push_str(question_text.trim());
    }
    if !options.is_empty() {
        question.push_str("\nThe answer options were: ");
        question.push_str(&options.join(", "));
    }

    let mut answer = String::new();
    if !result.answer_text().trim().is_empty() {
        answer.push_str("The answer is: ");
        answer.push_str(result.answer_text().trim());
        answer.push('\n');
    }
    answer.push_str(result.explanation().trim());

    Some(ConversationSession {
        seed_turns: vec![ChatTurn::user(question), ChatTurn::model(answer)],
        transcript: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solve::{EssayResult, McqResult, SolveMode, SolveResult};

    fn answer_bearing_mcq() -> SolveResult {
        SolveResult::Mcq(McqResult {
            answer_index: 1,
            answer_text: "5".to_string(),
            normalized_expression: "2+3".to_string(),
            value: "5".to_string(),
            confidence: 0.9,
            explanation: "2 plus 3 equals 5.".to_string(),
            fail_reason: None,
        })
    }

    #[test]
    fn test_session_created_for_answer_bearing_result() {
        let session = derive_session(&answer_bearing_mcq(), "2+3?", &["4".into(), "5".into()]);

        let session = session.expect("session should be derived");
        assert_eq!(session.seed_turns.len(), 2);
        assert_eq!(session.seed_turns[0].role, TurnRole::User);
        assert_eq!(session.seed_turns[1].role, TurnRole::Model);
        assert!(session.seed_turns[0].text.contains("2+3?"));
        assert!(session.seed_turns[0].text.contains("4, 5"));
        assert!(session.seed_turns[1].text.contains("2 plus 3 equals 5."));
        assert!(session.transcript.is_empty());
    }

    #[test]
    fn test_no_session_for_failed_result() {
        let failed = SolveResult::failure(SolveMode::Mcq, "cannot read");

        assert!(derive_session(&failed, "q", &[]).is_none());
    }

    #[test]
    fn test_no_session_for_empty_explanation() {
        let result = SolveResult::Essay(EssayResult {
            answer: "42".to_string(),
            explanation: "  ".to_string(),
            fail_reason: None,
        });

        assert!(derive_session(&result, "q", &[]).is_none());
    }

    #[test]
    fn test_image_only_question_is_described() {
        let session = derive_session(&answer_bearing_mcq(), "", &[]).unwrap();

        assert!(session.seed_turns[0].text.contains("image"));
    }
}
