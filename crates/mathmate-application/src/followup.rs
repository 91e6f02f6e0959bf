//! Follow-up conversation controller.
//!
//! Streams clarification answers for the current solve result. One ask at a
//! time per session: the user turn is appended synchronously before any
//! remote I/O, fragments are appended to a placeholder model turn in
//! arrival order, and a mid-stream failure finalizes the partial turn with
//! an error annotation instead of discarding it.

use crate::session::SessionHandle;
use futures::StreamExt;
use mathmate_core::capability::ChatCapability;
use mathmate_core::conversation::{ChatTurn, TurnRole};
use mathmate_core::error::{MathMateError, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Builds the fixed scope policy for the follow-up channel.
///
/// The assistant may only clarify the already-given explanation; anything
/// else is declined, in the session language.
pub fn scope_instruction(language: &str) -> String {
    format!(
        "You are a math tutor in a follow-up conversation about one already-solved question. \
         Only clarify the answer and explanation you already gave: restate steps, expand the \
         reasoning, or explain the concepts used. If the user asks about anything else, \
         politely decline and steer back to this question. Respond in {language}."
    )
}

/// Controller for the scoped follow-up chat of the current session.
pub struct FollowUpController {
    chat: Arc<dyn ChatCapability>,
    session: SessionHandle,
    /// Single-flight guard: a second ask while one is pending is rejected.
    in_flight: Mutex<()>,
}

impl FollowUpController {
    pub fn new(chat: Arc<dyn ChatCapability>, session: SessionHandle) -> Self {
        Self {
            chat,
            session,
            in_flight: Mutex::new(()),
        }
    }

    /// Asks a follow-up question about the current result.
    ///
    /// Returns `Ok(None)` when there is no active conversation or the
    /// trimmed question is empty (a no-op), `Ok(Some(text))` with the final
    /// model turn text otherwise. Stream failures are appended to the
    /// transcript turn rather than raised, so a partial answer still
    /// returns `Ok`.
    pub async fn ask(&self, question: &str, language: &str) -> Result<Option<String>> {
        let question = question.trim().to_string();
        if question.is_empty() {
            return Ok(None);
        }

        let Ok(_flight) = self.in_flight.try_lock() else {
            return Err(MathMateError::busy(
                "a follow-up request is already in flight",
            ));
        };

        let token = self.session.current_generation();

        // Append the user turn and an empty placeholder model turn before
        // any remote interaction, so the UI reflects the submitted question
        // even if the stream is slow or fails.
        let (seed_turns, prior_turns) = {
            let mut state = self.session.state().write().await;
            let Some(conversation) = state.conversation.as_mut() else {
                return Ok(None);
            };
            let seed_turns = conversation.seed_turns.clone();
            let prior_turns = conversation.transcript.clone();
            conversation.transcript.push(ChatTurn::user(&question));
            conversation.transcript.push(ChatTurn::model(""));
            (seed_turns, prior_turns)
        };

        let instruction = scope_instruction(language);
        let stream = self
            .chat
            .send_streaming(&seed_turns, &instruction, &prior_turns, &question)
            .await;

        let mut stream = match stream {
            Ok(stream) => stream,
            Err(err) => {
                // Opening the channel failed; finalize the empty placeholder.
                warn!(error = %err, "failed to open follow-up stream");
                let text = self.append_to_placeholder(token, &error_annotation(&err)).await;
                return Ok(Some(text));
            }
        };

        let mut final_text = String::new();
        while let Some(fragment) = stream.next().await {
            match fragment {
                Ok(text) => {
                    final_text = self.append_to_placeholder(token, &text).await;
                }
                Err(err) => {
                    debug!(error = %err, "follow-up stream failed mid-flight");
                    final_text = self
                        .append_to_placeholder(token, &error_annotation(&err))
                        .await;
                    break;
                }
            }
        }

        Ok(Some(final_text))
    }

    /// Appends `fragment` to the placeholder model turn and returns the
    /// accumulated text. Mutates nothing when the session has moved on to a
    /// newer generation.
    async fn append_to_placeholder(&self, token: u64, fragment: &str) -> String {
        let mut state = self.session.state().write().await;
        if !self.session.is_current(token) {
            return String::new();
        }
        let Some(conversation) = state.conversation.as_mut() else {
            return String::new();
        };
        match conversation.transcript.last_mut() {
            Some(turn) if turn.role == TurnRole::Model => {
                turn.text.push_str(fragment);
                turn.text.clone()
            }
            _ => String::new(),
        }
    }
}

fn error_annotation(err: &MathMateError) -> String {
    format!("\n[stream interrupted: {err}]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionHandle, SessionState};
    use mathmate_core::error::Result;
    use futures::stream;
    use mathmate_core::capability::{ChatCapability, ChunkStream};
    use mathmate_core::conversation::ConversationSession;
    use tokio::sync::Notify;

    /// Chat capability yielding a fixed fragment sequence, optionally
    /// holding the stream open on a gate so tests can overlap asks.
    struct MockChat {
        fragments: Vec<Result<String>>,
        gate: Option<Arc<Notify>>,
    }

    impl MockChat {
        fn fragments(fragments: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                fragments: fragments.iter().map(|f| Ok(f.to_string())).collect(),
                gate: None,
            })
        }

        fn failing_after(fragments: &[&str], err: MathMateError) -> Arc<Self> {
            let mut all: Vec<Result<String>> =
                fragments.iter().map(|f| Ok(f.to_string())).collect();
            all.push(Err(err));
            Arc::new(Self {
                fragments: all,
                gate: None,
            })
        }

        fn gated(fragments: &[&str], gate: Arc<Notify>) -> Arc<Self> {
            Arc::new(Self {
                fragments: fragments.iter().map(|f| Ok(f.to_string())).collect(),
                gate: Some(gate),
            })
        }
    }

    #[async_trait::async_trait]
    impl ChatCapability for MockChat {
        async fn send_streaming(
            &self,
            _seed_turns: &[ChatTurn],
            _system_instruction: &str,
            _history: &[ChatTurn],
            _message: &str,
        ) -> Result<ChunkStream> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            Ok(stream::iter(self.fragments.clone()).boxed())
        }
    }

    async fn session_with_conversation() -> SessionHandle {
        let session = SessionHandle::new();
        let mut state = session.state().write().await;
        *state = SessionState {
            question_text: "2+2?".to_string(),
            conversation: Some(ConversationSession {
                seed_turns: vec![
                    ChatTurn::user("I asked this math question: 2+2?"),
                    ChatTurn::model("The answer is 4."),
                ],
                transcript: Vec::new(),
            }),
            ..Default::default()
        };
        drop(state);
        session
    }

    #[tokio::test]
    async fn test_fragments_accumulate_in_arrival_order() {
        let session = session_with_conversation().await;
        let controller =
            FollowUpController::new(MockChat::fragments(&["2", "+2", "="]), session.clone());

        let text = controller.ask("how?", "English").await.unwrap().unwrap();

        assert_eq!(text, "2+2=");
        let snapshot = session.snapshot().await;
        let transcript = &snapshot.conversation.unwrap().transcript;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0], ChatTurn::user("how?"));
        assert_eq!(transcript[1], ChatTurn::model("2+2="));
    }

    #[tokio::test]
    async fn test_user_turn_appended_before_streaming() {
        let session = session_with_conversation().await;
        let gate = Arc::new(Notify::new());
        let controller = Arc::new(FollowUpController::new(
            MockChat::gated(&["ok"], gate.clone()),
            session.clone(),
        ));

        let asker = controller.clone();
        let pending = tokio::spawn(async move { asker.ask("  why?  ", "English").await });
        tokio::task::yield_now().await;

        // The trimmed user turn is visible while the stream is still open.
        let snapshot = session.snapshot().await;
        let transcript = snapshot.conversation.unwrap().transcript;
        assert_eq!(transcript[0], ChatTurn::user("why?"));
        assert_eq!(transcript[1], ChatTurn::model(""));

        gate.notify_one();
        pending.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_single_flight_rejects_concurrent_ask() {
        let session = session_with_conversation().await;
        let gate = Arc::new(Notify::new());
        let controller = Arc::new(FollowUpController::new(
            MockChat::gated(&["ok"], gate.clone()),
            session,
        ));

        let asker = controller.clone();
        let pending = tokio::spawn(async move { asker.ask("first", "English").await });
        tokio::task::yield_now().await;

        let second = controller.ask("second", "English").await;
        assert!(second.unwrap_err().is_busy());

        gate.notify_one();
        pending.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_late_fragments_do_not_mutate_replayed_conversation() {
        let session = session_with_conversation().await;
        let gate = Arc::new(Notify::new());
        let controller = Arc::new(FollowUpController::new(
            MockChat::gated(&["late"], gate.clone()),
            session.clone(),
        ));

        let asker = controller.clone();
        let pending = tokio::spawn(async move { asker.ask("how?", "English").await });
        tokio::task::yield_now().await;

        // A history replay replaces the conversation and starts a new
        // generation while the stream is still open.
        session.begin_generation();
        {
            let mut state = session.state().write().await;
            state.conversation = Some(ConversationSession {
                seed_turns: vec![
                    ChatTurn::user("I asked this math question: 3*3?"),
                    ChatTurn::model("The answer is 9."),
                ],
                transcript: Vec::new(),
            });
        }

        gate.notify_one();
        let outcome = pending.await.unwrap().unwrap();

        // The stale ask resolves without text and without touching the
        // replayed conversation.
        assert_eq!(outcome, Some(String::new()));
        let snapshot = session.snapshot().await;
        assert!(snapshot.conversation.unwrap().transcript.is_empty());
    }

    #[tokio::test]
    async fn test_no_conversation_is_noop() {
        let controller =
            FollowUpController::new(MockChat::fragments(&["ok"]), SessionHandle::new());

        let outcome = controller.ask("anything", "English").await.unwrap();

        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_mid_stream_failure_preserves_partial_text() {
        let session = session_with_conversation().await;
        let controller = FollowUpController::new(
            MockChat::failing_after(&["The first", " step"], MathMateError::stream("cut off")),
            session.clone(),
        );

        let text = controller.ask("explain", "English").await.unwrap().unwrap();

        assert!(text.starts_with("The first step"));
        assert!(text.contains("stream interrupted"));
        assert!(text.contains("cut off"));
        let snapshot = session.snapshot().await;
        let transcript = snapshot.conversation.unwrap().transcript;
        assert_eq!(transcript[1].text, text);
    }

    #[tokio::test]
    async fn test_blank_question_is_noop() {
        let session = session_with_conversation().await;
        let controller = FollowUpController::new(MockChat::fragments(&["ok"]), session.clone());

        let outcome = controller.ask("   ", "English").await.unwrap();

        assert!(outcome.is_none());
        let snapshot = session.snapshot().await;
        assert!(snapshot.conversation.unwrap().transcript.is_empty());
    }
}
