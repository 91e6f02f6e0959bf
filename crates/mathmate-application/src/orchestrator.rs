//! Solve orchestrator.
//!
//! Drives one end-to-end solve attempt: normalize the request, build the
//! prompt, invoke the remote capability, parse the result, persist a
//! history record, and derive the follow-up conversation. Single attempt,
//! no internal retry; every failure is terminal for that attempt.

use crate::session::{SessionHandle, SessionState};
use mathmate_core::conversation::derive_session;
use mathmate_core::capability::SolveCapability;
use mathmate_core::error::{MathMateError, Result};
use mathmate_core::history::{HistoryRecord, HistoryStore};
use mathmate_core::solve::{SolveRequest, SolveResult, build_prompt, parse_solve};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Orchestrates solve attempts against the remote capability and owns the
/// history store.
pub struct SolveOrchestrator {
    capability: Arc<dyn SolveCapability>,
    history: Arc<RwLock<HistoryStore>>,
    session: SessionHandle,
}

impl SolveOrchestrator {
    pub fn new(
        capability: Arc<dyn SolveCapability>,
        history: Arc<RwLock<HistoryStore>>,
        session: SessionHandle,
    ) -> Self {
        Self {
            capability,
            history,
            session,
        }
    }

    /// The shared session handle.
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// The shared history store.
    pub fn history(&self) -> &Arc<RwLock<HistoryStore>> {
        &self.history
    }

    /// Runs one solve attempt.
    ///
    /// Prior result/error/conversation state is cleared synchronously at
    /// submission. Transport failures surface as a session error and are
    /// never persisted; any parseable outcome (success- or failure-shaped)
    /// is persisted to history. A completion whose generation token is no
    /// longer current leaves session state untouched.
    pub async fn solve(&self, request: &SolveRequest, language: &str) -> Result<SolveResult> {
        let request = request.normalized();
        let token = self.session.begin_generation();

        {
            let mut state = self.session.state().write().await;
            *state = SessionState::from_request(&request);
        }

        let payload = build_prompt(&request, language);
        debug!(mode = request.mode.as_str(), has_image = payload.has_image(), "dispatching solve");

        let raw = match self.capability.generate(&payload).await {
            Ok(raw) => raw,
            Err(err) if err.is_config() => {
                // Missing configuration fails before any persistence.
                return Err(err);
            }
            Err(err) => {
                warn!(error = %err, "remote solve failed");
                if self.session.is_current(token) {
                    let mut state = self.session.state().write().await;
                    state.error = Some(err.to_string());
                }
                return Err(err);
            }
        };

        let result = parse_solve(&raw, request.mode);

        // A parseable result object always gets a history record, even a
        // failure-shaped one.
        let record = HistoryRecord::from_attempt(&request, result.clone());
        self.history.write().await.append(record)?;

        if self.session.is_current(token) {
            let mut state = self.session.state().write().await;
            state.result = Some(result.clone());
            state.error = result.fail_reason().map(str::to_string);
            state.conversation =
                derive_session(&result, &request.question_text, &request.options);
        } else {
            debug!("discarding stale solve completion");
        }

        Ok(result)
    }

    /// Replays a history record into the current session.
    ///
    /// Reconstructs the input snapshot (options padded to the fixed slot
    /// count), the stored result, the error state, and a freshly derived
    /// conversation whose live transcript starts empty.
    pub async fn load_record(&self, id: &str) -> Result<()> {
        let record = self
            .history
            .read()
            .await
            .find(id)
            .cloned()
            .ok_or_else(|| MathMateError::not_found("history record", id))?;

        self.session.begin_generation();

        let mut state = self.session.state().write().await;
        *state = SessionState {
            question_text: record.question_text.clone(),
            options: record.padded_options(),
            image: record.image.clone(),
            error: record.result.fail_reason().map(str::to_string),
            conversation: derive_session(
                &record.result,
                &record.question_text,
                &record.options,
            ),
            result: Some(record.result),
        };

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathmate_core::capability::SolveCapability;
    use mathmate_core::history::HISTORY_CAP;
    use mathmate_core::solve::{NON_CONFORMING_REASON, PromptPayload, SolveMode};
    use mathmate_core::storage::KeyValueStore;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    struct MemoryStore {
        values: Mutex<HashMap<String, String>>,
    }

    impl MemoryStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                values: Mutex::new(HashMap::new()),
            })
        }
    }

    impl KeyValueStore for MemoryStore {
        fn get(&self, key: &str) -> Option<String> {
            self.values.lock().unwrap().get(key).cloned()
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.values.lock().unwrap().remove(key);
            Ok(())
        }
    }

    /// Capability returning a fixed response, optionally gated on a notify
    /// so tests can order completions.
    struct MockCapability {
        response: Result<String>,
        gate: Option<Arc<Notify>>,
        entered: Option<Arc<Notify>>,
    }

    impl MockCapability {
        fn ok(raw: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(raw.to_string()),
                gate: None,
                entered: None,
            })
        }

        fn err(err: MathMateError) -> Arc<Self> {
            Arc::new(Self {
                response: Err(err),
                gate: None,
                entered: None,
            })
        }

        fn gated(raw: &str, gate: Arc<Notify>, entered: Arc<Notify>) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(raw.to_string()),
                gate: Some(gate),
                entered: Some(entered),
            })
        }
    }

    #[async_trait::async_trait]
    impl SolveCapability for MockCapability {
        async fn generate(&self, _payload: &PromptPayload) -> Result<String> {
            if let Some(entered) = &self.entered {
                entered.notify_one();
            }
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.response.clone()
        }
    }

    fn orchestrator(capability: Arc<dyn SolveCapability>) -> SolveOrchestrator {
        let history = Arc::new(RwLock::new(HistoryStore::load(MemoryStore::new())));
        SolveOrchestrator::new(capability, history, SessionHandle::new())
    }

    const GOOD_MCQ: &str = r#"{"answer_index": 1, "answer_text": "5", "normalized_expression": "2+3", "value": "5", "confidence": 0.9, "explanation": "Adding 2 and 3 gives 5."}"#;

    fn mcq_request() -> SolveRequest {
        SolveRequest::new(SolveMode::Mcq, "").with_options(vec![
            "4".to_string(),
            "5".to_string(),
            "6".to_string(),
            "7".to_string(),
        ])
    }

    #[tokio::test]
    async fn test_successful_solve_persists_and_derives_conversation() {
        let orch = orchestrator(MockCapability::ok(GOOD_MCQ));

        let result = orch.solve(&mcq_request(), "English").await.unwrap();

        match &result {
            SolveResult::Mcq(r) => assert_eq!(r.answer_index, 1),
            _ => panic!("Expected MCQ variant"),
        }

        let snapshot = orch.session().snapshot().await;
        assert!(snapshot.error.is_none());
        assert!(snapshot.conversation.is_some());
        assert_eq!(orch.history().read().await.list().len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_response_is_structured_failure_with_history() {
        let orch = orchestrator(MockCapability::ok("I cannot help"));

        let result = orch.solve(&mcq_request(), "English").await.unwrap();

        assert_eq!(result.fail_reason(), Some(NON_CONFORMING_REASON));
        match &result {
            SolveResult::Mcq(r) => assert_eq!(r.answer_index, -1),
            _ => panic!("Expected MCQ variant"),
        }

        let snapshot = orch.session().snapshot().await;
        assert!(snapshot.conversation.is_none());
        assert_eq!(snapshot.error.as_deref(), Some(NON_CONFORMING_REASON));
        // A result object was synthesized, so a history record IS created.
        assert_eq!(orch.history().read().await.list().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_sets_error_and_skips_history() {
        let orch = orchestrator(MockCapability::err(MathMateError::transport(
            "network unreachable",
        )));

        let err = orch.solve(&mcq_request(), "English").await.unwrap_err();

        assert!(err.is_transport());
        let snapshot = orch.session().snapshot().await;
        assert!(snapshot.result.is_none());
        assert!(snapshot.error.as_deref().unwrap().contains("network unreachable"));
        assert!(orch.history().read().await.list().is_empty());
    }

    #[tokio::test]
    async fn test_new_solve_clears_prior_output() {
        let history = Arc::new(RwLock::new(HistoryStore::load(MemoryStore::new())));
        let session = SessionHandle::new();
        let good = SolveOrchestrator::new(
            MockCapability::ok(GOOD_MCQ),
            history.clone(),
            session.clone(),
        );
        let failing = SolveOrchestrator::new(
            MockCapability::err(MathMateError::transport("down")),
            history,
            session.clone(),
        );

        good.solve(&mcq_request(), "English").await.unwrap();
        assert!(session.snapshot().await.result.is_some());

        let _ = failing.solve(&mcq_request(), "English").await;

        let snapshot = session.snapshot().await;
        assert!(snapshot.result.is_none());
        assert!(snapshot.conversation.is_none());
        assert!(snapshot.error.is_some());
    }

    #[tokio::test]
    async fn test_config_error_fails_before_persistence() {
        let orch = orchestrator(MockCapability::err(MathMateError::config("no API key")));

        let err = orch.solve(&mcq_request(), "English").await.unwrap_err();

        assert!(err.is_config());
        assert!(orch.history().read().await.list().is_empty());
        // Config failures are surfaced immediately, not as session errors.
        assert!(orch.session().snapshot().await.error.is_none());
    }

    #[tokio::test]
    async fn test_stale_completion_does_not_overwrite_newer_state() {
        let history = Arc::new(RwLock::new(HistoryStore::load(MemoryStore::new())));
        let session = SessionHandle::new();
        let gate = Arc::new(Notify::new());
        let entered = Arc::new(Notify::new());

        let slow = Arc::new(SolveOrchestrator::new(
            MockCapability::gated(
                r#"{"answer": "stale", "explanation": "old"}"#,
                gate.clone(),
                entered.clone(),
            ),
            history.clone(),
            session.clone(),
        ));
        let fast = SolveOrchestrator::new(
            MockCapability::ok(r#"{"answer": "fresh", "explanation": "new"}"#),
            history,
            session.clone(),
        );

        let slow_clone = slow.clone();
        let first = tokio::spawn(async move {
            slow_clone
                .solve(&SolveRequest::new(SolveMode::Essay, "old question"), "English")
                .await
        });
        entered.notified().await;

        fast.solve(&SolveRequest::new(SolveMode::Essay, "new question"), "English")
            .await
            .unwrap();

        gate.notify_one();
        first.await.unwrap().unwrap();

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.question_text, "new question");
        match snapshot.result.unwrap() {
            SolveResult::Essay(r) => assert_eq!(r.answer, "fresh"),
            _ => panic!("Expected essay variant"),
        }
    }

    #[tokio::test]
    async fn test_history_cap_enforced_through_orchestrator() {
        let orch = orchestrator(MockCapability::ok(r#"{"answer": "a", "explanation": "e"}"#));

        for i in 0..(HISTORY_CAP + 5) {
            orch.solve(
                &SolveRequest::new(SolveMode::Essay, format!("q{i}")),
                "English",
            )
            .await
            .unwrap();
        }

        assert_eq!(orch.history().read().await.list().len(), HISTORY_CAP);
    }

    #[tokio::test]
    async fn test_load_record_replays_with_fresh_conversation() {
        let orch = orchestrator(MockCapability::ok(GOOD_MCQ));
        orch.solve(&mcq_request().with_options(vec!["4".into(), "5".into()]), "English")
            .await
            .unwrap();
        let id = orch.history().read().await.list()[0].id.clone();

        // Dirty the live transcript, then replay.
        {
            let mut state = orch.session().state().write().await;
            state
                .conversation
                .as_mut()
                .unwrap()
                .transcript
                .push(mathmate_core::conversation::ChatTurn::user("why?"));
        }

        orch.load_record(&id).await.unwrap();

        let snapshot = orch.session().snapshot().await;
        assert_eq!(snapshot.options.len(), 4);
        assert_eq!(snapshot.options[2], "");
        assert!(snapshot.result.is_some());
        let conversation = snapshot.conversation.unwrap();
        assert!(conversation.transcript.is_empty());
        assert_eq!(conversation.seed_turns.len(), 2);
    }

    #[tokio::test]
    async fn test_load_record_unknown_id_is_not_found() {
        let orch = orchestrator(MockCapability::ok(GOOD_MCQ));

        let err = orch.load_record("missing").await.unwrap_err();

        assert!(err.is_not_found());
    }
}
