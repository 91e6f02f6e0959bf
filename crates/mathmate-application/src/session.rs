//! Current-session state shared between the solve orchestrator and the
//! follow-up controller.
//!
//! At most one solve attempt owns the session at a time. The generation
//! token is bumped on every submission and on history replay; completion
//! handlers compare their captured token against it and mutate nothing
//! when stale, so a slow solve can never overwrite newer state.

use mathmate_core::conversation::ConversationSession;
use mathmate_core::solve::{ImageData, SolveRequest, SolveResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// The state a UI shell renders for the current solve session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// The submitted question text.
    pub question_text: String,
    /// The submitted (or replayed, slot-padded) options.
    pub options: Vec<String>,
    /// The submitted problem image, if any.
    pub image: Option<ImageData>,
    /// The parsed result of the latest completed attempt.
    pub result: Option<SolveResult>,
    /// Session-level error message (transport failure or fail reason).
    pub error: Option<String>,
    /// The active follow-up conversation, if the result is eligible.
    pub conversation: Option<ConversationSession>,
}

impl SessionState {
    /// Fresh state for a newly submitted request: input snapshot kept,
    /// prior result/error/conversation cleared.
    pub fn from_request(request: &SolveRequest) -> Self {
        Self {
            question_text: request.question_text.clone(),
            options: request.options.clone(),
            image: request.image.clone(),
            result: None,
            error: None,
            conversation: None,
        }
    }
}

/// Shared handle to the current session and its generation token.
#[derive(Clone)]
pub struct SessionHandle {
    state: Arc<RwLock<SessionState>>,
    generation: Arc<AtomicU64>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The mutable session state.
    pub fn state(&self) -> &Arc<RwLock<SessionState>> {
        &self.state
    }

    /// Starts a new generation and returns its token.
    pub fn begin_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the current generation token.
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// True while `token` still identifies the latest submission.
    pub fn is_current(&self, token: u64) -> bool {
        self.current_generation() == token
    }

    /// Returns a snapshot of the current session state.
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}
