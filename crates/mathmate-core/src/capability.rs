//! Remote capability seams.
//!
//! The generative backend is consumed through two narrow traits: a one-shot
//! solve capability returning raw text, and a streaming chat capability for
//! the follow-up channel. Transport, auth, and quota failures surface as
//! `MathMateError::Transport`; a missing configuration surfaces as
//! `MathMateError::Config` before any call is made.

use crate::conversation::ChatTurn;
use crate::error::Result;
use crate::solve::PromptPayload;
use futures::stream::BoxStream;

/// A finite, non-restartable stream of incremental response fragments.
pub type ChunkStream = BoxStream<'static, Result<String>>;

/// One-shot generative solve capability.
///
/// Returns the raw model text on success; the caller owns parsing.
#[async_trait::async_trait]
pub trait SolveCapability: Send + Sync {
    async fn generate(&self, payload: &PromptPayload) -> Result<String>;
}

/// Streaming chat capability for follow-up conversations.
///
/// The channel is scoped per call: `seed_turns` prime the conversation,
/// `history` carries the prior live turns, and `message` is the new user
/// question. Fragments arrive in order and the stream may fail mid-flight.
#[async_trait::async_trait]
pub trait ChatCapability: Send + Sync {
    async fn send_streaming(
        &self,
        seed_turns: &[ChatTurn],
        system_instruction: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<ChunkStream>;
}
