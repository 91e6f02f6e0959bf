//! Gemini REST integration: the one-shot solve capability and the
//! streaming follow-up chat capability.

pub mod chat;
pub mod gemini_client;

pub use chat::GeminiChatClient;
pub use gemini_client::GeminiClient;
