//! MathMate domain layer.
//!
//! Data model, prompt construction, response parsing, history, and the
//! trait seams for every external collaborator (remote solve capability,
//! streaming chat capability, key-value persistence). Everything here is
//! independent of the concrete backend and storage format.

pub mod capability;
pub mod conversation;
pub mod error;
pub mod history;
pub mod solve;
pub mod storage;

// Re-export common error type
pub use error::{MathMateError, Result};
