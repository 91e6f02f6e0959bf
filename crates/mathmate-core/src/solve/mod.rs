//! Solve domain: request/result models, prompt construction, and response
//! parsing for one end-to-end solve attempt.

pub mod parser;
pub mod prompt;
pub mod request;
pub mod result;

pub use parser::{NON_CONFORMING_REASON, parse_solve};
pub use prompt::{PromptPart, PromptPayload, build_prompt};
pub use request::{ImageData, SolveMode, SolveRequest};
pub use result::{EssayResult, McqResult, SolveResult, UNDETERMINED_ANSWER_INDEX};
