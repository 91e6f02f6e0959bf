//! Application layer: the solve orchestrator, session state ownership, and
//! the follow-up conversation controller.

pub mod followup;
pub mod orchestrator;
pub mod session;

pub use followup::FollowUpController;
pub use orchestrator::SolveOrchestrator;
pub use session::{SessionHandle, SessionState};
