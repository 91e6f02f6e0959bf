//! Persisted solve history: record model and the bounded store.

pub mod model;
pub mod store;

pub use model::{HistoryRecord, OPTION_SLOTS};
pub use store::{HISTORY_CAP, HistoryStore};
