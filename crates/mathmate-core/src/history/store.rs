//! Bounded, persisted history store.
//!
//! The full list is serialized as one JSON blob through the key-value
//! collaborator on every mutation, so the 50-record cap holds at rest, not
//! just at display time. A corrupt persisted blob self-heals to an empty
//! store on load.

use super::model::HistoryRecord;
use crate::error::Result;
use crate::storage::{HISTORY_KEY, KeyValueStore};
use std::sync::Arc;
use tracing::{debug, warn};

/// Maximum number of retained records; oldest beyond this are evicted.
pub const HISTORY_CAP: usize = 50;

/// Append-only bounded log of past solve attempts, newest first.
pub struct HistoryStore {
    records: Vec<HistoryRecord>,
    store: Arc<dyn KeyValueStore>,
}

impl HistoryStore {
    /// Loads the store from the persistence collaborator.
    ///
    /// A missing blob yields an empty store. A corrupt blob also yields an
    /// empty store and the blob is discarded, never a load error.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let records = match store.get(HISTORY_KEY) {
            None => Vec::new(),
            Some(blob) => match serde_json::from_str::<Vec<HistoryRecord>>(&blob) {
                Ok(records) => records,
                Err(err) => {
                    warn!(error = %err, "discarding corrupt history blob");
                    if let Err(err) = store.remove(HISTORY_KEY) {
                        warn!(error = %err, "failed to discard corrupt history blob");
                    }
                    Vec::new()
                }
            },
        };

        Self { records, store }
    }

    /// Prepends a record and evicts silently beyond [`HISTORY_CAP`].
    pub fn append(&mut self, record: HistoryRecord) -> Result<()> {
        debug!(id = %record.id, "appending history record");
        self.records.insert(0, record);
        self.records.truncate(HISTORY_CAP);
        self.persist()
    }

    /// Removes the record with `id`. Removing a missing id is a no-op.
    pub fn remove(&mut self, id: &str) -> Result<()> {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        if self.records.len() == before {
            return Ok(());
        }
        self.persist()
    }

    /// Empties the store. Clearing an empty store is a no-op.
    pub fn clear(&mut self) -> Result<()> {
        if self.records.is_empty() {
            return Ok(());
        }
        self.records.clear();
        self.persist()
    }

    /// Returns all records, newest first.
    pub fn list(&self) -> &[HistoryRecord] {
        &self.records
    }

    /// Finds a record by id.
    pub fn find(&self, id: &str) -> Option<&HistoryRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    fn persist(&self) -> Result<()> {
        let blob = serde_json::to_string(&self.records)?;
        self.store.set(HISTORY_KEY, &blob)
    }
}
