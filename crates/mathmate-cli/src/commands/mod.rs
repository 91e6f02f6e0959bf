pub mod history;
pub mod solve;

use anyhow::Result;
use mathmate_core::history::HistoryStore;
use mathmate_core::storage::KeyValueStore;
use mathmate_infrastructure::FileKeyValueStore;
use std::sync::Arc;

/// Opens the default file-backed key-value store.
pub fn open_store() -> Result<Arc<dyn KeyValueStore>> {
    Ok(Arc::new(FileKeyValueStore::at_default_location()?))
}

/// Loads the history store from the default location.
pub fn open_history() -> Result<HistoryStore> {
    Ok(HistoryStore::load(open_store()?))
}
