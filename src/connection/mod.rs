pub mod auth;
pub mod config;

use crate::core::StoreResult;
use crate::storage::{DocumentStore, HttpStore, MemoryStore};
use config::{ConsoleConfig, StoreLocation};
use std::sync::Arc;
use tracing::info;

/// Opens the document store named by the configuration.
pub async fn open_store(config: &ConsoleConfig) -> StoreResult<Arc<dyn DocumentStore>> {
    info!(store = %config.store, "opening document store");

    let store: Arc<dyn DocumentStore> = match &config.store {
        StoreLocation::Memory => Arc::new(MemoryStore::new()),
        StoreLocation::File(path) => Arc::new(MemoryStore::open(path).await?),
        StoreLocation::Http(url) => Arc::new(HttpStore::new(url, config.request_timeout)?),
    };
    Ok(store)
}
