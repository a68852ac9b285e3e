use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::DbPool,
    services::{
        memory::MemoryEntryStore,
        query::QueryEngine,
        storage::{EntryStore, SqliteEntryStore},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub engine: QueryEngine,
}

impl AppState {
    pub fn new(config: &AppConfig, db: DbPool) -> Self {
        Self::with_store(config, Arc::new(SqliteEntryStore::new(db)))
    }

    pub fn in_memory(config: &AppConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryEntryStore::new()))
    }

    pub fn with_store(config: &AppConfig, store: Arc<dyn EntryStore>) -> Self {
        Self {
            engine: QueryEngine::new(store, config.retention_months),
        }
    }
}
