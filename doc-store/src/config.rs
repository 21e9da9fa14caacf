use std::{path::PathBuf, str::FromStr, sync::Arc};

use tracing::info;

use crate::{
    errors::StoreError, memory::MemoryDocumentStore, sqlite::SqliteDocumentStore,
    store::DocumentStore,
};

pub const DEFAULT_SQLITE_PATH: &str = "data/pdf-chat.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

impl FromStr for StoreBackend {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(StoreBackend::Memory),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => Err(StoreError::Config(format!(
                "DOC_STORE must be `memory` or `sqlite`, got `{other}`"
            ))),
        }
    }
}

/// Document store selection.
///
/// - `DOC_STORE` = `memory` | `sqlite` (default `memory`)
/// - `SQLITE_PATH` (default `data/pdf-chat.db`)
#[derive(Debug, Clone)]
pub struct DocStoreConfig {
    pub backend: StoreBackend,
    pub sqlite_path: PathBuf,
}

impl Default for DocStoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            sqlite_path: PathBuf::from(DEFAULT_SQLITE_PATH),
        }
    }
}

impl DocStoreConfig {
    pub fn from_env() -> Result<Self, StoreError> {
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("DOC_STORE") {
            if !v.trim().is_empty() {
                cfg.backend = v.parse()?;
            }
        }
        if let Ok(v) = std::env::var("SQLITE_PATH") {
            if !v.trim().is_empty() {
                cfg.sqlite_path = PathBuf::from(v.trim());
            }
        }
        Ok(cfg)
    }
}

/// Opens the configured backend.
pub fn open_store(cfg: &DocStoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    let store: Arc<dyn DocumentStore> = match cfg.backend {
        StoreBackend::Memory => Arc::new(MemoryDocumentStore::new()),
        StoreBackend::Sqlite => Arc::new(SqliteDocumentStore::open(&cfg.sqlite_path)?),
    };
    info!(backend = store.backend(), "document store ready");
    Ok(store)
}
