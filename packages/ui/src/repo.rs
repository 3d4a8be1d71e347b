//! Shared store constructor for the view models.
//!
//! Returns an [`AppStore`] backed by the backend named in `[store]`:
//! - **memory**: [`store::MemoryStore`], lost when the process exits
//! - **file**: [`store::FileStore`] under [`StoreConfig::data_dir`]
//!
//! Both repositories of one app must share a single `AppStore` so accounts and
//! locations live side by side.

use store::config::{Backend, StoreConfig};
use store::{Document, DocumentStore, FileStore, MemoryStore, Query, Snapshot, StoreError};
use tracing::info;

/// Runtime-selected [`DocumentStore`].
#[derive(Clone, Debug)]
pub enum AppStore {
    Memory(MemoryStore),
    File(FileStore),
}

/// Create the store named by `config`.
pub fn make_store(config: &StoreConfig) -> AppStore {
    match config.backend {
        Backend::Memory => {
            info!("using in-memory store");
            AppStore::Memory(MemoryStore::new())
        }
        Backend::File => {
            let dir = config.data_dir();
            info!(path = %dir.display(), "using file store");
            AppStore::File(FileStore::new(dir))
        }
    }
}

impl DocumentStore for AppStore {
    fn generate_id(&self) -> String {
        match self {
            AppStore::Memory(s) => s.generate_id(),
            AppStore::File(s) => s.generate_id(),
        }
    }

    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), StoreError> {
        match self {
            AppStore::Memory(s) => s.set(collection, id, doc).await,
            AppStore::File(s) => s.set(collection, id, doc).await,
        }
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        match self {
            AppStore::Memory(s) => s.get(collection, id).await,
            AppStore::File(s) => s.get(collection, id).await,
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        match self {
            AppStore::Memory(s) => s.delete(collection, id).await,
            AppStore::File(s) => s.delete(collection, id).await,
        }
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Snapshot>, StoreError> {
        match self {
            AppStore::Memory(s) => s.query(collection, query).await,
            AppStore::File(s) => s.query(collection, query).await,
        }
    }
}
