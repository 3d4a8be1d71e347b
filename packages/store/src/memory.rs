use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::document::{Document, Query, Snapshot};
use crate::error::StoreError;
use crate::repo::DocumentStore;

type Collections = HashMap<String, HashMap<String, Document>>;

/// In-memory DocumentStore for testing and as the default backend.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, StoreError> {
        self.collections
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

impl DocumentStore for MemoryStore {
    fn generate_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }

    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), StoreError> {
        self.lock()?
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .lock()?
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        if let Some(docs) = self.lock()?.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Snapshot>, StoreError> {
        let guard = self.lock()?;
        let Some(docs) = guard.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(query.apply(docs.iter().map(|(id, data)| Snapshot {
            id: id.clone(),
            data: data.clone(),
        })))
    }
}
