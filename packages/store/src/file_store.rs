//! # Filesystem-backed document store
//!
//! [`FileStore`] is a [`DocumentStore`] implementation that persists every
//! collection as one JSON file, so logbook entries and accounts survive app
//! restarts without an external database.
//!
//! ## Layout
//!
//! ```text
//! <base_dir>/
//! ├── locations.json     # { "<id>": { ...document... }, ... }
//! └── users.json
//! ```
//!
//! Writes go to `<collection>.json.tmp` first and are renamed into place, so a
//! crash mid-write leaves the previous file intact. Calls are serialised by an
//! in-process lock; sharing one directory between processes is not supported.
//!
//! Use [`crate::config::StoreConfig::data_dir`] for a platform-appropriate
//! base (e.g. `~/.local/share/geoquest/` on Linux).

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::document::{Document, Query, Snapshot};
use crate::error::StoreError;
use crate::repo::DocumentStore;

type Collection = BTreeMap<String, Document>;

/// Filesystem-backed DocumentStore for on-device persistence.
#[derive(Clone, Debug)]
pub struct FileStore {
    base: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileStore {
    pub fn new(base: PathBuf) -> Self {
        Self {
            base,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.base.join(format!("{collection}.json"))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("file store lock poisoned".into()))
    }

    fn load(&self, collection: &str) -> Result<Collection, StoreError> {
        let path = self.collection_path(collection);
        match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
                id: path.display().to_string(),
                reason: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Collection::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, collection: &str, docs: &Collection) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base)?;
        let path = self.collection_path(collection);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(docs)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Delete every collection file under the base directory.
    pub fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        match fs::remove_dir_all(&self.base) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl DocumentStore for FileStore {
    fn generate_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }

    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        let mut docs = self.load(collection)?;
        docs.insert(id.to_string(), doc);
        self.save(collection, &docs)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let _guard = self.lock()?;
        Ok(self.load(collection)?.remove(id))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        let mut docs = self.load(collection)?;
        if docs.remove(id).is_some() {
            self.save(collection, &docs)?;
        }
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Snapshot>, StoreError> {
        let _guard = self.lock()?;
        let docs = self.load(collection)?;
        Ok(query.apply(
            docs.into_iter()
                .map(|(id, data)| Snapshot { id, data }),
        ))
    }
}
