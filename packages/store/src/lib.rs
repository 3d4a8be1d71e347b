pub mod config;
pub mod dates;
pub mod document;
pub mod error;
pub mod models;
pub mod repo;

mod file_store;
mod memory;
pub use file_store::FileStore;
pub use memory::MemoryStore;

pub use config::GeoQuestConfig;
pub use dates::DateRange;
pub use document::{Document, Query, Snapshot};
pub use error::StoreError;
pub use models::{LocationRecord, Visibility};
pub use repo::{DocumentStore, Listing, LocationRepository, Page};
