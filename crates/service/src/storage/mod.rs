//! Storage backends for the persistence core.
//!
//! A backend owns durability only: `load` once at startup, `flush` the full
//! state after every committed mutation. Collection semantics live in
//! `crate::data_manager`.

use std::collections::HashMap;

use async_trait::async_trait;
use models::Record;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;

/// Records of one entity type keyed by id.
pub type Collection = HashMap<String, Record>;

/// All collections keyed by collection name.
pub type Collections = HashMap<String, Collection>;

/// Format version written into every durable snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

/// On-disk envelope: `{"version": 1, "collections": {...}}`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    #[serde(default)]
    pub collections: Collections,
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read durable state. Missing state yields empty collections.
    async fn load(&self) -> Result<Collections, ServiceError>;

    /// Replace durable state with `collections`.
    async fn flush(&self, collections: &Collections) -> Result<(), ServiceError>;
}
