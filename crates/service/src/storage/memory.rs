use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Collections, StorageBackend};
use crate::errors::ServiceError;

/// In-memory storage.
///
/// Holds the last flushed state so a store reopened on the same backend sees
/// every committed mutation. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    snapshot: RwLock<Collections>,
    flushes: AtomicU64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from pre-populated state, as if it had been flushed earlier.
    pub fn with_collections(collections: Collections) -> Self {
        Self { snapshot: RwLock::new(collections), flushes: AtomicU64::new(0) }
    }

    /// Number of flushes performed so far.
    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn load(&self) -> Result<Collections, ServiceError> {
        Ok(self.snapshot.read().await.clone())
    }

    async fn flush(&self, collections: &Collections) -> Result<(), ServiceError> {
        *self.snapshot.write().await = collections.clone();
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
