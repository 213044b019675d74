use crate::domain::model::{PersistedRecord, RangeSet, ServiceRegionKey};
use crate::domain::ports::RangeRepository;
use crate::utils::error::{Result, WatchError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory repository. State is lost when the process exits, so every key
/// looks new on the next start. Clones share the same state and counters.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    records: Arc<RwLock<HashMap<ServiceRegionKey, PersistedRecord>>>,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &ServiceRegionKey) -> Option<PersistedRecord> {
        self.records.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Successful writes only.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent `write` fail, to exercise error paths.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl RangeRepository for MemoryRepository {
    async fn read(&self, key: &ServiceRegionKey) -> Result<Option<PersistedRecord>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn write(&self, key: &ServiceRegionKey, ranges: &RangeSet, last_modified: DateTime<Utc>) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(WatchError::RepositoryWrite {
                key: key.to_string(),
                message: "writes disabled".to_string(),
            });
        }

        self.records
            .write()
            .await
            .insert(key.clone(), PersistedRecord::new(ranges.clone(), last_modified));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
