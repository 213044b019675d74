use crate::domain::model::{PersistedRecord, RangeSet, ServiceRegionKey};
use crate::domain::ports::RangeRepository;
use crate::utils::error::{Result, WatchError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    region: String,
    service: String,
    ips: RangeSet,
    #[serde(rename = "lastModified")]
    last_modified: Option<DateTime<Utc>>,
}

/// Repository backed by a single JSON file, for running outside AWS.
///
/// The file maps `region/service` to its last-known ranges. Writes rewrite the
/// whole file through a temp file and rename. A missing file means no records.
#[derive(Debug, Clone)]
pub struct FileRepository {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> std::io::Result<BTreeMap<String, StoredEntry>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e),
        }
    }

    async fn save(&self, entries: &BTreeMap<String, StoredEntry>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let data = serde_json::to_vec_pretty(entries)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await
    }
}

impl RangeRepository for FileRepository {
    async fn read(&self, key: &ServiceRegionKey) -> Result<Option<PersistedRecord>> {
        let entries = self.load().await.map_err(|e| WatchError::RepositoryRead {
            key: key.to_string(),
            message: format!("{}: {}", self.path.display(), e),
        })?;

        Ok(entries.get(&key.to_string()).map(|entry| PersistedRecord {
            ranges: entry.ips.clone(),
            last_modified: entry.last_modified,
        }))
    }

    async fn write(&self, key: &ServiceRegionKey, ranges: &RangeSet, last_modified: DateTime<Utc>) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let to_write_error = |e: std::io::Error| WatchError::RepositoryWrite {
            key: key.to_string(),
            message: format!("{}: {}", self.path.display(), e),
        };

        let mut entries = self.load().await.map_err(to_write_error)?;
        entries.insert(
            key.to_string(),
            StoredEntry {
                region: key.region.clone(),
                service: key.service.clone(),
                ips: ranges.clone(),
                last_modified: Some(last_modified),
            },
        );

        self.save(&entries).await.map_err(to_write_error)
    }
}
