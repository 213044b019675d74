use crate::domain::model::{ChangeEvent, PersistedRecord, RangeSet, RawRangeDocument, ServiceRegionKey};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Retrieves the raw range document.
#[async_trait]
pub trait RangeLoader: Send + Sync {
    async fn fetch(&self) -> Result<RawRangeDocument>;
}

/// Last-known range set per (region, service).
///
/// `write` replaces both the set and the timestamp for a key in one call.
/// Calls for different keys may run concurrently; callers never issue
/// concurrent calls for the same key.
pub trait RangeRepository: Send + Sync {
    fn read(
        &self,
        key: &ServiceRegionKey,
    ) -> impl std::future::Future<Output = Result<Option<PersistedRecord>>> + Send;

    fn write(
        &self,
        key: &ServiceRegionKey,
        ranges: &RangeSet,
        last_modified: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// A notification channel.
#[async_trait]
pub trait Sender: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, event: &ChangeEvent) -> Result<()>;
}
