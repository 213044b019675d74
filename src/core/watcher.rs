use crate::core::diff::{diff, DiffOutcome};
use crate::core::dispatch::Dispatcher;
use crate::core::partition::partition;
use crate::domain::model::{PersistedRecord, RawRangeDocument, RunSummary, ServiceRegionKey};
use crate::domain::ports::{RangeLoader, RangeRepository};
use crate::utils::error::Result;
use chrono::Utc;

/// What happened to one key during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Unchanged,
    Changed,
}

/// Runs change detection for every configured (region, service) pair.
///
/// Per key: partition the document, read the stored set, diff, and on change
/// notify then persist. Any error aborts the whole run; a failed notification
/// leaves the stored set untouched so the next run detects the change again.
pub struct RangeWatcher<L: RangeLoader, R: RangeRepository> {
    loader: L,
    repository: R,
    dispatcher: Dispatcher,
    keys: Vec<ServiceRegionKey>,
    include_ipv6: bool,
}

impl<L: RangeLoader, R: RangeRepository> RangeWatcher<L, R> {
    pub fn new(loader: L, repository: R, dispatcher: Dispatcher, keys: Vec<ServiceRegionKey>) -> Self {
        Self {
            loader,
            repository,
            dispatcher,
            keys: ServiceRegionKey::unique(keys),
            include_ipv6: false,
        }
    }

    pub fn with_ipv6(mut self, include_ipv6: bool) -> Self {
        self.include_ipv6 = include_ipv6;
        self
    }

    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("Loading IP address ranges");
        let document = self.loader.fetch().await?;
        tracing::info!(
            "Loaded {} IPv4 and {} IPv6 prefixes (sync token: {})",
            document.prefixes.len(),
            document.ipv6_prefixes.len(),
            document.sync_token.as_deref().unwrap_or("unknown")
        );

        let mut outcomes = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            let outcome = self.process_key(&document, key).await?;
            outcomes.push((key, outcome));
        }

        let summary = summarize(outcomes);
        if summary.changed() > 0 {
            tracing::info!(
                "Successfully sent {} IP address range change alert(s)",
                summary.changed()
            );
        } else {
            tracing::info!("No relevant IP address range changes were found");
        }

        Ok(summary)
    }

    pub async fn process_key(&self, document: &RawRangeDocument, key: &ServiceRegionKey) -> Result<KeyOutcome> {
        let new_ranges = partition(document, key, self.include_ipv6);

        let stored = self.repository.read(key).await?;
        if stored.is_none() {
            tracing::debug!("No stored ranges for {}, treating as empty", key);
        }
        let old_ranges = PersistedRecord::ranges_or_empty(stored);

        let event = match diff(key, &old_ranges, &new_ranges) {
            DiffOutcome::Unchanged => {
                tracing::info!("No change for {} ({} ranges)", key, new_ranges.len());
                return Ok(KeyOutcome::Unchanged);
            }
            DiffOutcome::Changed(event) => event,
        };

        tracing::info!(
            "IP address range change detected for {}\nOld range: {}\nNew range: {}",
            key,
            event.old_ranges(),
            event.new_ranges()
        );

        self.dispatcher.dispatch(&event).await?;

        self.repository
            .write(key, event.new_ranges(), Utc::now())
            .await?;
        tracing::info!("Stored {} ranges for {}", event.new_ranges().len(), key);

        Ok(KeyOutcome::Changed)
    }
}

fn summarize<'a, I>(outcomes: I) -> RunSummary
where
    I: IntoIterator<Item = (&'a ServiceRegionKey, KeyOutcome)>,
{
    outcomes
        .into_iter()
        .fold(RunSummary::default(), |mut summary, (key, outcome)| {
            summary.evaluated += 1;
            if outcome == KeyOutcome::Changed {
                summary.changed_keys.push(key.clone());
            }
            summary
        })
}
