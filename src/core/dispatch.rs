use crate::domain::model::ChangeEvent;
use crate::domain::ports::Sender;
use crate::utils::error::{Result, WatchError};

/// Fans a change event out to every registered sender.
///
/// Every sender is invoked even if an earlier one failed. Any failure is
/// reported back as a single `WatchError::Notification`.
#[derive(Default)]
pub struct Dispatcher {
    senders: Vec<Box<dyn Sender>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sender(mut self, sender: Box<dyn Sender>) -> Self {
        self.register(sender);
        self
    }

    pub fn register(&mut self, sender: Box<dyn Sender>) {
        tracing::info!("Notification channel enabled: {}", sender.name());
        self.senders.push(sender);
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Returns how many senders delivered the event.
    pub async fn dispatch(&self, event: &ChangeEvent) -> Result<usize> {
        if self.is_empty() {
            tracing::info!("No notification channels enabled for {}", event.key());
            return Ok(0);
        }

        let mut failures = Vec::new();

        for sender in &self.senders {
            match sender.send(event).await {
                Ok(()) => {
                    tracing::info!("Sent {} notification for {}", sender.name(), event.key());
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to send {} notification for {}: {}",
                        sender.name(),
                        event.key(),
                        e
                    );
                    failures.push(format!("{}: {}", sender.name(), e));
                }
            }
        }

        if failures.is_empty() {
            Ok(self.senders.len())
        } else {
            Err(WatchError::Notification {
                key: event.key().to_string(),
                failures,
            })
        }
    }
}
