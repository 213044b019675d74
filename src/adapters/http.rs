use crate::domain::model::RawRangeDocument;
use crate::domain::ports::RangeLoader;
use crate::utils::error::{Result, WatchError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_RANGE_DOCUMENT_URL: &str = "https://ip-ranges.amazonaws.com/ip-ranges.json";

/// Builds the shared HTTP client used by the loader and the chat sender.
pub fn build_client(timeout_seconds: u64) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Downloads the range document with a single GET.
pub struct HttpRangeLoader {
    client: Client,
    url: String,
}

impl HttpRangeLoader {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn fetch_error(&self, message: impl std::fmt::Display) -> WatchError {
        WatchError::Fetch {
            url: self.url.clone(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl RangeLoader for HttpRangeLoader {
    async fn fetch(&self) -> Result<RawRangeDocument> {
        tracing::info!("Loading IP addresses: {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.fetch_error(e))?;

        tracing::debug!("Range document response status: {}", response.status());

        if !response.status().is_success() {
            return Err(self.fetch_error(format!("unexpected status {}", response.status())));
        }

        let body = response.bytes().await.map_err(|e| self.fetch_error(e))?;
        serde_json::from_slice(&body).map_err(|e| self.fetch_error(format!("malformed document: {}", e)))
    }
}
