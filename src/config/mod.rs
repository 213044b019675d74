#[cfg(feature = "aws")]
pub mod aws;
#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

use crate::adapters::{SlackSender, DEFAULT_RANGE_DOCUMENT_URL};
use crate::domain::model::ServiceRegionKey;
use crate::utils::error::{Result, WatchError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Process-wide settings, read once at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub regions: Vec<String>,
    pub services: Vec<String>,
    pub range_document_url: String,
    pub repository_table_name: Option<String>,
    pub chat_enabled: bool,
    pub chat_webhook_url: Option<String>,
    pub pubsub_enabled: bool,
    pub pubsub_topic_id: Option<String>,
    /// AWS region for the SDK clients. Falls back to the SDK's default chain.
    pub deployment_region: Option<String>,
    pub include_ipv6: bool,
    pub request_timeout_seconds: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
            services: Vec::new(),
            range_document_url: DEFAULT_RANGE_DOCUMENT_URL.to_string(),
            repository_table_name: None,
            chat_enabled: false,
            chat_webhook_url: None,
            pubsub_enabled: false,
            pubsub_topic_id: None,
            deployment_region: None,
            include_ipv6: false,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
        }
    }
}

impl WatchConfig {
    /// Reads the Lambda environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`WatchConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let regions = get("REGIONS").ok_or_else(|| WatchError::MissingConfigError {
            field: "REGIONS".to_string(),
        })?;
        let services = get("SERVICES").ok_or_else(|| WatchError::MissingConfigError {
            field: "SERVICES".to_string(),
        })?;

        let request_timeout_seconds = match get("REQUEST_TIMEOUT_SECONDS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| WatchError::InvalidConfigValueError {
                    field: "REQUEST_TIMEOUT_SECONDS".to_string(),
                    value: raw.clone(),
                    reason: "Value must be a whole number of seconds".to_string(),
                })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECONDS,
        };

        Ok(Self {
            regions: parse_list("REGIONS", &regions)?,
            services: parse_list("SERVICES", &services)?,
            range_document_url: get("IP_RANGES_URL")
                .unwrap_or_else(|| DEFAULT_RANGE_DOCUMENT_URL.to_string()),
            repository_table_name: get("DYNAMO_IPADDRESS_TABLE"),
            chat_enabled: parse_flag(get("PUBLISH_SLACK")),
            chat_webhook_url: get("PUBLISH_SLACK_WEBHOOK"),
            pubsub_enabled: parse_flag(get("PUBLISH_SNS")),
            pubsub_topic_id: get("PUBLISH_SNS_TOPIC_ARN"),
            deployment_region: get("DEPLOYMENT_REGION"),
            include_ipv6: parse_flag(get("INCLUDE_IPV6")),
            request_timeout_seconds,
        })
    }

    pub fn keys(&self) -> Vec<ServiceRegionKey> {
        ServiceRegionKey::cross_product(&self.regions, &self.services)
    }

    /// The Slack sender, or `None` when chat is disabled.
    pub fn chat_sender(&self, client: &reqwest::Client) -> Result<Option<SlackSender>> {
        if !self.chat_enabled {
            tracing::info!("Slack notifications are disabled");
            return Ok(None);
        }

        let webhook = validation::validate_required_field("chat_webhook_url", &self.chat_webhook_url)?;
        Ok(Some(SlackSender::new(client.clone(), webhook.clone())))
    }

    /// Log-safe summary; the webhook URL embeds a secret and is never printed.
    pub fn summary(&self) -> String {
        format!(
            "regions={:?} services={:?} url={} table={} slack={} sns={} topic={} ipv6={}",
            self.regions,
            self.services,
            self.range_document_url,
            self.repository_table_name.as_deref().unwrap_or("-"),
            self.chat_enabled,
            self.pubsub_enabled,
            self.pubsub_topic_id.as_deref().unwrap_or("-"),
            self.include_ipv6
        )
    }
}

impl Validate for WatchConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_non_empty_list("regions", &self.regions)?;
        validate_non_empty_list("services", &self.services)?;
        validate_url("range_document_url", &self.range_document_url)?;
        validate_range("request_timeout_seconds", self.request_timeout_seconds, 1, 300)?;

        if let Some(table) = &self.repository_table_name {
            validate_non_empty_string("repository_table_name", table)?;
        }

        // 啟用的通知管道必須有對應設定
        if self.chat_enabled {
            let webhook = validate_required_field("chat_webhook_url", &self.chat_webhook_url)?;
            validate_url("chat_webhook_url", webhook)?;
        }

        if self.pubsub_enabled {
            let topic = validate_required_field("pubsub_topic_id", &self.pubsub_topic_id)?;
            validate_non_empty_string("pubsub_topic_id", topic)?;
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }
}

/// Accepts a JSON array (`["us-east-1","eu-west-1"]`) or a comma-separated list.
fn parse_list(field: &str, raw: &str) -> Result<Vec<String>> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(|e| WatchError::InvalidConfigValueError {
            field: field.to_string(),
            value: raw.to_string(),
            reason: format!("Expected a JSON array of strings: {}", e),
        });
    }

    Ok(trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

fn parse_flag(raw: Option<String>) -> bool {
    raw.map(|v| v.trim().eq_ignore_ascii_case("true")).unwrap_or(false)
}
