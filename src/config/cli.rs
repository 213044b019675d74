use crate::config::WatchConfig;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "ip-range-watch")]
#[command(about = "Alert on changes to published AWS IP address ranges")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Regions to watch (overrides the config file)
    #[arg(long, value_delimiter = ',')]
    pub regions: Vec<String>,

    /// Services to watch (overrides the config file)
    #[arg(long, value_delimiter = ',')]
    pub services: Vec<String>,

    /// URL of the range document
    #[arg(long)]
    pub range_url: Option<String>,

    /// JSON file holding the last-known ranges
    #[arg(long, default_value = "./ip-range-state.json")]
    pub state_file: String,

    /// Post changes to this Slack webhook
    #[arg(long)]
    pub slack_webhook: Option<String>,

    /// Publish changes to this SNS topic ARN
    #[arg(long)]
    pub sns_topic: Option<String>,

    /// Track IPv6 prefixes as well
    #[arg(long)]
    pub ipv6: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON lines instead of compact text
    #[arg(long)]
    pub json_logs: bool,
}

impl CliConfig {
    /// Loads the config file (if any) and applies command-line overrides.
    pub fn into_watch_config(self) -> Result<WatchConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path);
                WatchConfig::from_file(path)?
            }
            None => WatchConfig::default(),
        };

        if !self.regions.is_empty() {
            config.regions = self.regions;
        }
        if !self.services.is_empty() {
            config.services = self.services;
        }
        if let Some(url) = self.range_url {
            config.range_document_url = url;
        }
        if let Some(webhook) = self.slack_webhook {
            config.chat_enabled = true;
            config.chat_webhook_url = Some(webhook);
        }
        if let Some(topic) = self.sns_topic {
            config.pubsub_enabled = true;
            config.pubsub_topic_id = Some(topic);
        }
        if self.ipv6 {
            config.include_ipv6 = true;
        }

        Ok(config)
    }
}
