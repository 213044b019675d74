use crate::domain::model::ChangeEvent;
use crate::domain::ports::Sender;
use crate::utils::error::{Result, WatchError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

pub const RANGES_DOCUMENTATION_URL: &str = "https://docs.aws.amazon.com/general/latest/gr/aws-ip-ranges.html";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlackMessage {
    pub text: String,
    pub attachments: Vec<SlackAttachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlackAttachment {
    pub text: String,
}

impl SlackMessage {
    pub fn render(event: &ChangeEvent) -> Result<Self> {
        let old_range = serde_json::to_string(event.old_ranges())?;
        let new_range = serde_json::to_string(event.new_ranges())?;

        Ok(Self {
            text: format!(
                "*AWS IP address range change* detected in region: *{}* for service: *{}*",
                event.region(),
                event.service()
            ),
            attachments: vec![SlackAttachment {
                text: format!(
                    "This may require urgent routing changes!\n\n\
                     Old range:\n{}\n\n\
                     New range:\n{}\n\n\
                     More info: {}\n\n",
                    old_range, new_range, RANGES_DOCUMENTATION_URL
                ),
            }],
        })
    }
}

/// Posts a summary to a Slack incoming webhook.
pub struct SlackSender {
    client: Client,
    webhook_url: String,
}

impl SlackSender {
    pub fn new(client: Client, webhook_url: impl Into<String>) -> Self {
        Self {
            client,
            webhook_url: webhook_url.into(),
        }
    }

    fn error(&self, message: impl std::fmt::Display) -> WatchError {
        WatchError::Sender {
            channel: "slack".to_string(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl Sender for SlackSender {
    fn name(&self) -> &str {
        "slack"
    }

    async fn send(&self, event: &ChangeEvent) -> Result<()> {
        let body = SlackMessage::render(event)?;
        tracing::debug!("Sending Slack webhook: {}", serde_json::to_string(&body)?);

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.error(e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(self.error(format!("webhook returned {}: {}", status, detail)));
        }

        tracing::info!("Successfully posted Slack message for {}", event.key());
        Ok(())
    }
}
