use crate::domain::model::ChangeEvent;
use crate::utils::error::Result;
use serde::Serialize;

/// Structured payload shared by every machine-readable protocol.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangePayload<'a> {
    region: &'a str,
    service: &'a str,
    old_range: &'a [String],
    new_range: &'a [String],
}

/// SNS message published with `MessageStructure=json`: one string per protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PubSubMessage {
    pub default: String,
    pub email: String,
    pub sqs: String,
    pub http: String,
    pub https: String,
    pub lambda: String,
    pub sms: String,
}

impl PubSubMessage {
    pub fn subject(event: &ChangeEvent) -> String {
        format!(
            "AWS IP range change detected in region: {} service: {}",
            event.region(),
            event.service()
        )
    }

    pub fn render(event: &ChangeEvent) -> Result<Self> {
        let payload = serde_json::to_string(&ChangePayload {
            region: event.region(),
            service: event.service(),
            old_range: event.old_ranges().as_slice(),
            new_range: event.new_ranges().as_slice(),
        })?;

        let email = format!(
            "{}\n\nOld range:\n{}\n\nNew range:\n{}",
            Self::subject(event),
            serde_json::to_string(event.old_ranges())?,
            serde_json::to_string(event.new_ranges())?
        );

        Ok(Self {
            default: payload.clone(),
            email,
            sqs: payload.clone(),
            http: payload.clone(),
            https: payload.clone(),
            lambda: payload,
            sms: format!(
                "AWS IP range change detected: {} service: {}",
                event.region(),
                event.service()
            ),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(feature = "aws")]
pub use self::publisher::SnsSender;

#[cfg(feature = "aws")]
mod publisher {
    use super::PubSubMessage;
    use crate::domain::model::ChangeEvent;
    use crate::domain::ports::Sender;
    use crate::utils::error::{Result, WatchError};
    use async_trait::async_trait;
    use aws_sdk_sns::error::DisplayErrorContext;
    use aws_sdk_sns::Client as SnsClient;

    /// Publishes change events to an SNS topic.
    pub struct SnsSender {
        client: SnsClient,
        topic_arn: String,
    }

    impl SnsSender {
        pub fn new(client: SnsClient, topic_arn: impl Into<String>) -> Self {
            Self {
                client,
                topic_arn: topic_arn.into(),
            }
        }
    }

    #[async_trait]
    impl Sender for SnsSender {
        fn name(&self) -> &str {
            "sns"
        }

        async fn send(&self, event: &ChangeEvent) -> Result<()> {
            // 先序列化再記錄，最後才送出
            let message = PubSubMessage::render(event)?.to_json()?;
            let subject = PubSubMessage::subject(event);
            tracing::info!("SNS topic payload for {}: {}", self.topic_arn, message);

            self.client
                .publish()
                .topic_arn(&self.topic_arn)
                .subject(subject)
                .message(message)
                .message_structure("json")
                .send()
                .await
                .map_err(|e| WatchError::Sender {
                    channel: "sns".to_string(),
                    message: DisplayErrorContext(&e).to_string(),
                })?;

            tracing::info!("Successfully published message to SNS for {}", event.key());
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::core::diff::{diff, DiffOutcome};
        use crate::domain::model::{RangeSet, ServiceRegionKey};
        use aws_sdk_sns::config::retry::RetryConfig;
        use aws_sdk_sns::config::{BehaviorVersion, Credentials, Region};
        use httpmock::prelude::*;

        const TOPIC_ARN: &str = "arn:aws:sns:us-east-1:123456789012:ip-range-changes";

        fn sender(server: &MockServer) -> SnsSender {
            let config = aws_sdk_sns::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new("us-east-1"))
                .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "test"))
                .retry_config(RetryConfig::disabled())
                .endpoint_url(server.base_url())
                .build();
            SnsSender::new(SnsClient::from_conf(config), TOPIC_ARN)
        }

        fn event() -> ChangeEvent {
            let key = ServiceRegionKey::new("eu-west-1", "EC2");
            match diff(&key, &RangeSet::empty(), &RangeSet::canonical(["1.2.3.0/24"])) {
                DiffOutcome::Changed(event) => event,
                DiffOutcome::Unchanged => unreachable!(),
            }
        }

        #[tokio::test]
        async fn test_send_publishes_json_structured_message() {
            let server = MockServer::start();
            let mock = server.mock(|when, then| {
                when.method(POST)
                    .path("/")
                    .body_contains("Action=Publish")
                    .body_contains("MessageStructure=json")
                    .body_contains("TopicArn=arn%3Aaws%3Asns%3Aus-east-1%3A123456789012%3Aip-range-changes")
                    .body_contains("Subject=AWS%20IP%20range%20change%20detected%20in%20region%3A%20eu-west-1%20service%3A%20EC2")
                    .body_contains("Message=%7B%22default%22");
                then.status(200)
                    .header("Content-Type", "text/xml")
                    .body(
                        r#"<PublishResponse xmlns="http://sns.amazonaws.com/doc/2010-03-31/"><PublishResult><MessageId>94f20ce6-13c5-43a0-9a9e-ca52d816e90b</MessageId></PublishResult><ResponseMetadata><RequestId>f187a3c1-376f-11df-8963-01868b7c937a</RequestId></ResponseMetadata></PublishResponse>"#,
                    );
            });

            sender(&server).send(&event()).await.unwrap();

            mock.assert();
        }

        #[tokio::test]
        async fn test_publish_failure_is_sender_error() {
            let server = MockServer::start();
            server.mock(|when, then| {
                when.method(POST).path("/").body_contains("Action=Publish");
                then.status(403)
                    .header("Content-Type", "text/xml")
                    .body(
                        r#"<ErrorResponse><Error><Type>Sender</Type><Code>AuthorizationError</Code><Message>Not authorized</Message></Error><RequestId>req-1</RequestId></ErrorResponse>"#,
                    );
            });

            let err = sender(&server).send(&event()).await.unwrap_err();
            assert!(matches!(err, WatchError::Sender { channel, .. } if channel == "sns"));
        }
    }
}
