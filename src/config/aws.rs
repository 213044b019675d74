use crate::adapters::{build_client, DynamoRepository, HttpRangeLoader, SnsSender};
use crate::config::WatchConfig;
use crate::core::dispatch::Dispatcher;
use crate::core::watcher::RangeWatcher;
use crate::utils::error::Result;
use crate::utils::validation::validate_required_field;
use aws_config::{BehaviorVersion, Region, SdkConfig};

pub async fn load_sdk_config(config: &WatchConfig) -> SdkConfig {
    let loader = aws_config::defaults(BehaviorVersion::latest());
    match &config.deployment_region {
        Some(region) => loader.region(Region::new(region.clone())).load().await,
        None => loader.load().await,
    }
}

/// The SNS sender, or `None` when pub/sub is disabled.
pub fn pubsub_sender(config: &WatchConfig, sdk_config: &SdkConfig) -> Result<Option<SnsSender>> {
    if !config.pubsub_enabled {
        tracing::info!("SNS notifications are disabled");
        return Ok(None);
    }

    let topic = validate_required_field("pubsub_topic_id", &config.pubsub_topic_id)?;
    tracing::info!("SNS publishing is enabled, publishing to topic: {}", topic);
    Ok(Some(SnsSender::new(
        aws_sdk_sns::Client::new(sdk_config),
        topic.clone(),
    )))
}

/// Wires the Lambda deployment: HTTP loader, DynamoDB state, Slack and SNS.
pub async fn build_watcher(config: &WatchConfig) -> Result<RangeWatcher<HttpRangeLoader, DynamoRepository>> {
    let table = validate_required_field("repository_table_name", &config.repository_table_name)?;

    let http = build_client(config.request_timeout_seconds)?;
    let sdk_config = load_sdk_config(config).await;

    let mut dispatcher = Dispatcher::new();
    if let Some(slack) = config.chat_sender(&http)? {
        dispatcher.register(Box::new(slack));
    }
    if let Some(sns) = pubsub_sender(config, &sdk_config)? {
        dispatcher.register(Box::new(sns));
    }

    let loader = HttpRangeLoader::new(http, config.range_document_url.clone());
    let repository = DynamoRepository::new(aws_sdk_dynamodb::Client::new(&sdk_config), table.clone());

    Ok(RangeWatcher::new(loader, repository, dispatcher, config.keys()).with_ipv6(config.include_ipv6))
}
