use ip_range_watch::config::aws::build_watcher;
use ip_range_watch::core::{RangeLoader, RangeRepository};
use ip_range_watch::utils::{logger, validation::Validate};
use ip_range_watch::{RangeWatcher, WatchConfig};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::Serialize;

#[derive(Serialize)]
pub struct Response {
    pub message: String,
    pub changed_count: usize,
    pub changed_keys: Vec<String>,
}

/// The trigger payload (scheduled event or SNS notification from AWS) is
/// logged but otherwise ignored.
async fn function_handler<L, R>(watcher: &RangeWatcher<L, R>, event: LambdaEvent<serde_json::Value>) -> Result<Response, Error>
where
    L: RangeLoader,
    R: RangeRepository,
{
    tracing::info!("Handling IP address change event: {}", event.payload);

    let summary = match watcher.run().await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!(
                "Failed to process IP address changes: {} (Category: {:?})",
                e,
                e.category()
            );
            return Err(e.into());
        }
    };

    tracing::info!("Successfully processed IP address changes: {}", summary);
    Ok(Response {
        message: summary.to_string(),
        changed_count: summary.changed(),
        changed_keys: summary.changed_keys.iter().map(|k| k.to_string()).collect(),
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    // 冷啟動時讀取一次配置與建立客戶端
    let config = WatchConfig::from_env()?;
    config.validate()?;
    tracing::info!("Parameters: {}", config.summary());

    let watcher = build_watcher(&config).await?;
    let watcher = &watcher;

    run(service_fn(move |event: LambdaEvent<serde_json::Value>| async move {
        function_handler(watcher, event).await
    }))
    .await
}
