use clap::Parser;
use ip_range_watch::adapters::build_client;
use ip_range_watch::utils::error::ErrorSeverity;
use ip_range_watch::utils::{logger, validation::Validate};
use ip_range_watch::{CliConfig, Dispatcher, FileRepository, HttpRangeLoader, RangeWatcher, WatchConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose, cli.json_logs);
    tracing::info!("Starting ip-range-watch");

    let state_file = cli.state_file.clone();
    let result = match cli.into_watch_config() {
        Ok(config) => run(config, &state_file).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(summary) => {
            tracing::info!("Successfully processed IP address changes");
            println!("✅ {}", summary);
        }
        Err(e) => {
            tracing::error!(
                "Failed to process IP address changes: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Medium => 2, // 下次排程可重試
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(config: WatchConfig, state_file: &str) -> ip_range_watch::Result<ip_range_watch::RunSummary> {
    config.validate()?;
    ip_range_watch::utils::validation::validate_path("state_file", state_file)?;
    tracing::info!("Parameters: {}", config.summary());

    let http = build_client(config.request_timeout_seconds)?;

    let mut dispatcher = Dispatcher::new();
    if let Some(slack) = config.chat_sender(&http)? {
        dispatcher.register(Box::new(slack));
    }
    register_pubsub(&config, &mut dispatcher).await?;

    let loader = HttpRangeLoader::new(http, config.range_document_url.clone());
    let repository = FileRepository::new(state_file);
    let watcher = RangeWatcher::new(loader, repository, dispatcher, config.keys()).with_ipv6(config.include_ipv6);

    watcher.run().await
}

#[cfg(feature = "aws")]
async fn register_pubsub(config: &WatchConfig, dispatcher: &mut Dispatcher) -> ip_range_watch::Result<()> {
    use ip_range_watch::config::aws::{load_sdk_config, pubsub_sender};

    if config.pubsub_enabled {
        let sdk_config = load_sdk_config(config).await;
        if let Some(sns) = pubsub_sender(config, &sdk_config)? {
            dispatcher.register(Box::new(sns));
        }
    }
    Ok(())
}

#[cfg(not(feature = "aws"))]
async fn register_pubsub(config: &WatchConfig, _dispatcher: &mut Dispatcher) -> ip_range_watch::Result<()> {
    if config.pubsub_enabled {
        return Err(ip_range_watch::WatchError::ConfigError {
            message: "SNS publishing requires a build with the `aws` feature".to_string(),
        });
    }
    Ok(())
}
