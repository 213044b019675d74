use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default directives when `RUST_LOG` is unset. The AWS SDK logs every
/// request at info, so it is held at warn unless running verbose.
pub fn default_directives(verbose: bool) -> String {
    if verbose {
        "ip_range_watch=debug,aws_config=info,aws_smithy_runtime=info,warn".to_string()
    } else {
        "ip_range_watch=info,lambda=info,aws_config=warn,aws_smithy_runtime=warn,warn".to_string()
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

/// Compact human output for a terminal, or one JSON object per line when the
/// CLI runs under cron and feeds a log shipper.
pub fn init_cli_logger(verbose: bool, json: bool) {
    let compact = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
    });
    let json = json.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .json()
            .with_current_span(false)
    });

    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(compact)
        .with(json)
        .init();
}

pub fn init_lambda_logger() {
    tracing_subscriber::registry()
        .with(env_filter(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .without_time() // CloudWatch 已經加上時間戳
                .json()
                .with_current_span(false),
        )
        .init();
}
