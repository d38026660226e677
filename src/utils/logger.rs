use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 預設過濾規則；RUST_LOG 存在時以其為準
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "create_dmp=debug,warn"
    } else {
        "create_dmp=info,warn"
    }
}

/// Logs go to stderr so stdout keeps the progress lines and the y/n prompt.
pub fn init_cli_logger(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}
