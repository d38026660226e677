use clap::Parser;
use create_dmp::utils::{logger, validation::Validate};
use create_dmp::{AppConfig, CliArgs, ImportApp, ImportError, RunReport};

fn report_error(e: &ImportError) {
    tracing::error!(
        "❌ Import failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = CliArgs::parse();

    // .env 需在日誌與配置之前載入
    dotenvy::dotenv().ok();
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting create-dmp");
    tracing::debug!("CLI args: {:?}", args);

    // 載入並驗證配置
    let config = match AppConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config.display(), e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };
    if let Err(e) = config.validate() {
        report_error(&e);
        std::process::exit(1);
    }

    let app = ImportApp::new(config, args.run_options());
    let stdin = std::io::stdin();

    match app.run(stdin.lock(), std::io::stdout()).await {
        Ok(RunReport::Completed { summary, log_path }) => {
            tracing::info!("✅ Import finished: {}", summary);
            tracing::info!("📁 Run log: {}", log_path.display());
        }
        Ok(RunReport::Declined { .. }) => {
            tracing::info!("🛑 Nothing done");
        }
        Err(e) => {
            report_error(&e);
            std::process::exit(1);
        }
    }
}
