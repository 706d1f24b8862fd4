use anyhow::Context;
use camper_watch::utils::{logger, shutdown, validation::Validate};
use camper_watch::{
    CliArgs, FileConfig, ImoovaSource, LocalStorage, Monitor, MonitorConfig, MonitorError,
    SeenStore, TelegramSink,
};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 要在解析參數前載入，clap 的 env 屬性才讀得到
    let dotenv = dotenvy::dotenv();
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting camper-watch");
    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let file_config = FileConfig::load_or_warn(&args.config);
    let config = MonitorConfig::resolve(args.overrides(), file_config);
    if args.verbose {
        tracing::debug!("Resolved config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        exit_with_config_error(&e);
    }

    let source = ImoovaSource::new(&config.source_url, config.source_timeout)
        .unwrap_or_else(|e| exit_with_config_error(&e));
    let sink = TelegramSink::new(config.notifier_token.clone(), config.notifier_timeout)
        .unwrap_or_else(|e| exit_with_config_error(&e));

    // 第一個週期開始前就要註冊好
    let shutdown = shutdown::install_shutdown_signal()
        .context("Could not install Ctrl-C/SIGTERM handlers")?;

    let storage = LocalStorage::new(".");
    let store = SeenStore::load(storage, config.seen_store_path.clone()).await;

    let mut monitor = Monitor::new(config, source, sink, store, chrono::Utc::now());
    monitor.run(shutdown).await;

    tracing::info!("✅ camper-watch stopped cleanly");
    Ok(())
}

fn exit_with_config_error(e: &MonitorError) -> ! {
    tracing::error!(
        "❌ Configuration validation failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(1);
}
