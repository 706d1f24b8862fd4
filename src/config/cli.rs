use crate::config::{ConfigOverrides, DEFAULT_CONFIG_FILE};
use clap::Parser;
use std::path::PathBuf;

/// 命令列參數。每個旗標都能由對應的環境變數提供，命令列優先。
#[derive(Debug, Clone, Parser)]
#[command(name = "camper-watch")]
#[command(about = "Watch relocation offers and push new matches to Telegram")]
pub struct CliArgs {
    /// Path to configuration file (JSON, or TOML when it ends in .toml)
    #[arg(long, env = "CONFIG_FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Comma-separated list of cities to filter by (e.g. Madrid,Barcelona,Zurich)
    #[arg(long, env = "DEFAULT_CITIES", value_delimiter = ',')]
    pub cities: Option<Vec<String>>,

    /// Telegram bot token used to send notifications
    #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true)]
    pub telegram_token: Option<String>,

    /// Comma-separated list of Telegram chat ids to notify
    #[arg(long, env = "TELEGRAM_CHATS", value_delimiter = ',')]
    pub telegram_chats: Option<Vec<String>>,

    /// Path to the seen offers JSON file
    #[arg(long, env = "SEEN_FILE")]
    pub seen_file: Option<String>,

    /// Days without any notification before a liveness ping is sent
    #[arg(long, env = "HEARTBEAT_DAYS")]
    pub heartbeat_days: Option<u64>,

    /// Seconds to wait between polls
    #[arg(long, env = "POLL_INTERVAL_SECS")]
    pub poll_interval_secs: Option<u64>,

    /// Relocation table URL
    #[arg(long, env = "SOURCE_URL")]
    pub source_url: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl CliArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: Some(self.config.clone()),
            notifier_token: self.telegram_token.clone(),
            notifier_targets: self.telegram_chats.clone(),
            target_cities: self.cities.clone(),
            seen_store_path: self.seen_file.clone(),
            heartbeat_days: self.heartbeat_days,
            poll_interval_secs: self.poll_interval_secs,
            source_url: self.source_url.clone(),
        }
    }
}
