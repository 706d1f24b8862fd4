#[cfg(feature = "cli")]
pub mod cli;
pub mod file;

pub use file::FileConfig;

use crate::core::dispatcher::RetryPolicy;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_SEEN_FILE: &str = "seen_offers.json";
pub const DEFAULT_SOURCE_URL: &str = "https://www.imoova.com/en/relocations/table?region=EU";
pub const DEFAULT_HEARTBEAT_DAYS: u64 = 7;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 900;

/// CLI 與環境變數已經合併好的值 (CLI 優先)，`None` 代表兩者都沒給。
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub notifier_token: Option<String>,
    pub notifier_targets: Option<Vec<String>>,
    pub target_cities: Option<Vec<String>>,
    pub seen_store_path: Option<String>,
    pub heartbeat_days: Option<u64>,
    pub poll_interval_secs: Option<u64>,
    pub source_url: Option<String>,
}

/// 程式執行期間不變的設定，由 Monitor 獨占持有。
#[derive(Clone)]
pub struct MonitorConfig {
    pub notifier_token: String,
    pub notifier_targets: Vec<String>,
    pub target_cities: Vec<String>,
    pub config_path: PathBuf,
    pub seen_store_path: String,
    pub source_url: String,
    pub poll_interval: Duration,
    pub liveness_interval: Duration,
    pub source_timeout: Duration,
    pub notifier_timeout: Duration,
    pub delivery_attempts: u32,
    pub retry_base_delay: Duration,
}

impl std::fmt::Debug for MonitorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorConfig")
            .field("notifier_token", &"<redacted>")
            .field("notifier_targets", &self.notifier_targets)
            .field("target_cities", &self.target_cities)
            .field("config_path", &self.config_path)
            .field("seen_store_path", &self.seen_store_path)
            .field("source_url", &self.source_url)
            .field("poll_interval", &self.poll_interval)
            .field("liveness_interval", &self.liveness_interval)
            .field("delivery_attempts", &self.delivery_attempts)
            .finish()
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            notifier_token: String::new(),
            notifier_targets: Vec::new(),
            target_cities: Vec::new(),
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            seen_store_path: DEFAULT_SEEN_FILE.to_string(),
            source_url: DEFAULT_SOURCE_URL.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            liveness_interval: days(DEFAULT_HEARTBEAT_DAYS),
            source_timeout: Duration::from_secs(15),
            notifier_timeout: Duration::from_secs(10),
            delivery_attempts: 3,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl MonitorConfig {
    /// 合併順序：CLI > 環境變數 (已在 `overrides`) > 設定檔 > 預設值
    pub fn resolve(overrides: ConfigOverrides, file: Option<FileConfig>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        let notifier_targets = overrides
            .notifier_targets
            .or_else(|| {
                file.telegram_chats
                    .map(|chats| chats.into_iter().map(|c| c.into_string()).collect())
            })
            .map(|targets| clean_list(&targets))
            .unwrap_or_default();

        let target_cities = overrides
            .target_cities
            .or(file.default_cities)
            .map(|cities| clean_list(&cities))
            .unwrap_or_default();

        Self {
            notifier_token: overrides
                .notifier_token
                .or(file.telegram_token)
                .map(|t| t.trim().to_string())
                .unwrap_or_default(),
            notifier_targets,
            target_cities,
            config_path: overrides.config_path.unwrap_or(defaults.config_path),
            seen_store_path: overrides
                .seen_store_path
                .or(file.seen_file)
                .unwrap_or(defaults.seen_store_path),
            source_url: overrides
                .source_url
                .or(file.source_url)
                .unwrap_or(defaults.source_url),
            poll_interval: overrides
                .poll_interval_secs
                .or(file.poll_interval_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            liveness_interval: overrides
                .heartbeat_days
                .or(file.heartbeat_days)
                .map(days)
                .unwrap_or(defaults.liveness_interval),
            ..defaults
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.delivery_attempts,
            base_delay: self.retry_base_delay,
        }
    }
}

impl Validate for MonitorConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_required_string("notifier_token", &self.notifier_token)?;
        validation::validate_non_empty_list("notifier_targets", &self.notifier_targets)?;
        validation::validate_url("source_url", &self.source_url)?;
        validation::validate_path("seen_store_path", &self.seen_store_path)?;
        validation::validate_positive_number(
            "poll_interval_secs",
            self.poll_interval.as_secs(),
            1,
        )?;
        validation::validate_positive_number(
            "liveness_interval_secs",
            self.liveness_interval.as_secs(),
            1,
        )?;
        validation::validate_positive_number(
            "delivery_attempts",
            u64::from(self.delivery_attempts),
            1,
        )?;

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}

fn days(n: u64) -> Duration {
    Duration::from_secs(n.saturating_mul(24 * 60 * 60))
}

/// 去空白、去掉空值與重複 (保留第一次出現的順序)
pub fn clean_list(values: &[String]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(values.len());
    for value in values.iter().map(|v| v.trim()) {
        if !value.is_empty() && !cleaned.iter().any(|c| c == value) {
            cleaned.push(value.to_string());
        }
    }
    cleaned
}
