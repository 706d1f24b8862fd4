use crate::utils::error::{MonitorError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// chat id 在 JSON 裡常常直接寫成數字
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Text(String),
    Number(i64),
}

impl ChatId {
    pub fn into_string(self) -> String {
        match self {
            ChatId::Text(s) => s,
            ChatId::Number(n) => n.to_string(),
        }
    }
}

/// 設定檔 (config.json 或 *.toml) 的內容，每個欄位都是選填。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    pub telegram_token: Option<String>,
    pub telegram_chats: Option<Vec<ChatId>>,
    pub default_cities: Option<Vec<String>>,
    pub heartbeat_days: Option<u64>,
    pub seen_file: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub source_url: Option<String>,
}

impl FileConfig {
    /// 檔案不存在時回傳 `Ok(None)`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(MonitorError::IoError(e)),
        };

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Self::from_toml_str(&content).map(Some)
        } else {
            Self::from_json_str(&content).map(Some)
        }
    }

    /// 讀不到或格式錯誤只記警告，沿用其他來源的設定
    pub fn load_or_warn<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();
        match Self::from_file(path) {
            Ok(Some(config)) => {
                tracing::info!("📁 Loaded configuration from {}", path.display());
                Some(config)
            }
            Ok(None) => {
                tracing::debug!("No config file at {}", path.display());
                None
            }
            Err(e) => {
                tracing::warn!("⚠️ Could not load {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content)?;
        Ok(serde_json::from_str(&processed)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content)?;
        Ok(toml::from_str(&processed)?)
    }
}

/// 替換環境變數 (例如 ${TELEGRAM_TOKEN})，沒設定的保留原樣
fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| MonitorError::config(format!("env placeholder pattern: {}", e)))?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    });

    Ok(result.to_string())
}
