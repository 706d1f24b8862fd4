use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Fetch failed: {message}")]
    FetchError { message: String },

    #[error("Parse failed: {message}")]
    ParseError { message: String },

    #[error("Delivery to {target} failed: {message}")]
    DeliveryError { target: String, message: String },

    #[error("Delivery to {target} rejected: {message}")]
    DeliveryRejected { target: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Fetch,
    Parse,
    Delivery,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MonitorError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn fetch(message: impl Into<String>) -> Self {
        Self::FetchError {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    pub fn delivery(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DeliveryError {
            target: target.into(),
            message: message.into(),
        }
    }

    /// 對方明確拒絕 (例如 chat 不存在)，重試沒有意義
    pub fn rejected(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DeliveryRejected {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::TomlError(_) => ErrorCategory::Config,
            Self::FetchError { .. } => ErrorCategory::Fetch,
            Self::ParseError { .. } | Self::SerializationError(_) => ErrorCategory::Parse,
            Self::DeliveryError { .. } | Self::DeliveryRejected { .. } => ErrorCategory::Delivery,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Parse => ErrorSeverity::Low,
            ErrorCategory::Fetch | ErrorCategory::Delivery => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::High,
            ErrorCategory::Config => ErrorSeverity::Critical,
        }
    }

    /// 只有設定錯誤可以終止程序，其餘錯誤都在元件邊界被吸收
    pub fn is_fatal(&self) -> bool {
        self.category() == ErrorCategory::Config
    }

    /// 網路類錯誤可以重試
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::FetchError { .. } | Self::DeliveryError { .. })
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::MissingConfigError { field } => {
                format!("Required setting '{}' is not configured", field)
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Config => {
                "Check the config file, environment variables (TELEGRAM_TOKEN, TELEGRAM_CHATS) and CLI flags"
            }
            ErrorCategory::Fetch => "The listings site may be down or its markup changed; the monitor will retry",
            ErrorCategory::Parse => "The listing was skipped; inspect the source page if this keeps happening",
            ErrorCategory::Delivery => "Verify the bot token and that the bot can post to the chat",
            ErrorCategory::System => "Check file permissions and free disk space for the seen-offers file",
        }
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_config_errors_are_fatal() {
        assert!(MonitorError::config("bad").is_fatal());
        assert!(MonitorError::MissingConfigError {
            field: "notifier_token".to_string()
        }
        .is_fatal());
        assert!(!MonitorError::fetch("timeout").is_fatal());
        assert!(!MonitorError::parse("no link").is_fatal());
        assert!(!MonitorError::delivery("42", "500").is_fatal());
        assert!(!MonitorError::rejected("42", "chat not found").is_fatal());
        assert!(!MonitorError::IoError(std::io::Error::other("disk")).is_fatal());
    }

    #[test]
    fn test_severity_ordering() {
        assert_eq!(MonitorError::parse("x").severity(), ErrorSeverity::Low);
        assert_eq!(MonitorError::fetch("x").severity(), ErrorSeverity::Medium);
        assert!(MonitorError::config("x").severity() > MonitorError::fetch("x").severity());
    }

    #[test]
    fn test_rejected_delivery_is_not_transient() {
        assert!(MonitorError::delivery("42", "timeout").is_transient());
        assert!(!MonitorError::rejected("42", "chat not found").is_transient());
        assert!(!MonitorError::parse("x").is_transient());
    }

    #[test]
    fn test_user_friendly_message_for_missing_field() {
        let err = MonitorError::MissingConfigError {
            field: "notifier_token".to_string(),
        };
        assert_eq!(
            err.user_friendly_message(),
            "Required setting 'notifier_token' is not configured"
        );
    }
}
