use crate::domain::ports::NotifierSink;
use crate::utils::error::{MonitorError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

/// Telegram Bot API 的 `sendMessage`。訊息以純文字送出。
pub struct TelegramSink {
    client: Client,
    token: String,
    api_base: String,
}

impl TelegramSink {
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::config(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            client,
            token: token.into(),
            api_base: TELEGRAM_API_BASE.to_string(),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

#[async_trait]
impl NotifierSink for TelegramSink {
    async fn send(&self, target: &str, text: &str) -> Result<()> {
        let payload = SendMessage {
            chat_id: target,
            text,
        };

        // URL 含 token，錯誤訊息裡不能帶出來
        let response = self
            .client
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|e| MonitorError::delivery(target, e.without_url().to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let description = response
            .json::<ApiResponse>()
            .await
            .ok()
            .filter(|body| !body.ok)
            .and_then(|body| body.description)
            .unwrap_or_else(|| status.to_string());

        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            Err(MonitorError::delivery(target, description))
        } else {
            Err(MonitorError::rejected(target, description))
        }
    }
}
