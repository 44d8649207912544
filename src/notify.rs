// src/notify.rs
use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::error::{snippet, NotifyError};

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
pub const MAX_RETRIES: u32 = 10;

/// Outbound chat channel for alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

#[derive(Clone)]
pub struct TelegramConfig {
    pub api_url: String,
    pub bot_token: String,
    pub chat_id: String,
    pub timeout: Duration,
    /// Extra attempts after the first failure. Zero means fire-and-forget.
    pub retries: u32,
    pub retry_delay: Duration,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_url", &self.api_url)
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("timeout", &self.timeout)
            .field("retries", &self.retries)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct BotApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends alerts through the Telegram Bot API `sendMessage` call.
pub struct TelegramNotifier {
    http: Client,
    endpoint: String,
    chat_id: String,
    retries: u32,
    retry_delay: Duration,
}

impl TelegramNotifier {
    pub fn new(cfg: &TelegramConfig) -> Result<Self, NotifyError> {
        let http = Client::builder().timeout(cfg.timeout).build()?;
        let endpoint = format!(
            "{}/bot{}/sendMessage",
            cfg.api_url.trim_end_matches('/'),
            cfg.bot_token
        );

        Ok(Self {
            http,
            endpoint,
            chat_id: cfg.chat_id.clone(),
            retries: cfg.retries,
            retry_delay: cfg.retry_delay,
        })
    }

    async fn send_once(&self, text: &str) -> Result<(), NotifyError> {
        let payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true
        });

        let resp = self.http.post(&self.endpoint).json(&payload).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        let parsed = serde_json::from_str::<BotApiResponse>(&body).ok();
        if status.is_success() && parsed.as_ref().map_or(true, |r| r.ok) {
            return Ok(());
        }

        let description = parsed
            .and_then(|r| r.description)
            .unwrap_or_else(|| snippet(&body));
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            description,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let attempts = self.retries.saturating_add(1);
        let mut attempt = 1;

        loop {
            match self.send_once(text).await {
                Ok(()) => {
                    info!("📤 Alert sent");
                    return Ok(());
                }
                Err(e) if attempt < attempts => {
                    warn!(attempt, error = %e, "⚠️ Alert send failed. Retrying...");
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
