use std::time::Duration;

use jobwatch_core::{classify_api_error, render_message, DeliveryFailure, JobRecord, RetryPolicy};
use jobwatch_logging::{watch_debug, watch_error, watch_info, watch_warn};
use reqwest::header::CONTENT_TYPE;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("message is too long: {0}")]
    TooLong(String),
    #[error("invalid destination: {0}")]
    InvalidDestination(String),
    #[error("delivery failed: {0}")]
    Transient(String),
    #[error("notifier setup failed: {0}")]
    Setup(String),
}

impl NotifyError {
    fn from_api(description: String) -> Self {
        match classify_api_error(&description) {
            DeliveryFailure::TooLong => NotifyError::TooLong(description),
            DeliveryFailure::InvalidDestination => NotifyError::InvalidDestination(description),
            DeliveryFailure::Transient => NotifyError::Transient(description),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, NotifyError::Transient(_))
    }
}

/// Outbound channel for postings.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one record. `false` means it was not delivered and must not
    /// be marked as posted.
    async fn send(&self, record: &JobRecord, include_date: bool) -> bool;
}

#[derive(Debug, Clone)]
pub struct TelegramSettings {
    pub api_base: String,
    pub bot_token: String,
    pub chat_id: String,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
}

impl TelegramSettings {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            retry: RetryPolicy::notification(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Bot API `sendMessage` in HTML parse mode.
pub struct TelegramNotifier {
    settings: TelegramSettings,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(settings: TelegramSettings) -> Result<Self, NotifyError> {
        if settings.bot_token.trim().is_empty() {
            return Err(NotifyError::Setup("bot token is empty".to_string()));
        }
        if settings.chat_id.trim().is_empty() {
            return Err(NotifyError::InvalidDestination("chat_id is empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| NotifyError::Setup(err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.bot_token
        )
    }

    /// Request body for one record. The "View Job" button is only attached
    /// to real web links.
    pub fn payload(&self, record: &JobRecord, include_date: bool) -> Value {
        let mut payload = json!({
            "chat_id": self.settings.chat_id,
            "text": render_message(record, include_date),
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });
        if record.link.starts_with("http://") || record.link.starts_with("https://") {
            payload["reply_markup"] = json!({
                "inline_keyboard": [[{ "text": "View Job", "url": record.link }]]
            });
        }
        payload
    }

    /// Sends with retries for transient failures only.
    pub async fn deliver(&self, record: &JobRecord, include_date: bool) -> Result<(), NotifyError> {
        let body = serde_json::to_vec(&self.payload(record, include_date))
            .map_err(|err| NotifyError::Setup(err.to_string()))?;
        let policy = self.settings.retry;
        let mut attempt = 1;
        loop {
            match self.post(body.clone()).await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_retryable() && policy.has_attempts_after(attempt) => {
                    let delay = policy.backoff.delay_after(attempt, &mut rand::thread_rng());
                    watch_warn!(
                        "Telegram send attempt {}/{} failed: {}. Retrying in {:.1}s",
                        attempt,
                        policy.max_attempts,
                        err,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn post(&self, body: Vec<u8>) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.endpoint())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| NotifyError::Transient(err.without_url().to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| NotifyError::Transient(err.without_url().to_string()))?;
        let parsed: Option<Value> = serde_json::from_str(&text).ok();
        let accepted = parsed
            .as_ref()
            .and_then(|value| value.get("ok"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if status.is_success() && accepted {
            return Ok(());
        }

        let description = parsed
            .as_ref()
            .and_then(|value| value.get("description"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {status}"));
        Err(NotifyError::from_api(description))
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, record: &JobRecord, include_date: bool) -> bool {
        watch_debug!("Sending Telegram message for '{}'", record.title);
        match self.deliver(record, include_date).await {
            Ok(()) => {
                watch_info!("Telegram message sent for '{}'", record.title);
                true
            }
            Err(err @ NotifyError::TooLong(_)) => {
                watch_error!("Not retrying '{}': {}", record.title, err);
                false
            }
            Err(err @ NotifyError::InvalidDestination(_)) => {
                watch_error!(
                    "Telegram rejected the destination for '{}': {}. Check TELEGRAM_CHAT_ID and that the bot is in the chat.",
                    record.title,
                    err
                );
                false
            }
            Err(err) => {
                watch_error!("Giving up on Telegram message for '{}': {}", record.title, err);
                false
            }
        }
    }
}
