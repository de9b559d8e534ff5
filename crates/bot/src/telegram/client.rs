//! HTTP client for the Telegram Bot API.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use super::types::{ApiResponse, BotIdentity, ReplyMarkup, SendMessage, Update};

const API_BASE: &str = "https://api.telegram.org";

/// Long-poll wait passed to `getUpdates`, in seconds.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Telegram Bot API errors.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Api(String),
}

/// Telegram Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    inner: Arc<TelegramClientInner>,
}

struct TelegramClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    /// Create a new client for a bot token.
    ///
    /// # Panics
    ///
    /// Panics if the underlying HTTP client cannot be built.
    #[must_use]
    pub fn new(bot_token: &SecretString) -> Self {
        // Timeout must exceed the long-poll wait.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            inner: Arc::new(TelegramClientInner {
                client,
                base_url: format!("{API_BASE}/bot{}", bot_token.expose_secret()),
            }),
        }
    }

    /// Verify the token and fetch the bot's own identity.
    ///
    /// # Errors
    ///
    /// Returns `TelegramError` if the request fails or the token is bad.
    pub async fn get_me(&self) -> Result<BotIdentity, TelegramError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Long-poll for updates after `offset`.
    ///
    /// # Errors
    ///
    /// Returns `TelegramError` if the request fails.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &serde_json::json!({
                "offset": offset,
                "timeout": POLL_TIMEOUT_SECS,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    /// Send a text message, optionally with a reply keyboard.
    ///
    /// # Errors
    ///
    /// Returns `TelegramError` if the request fails or Telegram rejects it.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<(), TelegramError> {
        let _: super::types::Message = self
            .call(
                "sendMessage",
                &SendMessage {
                    chat_id,
                    text,
                    reply_markup,
                },
            )
            .await?;
        Ok(())
    }

    async fn call<T, B>(&self, method: &str, body: &B) -> Result<T, TelegramError>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let response: ApiResponse<T> = self
            .inner
            .client
            .post(format!("{}/{method}", self.inner.base_url))
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(TelegramError::Api(
                response
                    .description
                    .unwrap_or_else(|| "unknown error".to_owned()),
            ));
        }
        response
            .result
            .ok_or_else(|| TelegramError::Api("ok response without result".to_owned()))
    }
}
