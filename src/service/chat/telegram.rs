//! Telegram Bot API implementation of the chat client.

use std::{sync::Arc, time::Duration};

use anyhow::anyhow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{info, instrument};

use crate::base::{
    config::Config,
    types::{Res, Void},
};

use super::{ChatClient, GenericChatClient};

// Extra methods on `ChatClient` applied by the telegram implementation.

impl ChatClient {
    /// Creates a new Telegram chat client.
    pub async fn telegram(config: &Config) -> Res<Self> {
        let client = TelegramChatClient::new(config).await?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Wire types.

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    username: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<i64>,
}

// Specific implementations.

/// Telegram client implementation.
///
/// Every API call is bounded by `telegram_timeout_secs`, so a stalled request
/// fails instead of holding up the delivery queue.
#[derive(Clone)]
pub struct TelegramChatClient {
    client: reqwest::Client,
    base_url: String,
    chat_id: i64,
    thread_id: Option<i64>,
}

impl TelegramChatClient {
    /// Create a new Telegram chat client.
    ///
    /// Calls `getMe`, so an invalid token fails here rather than on the first send.
    #[instrument(name = "TelegramChatClient::new", skip_all)]
    pub async fn new(config: &Config) -> Res<Self> {
        let client = Self::build(config)?;

        let me: BotUser = call(&client.client, &client.base_url, "getMe", &serde_json::json!({})).await?;

        info!("Telegram bot username: {}", me.username.as_deref().unwrap_or("<none>"));

        Ok(client)
    }

    /// Set up the HTTP client without talking to Telegram.
    fn build(config: &Config) -> Res<Self> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(config.telegram_timeout_secs)).build()?;
        let base_url = format!("{}/bot{}", config.telegram_api_url.trim_end_matches('/'), config.telegram_bot_token);

        Ok(Self {
            client,
            base_url,
            chat_id: config.telegram_chat_id,
            thread_id: config.telegram_thread_id.filter(|id| *id != 0),
        })
    }
}

#[async_trait]
impl GenericChatClient for TelegramChatClient {
    #[instrument(skip_all, fields(chat_id = self.chat_id))]
    async fn send_message(&self, text: &str) -> Void {
        let request = SendMessageRequest {
            chat_id: self.chat_id,
            text,
            parse_mode: "Markdown",
            reply_to_message_id: self.thread_id,
        };

        let _: serde_json::Value = call(&self.client, &self.base_url, "sendMessage", &request)
            .await
            .map_err(|e| anyhow!("Failed to send message to chat {}: {}", self.chat_id, e))?;

        Ok(())
    }
}

/// Call a Bot API method and unwrap its response envelope.
async fn call<B, T>(client: &reqwest::Client, base_url: &str, method: &str, body: &B) -> Res<T>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    // The token is part of the URL, so keep it out of error messages.
    let response = client
        .post(format!("{base_url}/{method}"))
        .json(body)
        .send()
        .await
        .map_err(|e| anyhow!("Telegram `{}` request failed: {}", method, e.without_url()))?;
    let status = response.status();
    let envelope: ApiResponse<T> = response.json().await.map_err(|e| anyhow!("Telegram `{}` returned {} with an unreadable body: {}", method, status, e.without_url()))?;

    if !status.is_success() || !envelope.ok {
        let description = envelope.description.unwrap_or_else(|| status.to_string());
        return Err(anyhow!("Telegram `{}` failed: {}", method, description));
    }

    envelope.result.ok_or_else(|| anyhow!("Telegram `{}` returned no result.", method))
}

// Tests.
