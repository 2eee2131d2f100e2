//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, path::PathBuf, sync::Arc};

use serde::Deserialize;

use super::types::{Res, Void};

/// Default Telegram Bot API base URL.
fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

/// Default bound on a single Telegram API call, in seconds.
fn default_telegram_timeout_secs() -> u64 {
    10
}

/// Default address for the webhook listener.
fn default_listen_address() -> String {
    "0.0.0.0:8080".to_string()
}

/// Default number of composed messages waiting for delivery.
fn default_dispatch_queue_capacity() -> usize {
    64
}

/// How pull-request titles are encoded on the wire.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TitleEncoding {
    /// Titles are base64 text, so shell quoting in CI cannot mangle them.
    #[default]
    Base64,
    /// Titles are sent as-is.
    Plain,
}

/// When a composed message is handed to the chat client.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Queue the message and answer the webhook right away.
    ///
    /// Delivery failures are only logged: the caller has already received 200.
    #[default]
    Detached,
    /// Send before answering; delivery failures become a 500.
    Sync,
}

/// Configuration for the pr-notifier application.
#[derive(Debug, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConfigInner {
    /// Telegram bot token (`TELEGRAM_BOT_TOKEN`).
    pub telegram_bot_token: String,
    /// Chat that receives every notification (`TELEGRAM_CHAT_ID`).
    pub telegram_chat_id: i64,
    /// Optional message to reply to, which keeps notifications in one thread (`TELEGRAM_THREAD_ID`).
    #[serde(default)]
    pub telegram_thread_id: Option<i64>,
    /// Telegram Bot API base URL (`TELEGRAM_API_URL`).
    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,
    /// Upper bound on one Telegram API call, connect to last byte (`TELEGRAM_TIMEOUT_SECS`).
    #[serde(default = "default_telegram_timeout_secs")]
    pub telegram_timeout_secs: u64,
    /// Optional YAML file mapping source handles to chat handles (`USERNAME_MAPPING_PATH`).
    #[serde(default)]
    pub username_mapping_path: Option<PathBuf>,
    /// Wire encoding of pull-request titles (`TITLE_ENCODING`).
    #[serde(default)]
    pub title_encoding: TitleEncoding,
    /// Whether webhooks wait for delivery (`DISPATCH_MODE`).
    #[serde(default)]
    pub dispatch_mode: DispatchMode,
    /// Capacity of the detached delivery queue (`DISPATCH_QUEUE_CAPACITY`).
    #[serde(default = "default_dispatch_queue_capacity")]
    pub dispatch_queue_capacity: usize,
    /// Address the webhook listener binds to (`LISTEN_ADDRESS`).
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            telegram_bot_token: String::new(),
            telegram_chat_id: 0,
            telegram_thread_id: None,
            telegram_api_url: default_telegram_api_url(),
            telegram_timeout_secs: default_telegram_timeout_secs(),
            username_mapping_path: None,
            title_encoding: TitleEncoding::default(),
            dispatch_mode: DispatchMode::default(),
            dispatch_queue_capacity: default_dispatch_queue_capacity(),
            listen_address: default_listen_address(),
        }
    }
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("PR_NOTIFIER"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    fn validate(&self) -> Void {
        if self.telegram_bot_token.trim().is_empty() {
            return Err(anyhow::anyhow!("Telegram bot token must be set."));
        }

        if self.telegram_chat_id == 0 {
            return Err(anyhow::anyhow!("Telegram chat ID must be set."));
        }

        if self.telegram_timeout_secs < 1 {
            return Err(anyhow::anyhow!("Telegram timeout must be at least 1 second."));
        }

        if self.dispatch_queue_capacity < 1 {
            return Err(anyhow::anyhow!("Dispatch queue capacity must be at least 1."));
        }

        Ok(())
    }
}

// Tests.
