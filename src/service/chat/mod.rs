//! Chat service integration for pr-notifier.
//!
//! This module provides the outbound side of the service: delivering a
//! composed Markdown message to the one configured destination.
//!
//! It defines the `GenericChatClient` trait that can be implemented for different
//! chat services, with a default implementation for Telegram.

pub mod telegram;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::Void;

// Traits.

/// Generic "chat" trait that clients must implement.
///
/// The destination (chat and thread) is fixed when the client is created, so
/// callers only supply the message text.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Send a Markdown message to the configured destination.
    ///
    /// Fails on transport or authorization errors. Never retries.
    async fn send_message(&self, text: &str) -> Void;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}
