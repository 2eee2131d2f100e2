//! Runtime services and shared state for pr-notifier.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    interaction::{dispatch::Dispatcher, webhook},
    notification::{title::TitleSanitizer, username::UsernameResolver},
    service::chat::ChatClient,
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the configuration, chat client, and the translation
/// components every request handler needs. It is designed to be trivially
/// cloneable, allowing it to be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The chat client instance.
    pub chat: ChatClient,
    /// Username overrides, loaded once on first use.
    pub names: Arc<UsernameResolver>,
    /// Title decoding and cleanup.
    pub titles: TitleSanitizer,
    /// Delivery of composed messages.
    pub dispatcher: Dispatcher,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the Telegram client.
        let chat = ChatClient::telegram(&config).await?;

        Ok(Self::with_chat(config, chat))
    }

    /// Assemble a runtime around an existing chat client.
    ///
    /// Must be called inside a tokio runtime when dispatch is detached.
    pub fn with_chat(config: Config, chat: ChatClient) -> Self {
        let names = Arc::new(UsernameResolver::new(config.username_mapping_path.clone()));
        let titles = TitleSanitizer::new(config.title_encoding);
        let dispatcher = Dispatcher::new(config.dispatch_mode, config.dispatch_queue_capacity, chat.clone());

        Self {
            config,
            chat,
            names,
            titles,
            dispatcher,
        }
    }

    /// Serve webhooks until Ctrl-C.
    pub async fn start(&self) -> Void {
        let listener = TcpListener::bind(&self.config.listen_address).await?;

        self.serve(listener, async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down ...");
        })
        .await
    }

    /// Serve webhooks on `listener` until `shutdown` resolves.
    ///
    /// In-flight requests finish first, then the dispatch queue is drained, so
    /// every accepted notification is handed to the chat client before this returns.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Void
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("Listening for webhooks on {} ({:?} dispatch) ...", listener.local_addr()?, self.dispatcher.mode());

        let served = axum::serve(listener, webhook::router(self.clone())).with_graceful_shutdown(shutdown).await;

        self.dispatcher.shutdown().await;

        Ok(served?)
    }
}
