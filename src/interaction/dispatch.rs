//! Hands composed messages to the chat client.
//!
//! In detached mode messages go through a bounded queue drained by a single
//! worker task. Delivery is at-most-once: a failed send is logged and dropped,
//! and the webhook caller has already been answered. On shutdown the queue is
//! closed and everything already accepted is still delivered.

use std::sync::Arc;

use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
};
use tracing::{Instrument, error, info, info_span, instrument};

use crate::{
    base::{
        config::DispatchMode,
        types::{EventKind, Void},
    },
    service::chat::ChatClient,
};

/// A composed message waiting for delivery.
#[derive(Debug)]
struct Outgoing {
    kind: EventKind,
    text: String,
}

/// What the worker receives.
#[derive(Debug)]
enum Command {
    Deliver(Outgoing),
    /// Stop accepting messages, drain what is queued, then exit.
    Close,
}

/// Delivers messages either through the worker queue or inline.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Dispatcher {
    chat: ChatClient,
    queue: Option<mpsc::Sender<Command>>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Dispatcher {
    /// Create a dispatcher; detached mode spawns the delivery worker, so a tokio runtime must be running.
    pub fn new(mode: DispatchMode, capacity: usize, chat: ChatClient) -> Self {
        let (queue, worker) = match mode {
            DispatchMode::Sync => (None, None),
            DispatchMode::Detached => {
                let (tx, rx) = mpsc::channel(capacity.max(1));
                let worker = tokio::spawn(run_worker(rx, chat.clone()).instrument(info_span!("dispatch_worker")));
                (Some(tx), Some(worker))
            }
        };

        Self {
            chat,
            queue,
            worker: Arc::new(Mutex::new(worker)),
        }
    }

    pub fn mode(&self) -> DispatchMode {
        match self.queue {
            Some(_) => DispatchMode::Detached,
            None => DispatchMode::Sync,
        }
    }

    /// Deliver `text`, or queue it for delivery in detached mode.
    ///
    /// In detached mode an error means the message could not be queued;
    /// delivery failures never reach the caller.
    #[instrument(skip(self, text))]
    pub async fn dispatch(&self, kind: EventKind, text: String) -> Void {
        match &self.queue {
            Some(queue) => queue
                .send(Command::Deliver(Outgoing { kind, text }))
                .await
                .map_err(|_| anyhow::anyhow!("Dispatch queue is closed.")),
            None => self.chat.send_message(&text).await,
        }
    }

    /// Close the queue and wait until every accepted message has been handed to the chat client.
    ///
    /// Later calls to `dispatch` fail. Does nothing in sync mode, or when already shut down.
    #[instrument(skip_all)]
    pub async fn shutdown(&self) {
        let Some(worker) = self.worker.lock().await.take() else {
            return;
        };

        if let Some(queue) = &self.queue {
            // Waits behind a full queue while the worker drains it; fails only if the worker is gone.
            let _ = queue.send(Command::Close).await;
        }

        if let Err(err) = worker.await {
            error!("Dispatch worker failed: {}", err);
        }
    }
}

/// Deliver queued messages in order until the queue is closed and empty.
async fn run_worker(mut rx: mpsc::Receiver<Command>, chat: ChatClient) {
    while let Some(command) = rx.recv().await {
        let outgoing = match command {
            Command::Deliver(outgoing) => outgoing,
            Command::Close => {
                info!("Dispatch queue closing, draining pending messages.");
                rx.close();
                continue;
            }
        };

        match chat.send_message(&outgoing.text).await {
            Ok(()) => info!("Delivered `{}` notification.", outgoing.kind),
            Err(err) => error!("Error while delivering `{}` notification: {}", outgoing.kind, err),
        }
    }

    info!("Dispatch queue closed, worker exiting.");
}

// Tests.

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use async_trait::async_trait;
    use mockall::mock;

    use super::*;
    use crate::service::chat::GenericChatClient;

    mock! {
        Chat {}

        #[async_trait]
        impl GenericChatClient for Chat {
            async fn send_message(&self, text: &str) -> Void;
        }
    }

    #[tokio::test]
    async fn test_sync_dispatch_surfaces_delivery_errors() {
        let mut chat = MockChat::new();
        chat.expect_send_message().times(1).returning(|_| Err(anyhow::anyhow!("Bad Request: chat not found")));

        let dispatcher = Dispatcher::new(DispatchMode::Sync, 1, ChatClient::new(Arc::new(chat)));

        assert_eq!(dispatcher.mode(), DispatchMode::Sync);
        assert!(dispatcher.dispatch(EventKind::Opened, "text".to_string()).await.is_err());
    }

    #[tokio::test]
    async fn test_detached_dispatch_keeps_order_and_swallows_failures() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut chat = MockChat::new();
        chat.expect_send_message().returning(move |text| {
            let _ = tx.send(text.to_string());
            if text.contains("fail") { Err(anyhow::anyhow!("Too Many Requests")) } else { Ok(()) }
        });

        let dispatcher = Dispatcher::new(DispatchMode::Detached, 4, ChatClient::new(Arc::new(chat)));

        for text in ["first", "fail", "third"] {
            assert!(dispatcher.dispatch(EventKind::Approved, text.to_string()).await.is_ok());
        }

        let mut delivered = Vec::new();
        while delivered.len() < 3 {
            let text = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
            delivered.push(text);
        }

        assert_eq!(dispatcher.mode(), DispatchMode::Detached);
        assert_eq!(delivered, vec!["first", "fail", "third"]);
    }

    #[tokio::test]
    async fn test_shutdown_drains_queued_messages() {
        let delivered = Arc::new(std::sync::Mutex::new(Vec::new()));
        let recorder = delivered.clone();

        let mut chat = MockChat::new();
        chat.expect_send_message().times(5).returning(move |text| {
            // Keep the worker busy so messages are still queued at shutdown.
            std::thread::sleep(Duration::from_millis(20));
            recorder.lock().unwrap().push(text.to_string());
            Ok(())
        });

        let dispatcher = Dispatcher::new(DispatchMode::Detached, 8, ChatClient::new(Arc::new(chat)));

        for n in 0..5 {
            dispatcher.dispatch(EventKind::Opened, format!("message {n}")).await.unwrap();
        }

        tokio::time::timeout(Duration::from_secs(5), dispatcher.shutdown()).await.unwrap();

        assert_eq!(*delivered.lock().unwrap(), (0..5).map(|n| format!("message {n}")).collect::<Vec<_>>());
        assert!(dispatcher.dispatch(EventKind::Opened, "late".to_string()).await.is_err());

        // A second shutdown, e.g. from another clone, returns immediately.
        dispatcher.clone().shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_is_a_no_op_in_sync_mode() {
        let mut chat = MockChat::new();
        chat.expect_send_message().times(1).returning(|_| Ok(()));

        let dispatcher = Dispatcher::new(DispatchMode::Sync, 1, ChatClient::new(Arc::new(chat)));

        dispatcher.shutdown().await;

        assert!(dispatcher.dispatch(EventKind::Commented, "text".to_string()).await.is_ok());
    }
}
