//! Library root for `pr-notifier`.
//!
//! Pr-notifier receives pull-request events from CI workflows and announces
//! them in a Telegram chat:
//! - New pull requests, review requests and re-requests
//! - Review outcomes (approvals, change requests, comments)
//! - Failed test and lint runs
//!
//! Source handles are translated to chat handles through an optional mapping
//! file, titles are cleaned for Markdown, and each event kind has a fixed
//! message template. The chat platform sits behind a trait so it can be
//! replaced or mocked.

pub mod base;
pub mod interaction;
pub mod notification;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the pr-notifier runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with the chat client and translation components
/// - Serves webhooks until shutdown
pub async fn start(config: Config) -> Void {
    info!("Starting pr-notifier ...");

    // Start the crypto provider; an already-installed provider is fine.
    let _ = crypto::ring::default_provider().install_default();

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
