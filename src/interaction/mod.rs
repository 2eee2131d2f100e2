//! Inbound webhook handling for pr-notifier.
//!
//! This module provides functionality for handling pull-request events:
//! - Receiving and decoding webhook bodies
//! - Rendering notifications for them
//! - Handing messages to the chat client, inline or through a queue

pub mod dispatch;
pub mod webhook;
