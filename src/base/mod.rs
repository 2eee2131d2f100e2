//! Core components, types, and utilities for pr-notifier.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - Common types, result handling, and the webhook entity model.

pub mod config;
pub mod types;
