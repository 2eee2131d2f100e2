//! Source handle to chat handle resolution.
//!
//! The mapping file is loaded lazily, once, on the first resolution. A failed
//! load is logged and resolution passes handles through unchanged; the next
//! resolution tries to load again.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use anyhow::Context;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

use crate::base::types::{Res, Username};

/// Source handle to chat handle overrides.
pub type UsernameMapping = HashMap<String, String>;

/// A resolved chat handle, ready to be rendered into a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention(String);

impl Mention {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// The bare resolved handle.
    pub fn handle(&self) -> &str {
        &self.0
    }

    /// `@handle`, which notifies the user in the chat.
    pub fn tag(&self) -> String {
        format!("@{}", self.0)
    }

    /// A Markdown link to the user's chat profile.
    pub fn link(&self) -> String {
        format!("[@{handle}](tg://resolve?domain={handle})", handle = self.0)
    }
}

impl fmt::Display for Mention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves source handles through an optional mapping file.
///
/// Shared between request handlers; concurrent first resolutions wait on a
/// single load.
#[derive(Debug, Default)]
pub struct UsernameResolver {
    path: Option<PathBuf>,
    mapping: OnceCell<UsernameMapping>,
    load_attempts: AtomicUsize,
}

impl UsernameResolver {
    /// Create a resolver reading overrides from `path`, or a passthrough resolver when `None`.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            mapping: OnceCell::new(),
            load_attempts: AtomicUsize::new(0),
        }
    }

    /// Create a resolver with an already-loaded mapping.
    pub fn with_mapping(mapping: UsernameMapping) -> Self {
        Self {
            path: None,
            mapping: OnceCell::new_with(Some(mapping)),
            load_attempts: AtomicUsize::new(0),
        }
    }

    /// Number of times the mapping file has been read.
    pub fn load_attempts(&self) -> usize {
        self.load_attempts.load(Ordering::SeqCst)
    }

    /// Resolve `username` to its chat handle, falling back to the handle itself.
    pub async fn resolve(&self, username: &Username) -> String {
        self.mention(username).await.0
    }

    /// `@` plus the resolved handle.
    pub async fn tag(&self, username: &Username) -> String {
        self.mention(username).await.tag()
    }

    /// Markdown mention link for the resolved handle.
    pub async fn link(&self, username: &Username) -> String {
        self.mention(username).await.link()
    }

    /// Resolve `username` into a [`Mention`].
    pub async fn mention(&self, username: &Username) -> Mention {
        let resolved = self.mapping().await.and_then(|mapping| mapping.get(username.as_str()));

        match resolved {
            Some(handle) => Mention::new(handle.clone()),
            None => Mention::new(username.as_str()),
        }
    }

    /// The loaded mapping, loading it first if needed.
    ///
    /// `None` when loading failed; the cell stays empty so the next call retries.
    async fn mapping(&self) -> Option<&UsernameMapping> {
        match self.mapping.get_or_try_init(|| self.load()).await {
            Ok(mapping) => Some(mapping),
            Err(err) => {
                warn!("Failed to load username mapping, passing handles through: {:#}", err);
                None
            }
        }
    }

    #[instrument(skip(self))]
    async fn load(&self) -> Res<UsernameMapping> {
        let Some(path) = &self.path else {
            info!("No username mapping configured, passing handles through.");
            return Ok(UsernameMapping::new());
        };

        self.load_attempts.fetch_add(1, Ordering::SeqCst);

        let mapping = read_mapping(path).await?;

        info!("Loaded {} username overrides from `{}`.", mapping.len(), path.display());

        Ok(mapping)
    }
}

/// Read and parse a YAML mapping file.
async fn read_mapping(path: &Path) -> Res<UsernameMapping> {
    let data = tokio::fs::read_to_string(path).await.with_context(|| format!("reading `{}`", path.display()))?;

    parse_mapping(&data).with_context(|| format!("parsing `{}`", path.display()))
}

fn parse_mapping(data: &str) -> Res<UsernameMapping> {
    if data.trim().is_empty() {
        return Ok(UsernameMapping::new());
    }

    let mut mapping: UsernameMapping = serde_yaml::from_str(data)?;

    mapping.retain(|source, display| {
        let keep = !display.trim().is_empty();
        if !keep {
            warn!("Ignoring empty override for `{}`.", source);
        }
        keep
    });

    Ok(mapping)
}

// Tests.
