//! Versioned remote content storage
//!
//! The persisted collection and archived uploads live in a store addressed
//! by path. Every read returns an opaque [`VersionToken`]; a write must
//! present the token it read (or none, to create) and fails with
//! [`StoreError::Conflict`] if the store has moved on.

pub mod github;

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tokio::sync::Mutex;

/// Remote store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Nothing stored at the path
    #[error("Not found: {0}")]
    NotFound(String),

    /// Version token missing, stale, or unexpected
    #[error("Version conflict: {0}")]
    Conflict(String),

    #[error("Network error: {0}")]
    Network(String),

    /// Local file access failed
    #[error("IO error: {0}")]
    Io(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Response body could not be understood
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Opaque concurrency marker returned by a read
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content read from the store with the version it was read at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    pub content: Vec<u8>,
    pub version: VersionToken,
}

/// Path-addressed store with conditional writes
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Read the content at `path`
    ///
    /// Returns `StoreError::NotFound` when nothing is stored there.
    async fn read(&self, path: &str) -> Result<Versioned, StoreError>;

    /// Replace (or create) the content at `path`
    ///
    /// `version` must be the token of the current content, or `None` when
    /// the path does not exist yet. Returns the new token.
    async fn write(
        &self,
        path: &str,
        content: &[u8],
        version: Option<&VersionToken>,
        message: &str,
    ) -> Result<VersionToken, StoreError>;
}

struct StoredFile {
    content: Vec<u8>,
    version: VersionToken,
}

#[derive(Default)]
struct MemoryState {
    files: HashMap<String, StoredFile>,
    next_version: u64,
    commits: Vec<String>,
}

/// In-memory content store
///
/// Enforces the same conditional-write rules as the remote store. Used by
/// tests and by offline mode.
#[derive(Default)]
pub struct MemoryContentStore {
    state: Mutex<MemoryState>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `path` with content, returning its version
    pub async fn insert(&self, path: &str, content: impl Into<Vec<u8>>) -> VersionToken {
        let mut state = self.state.lock().await;
        let version = Self::next_version(&mut state);
        state.files.insert(
            path.to_string(),
            StoredFile {
                content: content.into(),
                version: version.clone(),
            },
        );
        version
    }

    /// Current content at `path`, if any
    pub async fn get(&self, path: &str) -> Option<Vec<u8>> {
        let state = self.state.lock().await;
        state.files.get(path).map(|f| f.content.clone())
    }

    /// Commit messages of successful writes, oldest first
    pub async fn commits(&self) -> Vec<String> {
        self.state.lock().await.commits.clone()
    }

    fn next_version(state: &mut MemoryState) -> VersionToken {
        state.next_version += 1;
        VersionToken::new(format!("v{}", state.next_version))
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn read(&self, path: &str) -> Result<Versioned, StoreError> {
        let state = self.state.lock().await;
        state
            .files
            .get(path)
            .map(|f| Versioned {
                content: f.content.clone(),
                version: f.version.clone(),
            })
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    async fn write(
        &self,
        path: &str,
        content: &[u8],
        version: Option<&VersionToken>,
        message: &str,
    ) -> Result<VersionToken, StoreError> {
        let mut state = self.state.lock().await;

        let current = state.files.get(path).map(|f| f.version.clone());
        match (current.as_ref(), version) {
            (None, None) => {}
            (Some(current), Some(presented)) if current == presented => {}
            (Some(current), None) => {
                return Err(StoreError::Conflict(format!(
                    "{} already exists at version {}",
                    path, current
                )))
            }
            (Some(current), Some(presented)) => {
                return Err(StoreError::Conflict(format!(
                    "{} is at version {}, not {}",
                    path, current, presented
                )))
            }
            (None, Some(presented)) => {
                return Err(StoreError::Conflict(format!(
                    "{} no longer exists (expected version {})",
                    path, presented
                )))
            }
        }

        let new_version = Self::next_version(&mut state);
        state.files.insert(
            path.to_string(),
            StoredFile {
                content: content.to_vec(),
                version: new_version.clone(),
            },
        );
        state.commits.push(message.to_string());

        Ok(new_version)
    }
}
