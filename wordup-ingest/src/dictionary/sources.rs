//! Shard source implementations

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use super::{shard_file_name, ShardSource};
use crate::store::github::GithubContentsClient;
use crate::store::{ContentStore, StoreError};

/// Shards stored as `<shard_dir>/dictionary_<letter>.json` in a repository
pub struct GithubShardSource {
    client: Arc<GithubContentsClient>,
    shard_dir: String,
}

impl GithubShardSource {
    pub fn new(client: Arc<GithubContentsClient>, shard_dir: impl Into<String>) -> Self {
        Self {
            client,
            shard_dir: shard_dir.into(),
        }
    }

    fn shard_path(&self, letter: char) -> String {
        let dir = self.shard_dir.trim_matches('/');
        if dir.is_empty() {
            shard_file_name(letter)
        } else {
            format!("{}/{}", dir, shard_file_name(letter))
        }
    }
}

#[async_trait]
impl ShardSource for GithubShardSource {
    async fn fetch_shard(&self, letter: char) -> Result<Vec<u8>, StoreError> {
        let path = self.shard_path(letter);
        self.client.read(&path).await.map(|file| file.content)
    }
}

/// Shards read from a local directory
pub struct LocalShardSource {
    dir: PathBuf,
}

impl LocalShardSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ShardSource for LocalShardSource {
    async fn fetch_shard(&self, letter: char) -> Result<Vec<u8>, StoreError> {
        let path = self.dir.join(shard_file_name(letter));
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(StoreError::Io(format!("{}: {}", path.display(), e))),
        }
    }
}

/// Fixed in-memory shards
///
/// Counts fetches per letter so callers can check caching behaviour.
#[derive(Default)]
pub struct StaticShardSource {
    shards: HashMap<char, Vec<u8>>,
    failing: Vec<char>,
    fetches: Mutex<HashMap<char, usize>>,
}

impl StaticShardSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `content` as the shard for `letter`
    pub fn with_shard(mut self, letter: char, content: impl Into<Vec<u8>>) -> Self {
        self.shards.insert(letter, content.into());
        self
    }

    /// Fail every fetch of `letter` with a network error
    pub fn with_failure(mut self, letter: char) -> Self {
        self.failing.push(letter);
        self
    }

    /// Number of fetches issued for `letter`
    pub fn fetch_count(&self, letter: char) -> usize {
        let fetches = self.fetches.lock().unwrap_or_else(PoisonError::into_inner);
        fetches.get(&letter).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ShardSource for StaticShardSource {
    async fn fetch_shard(&self, letter: char) -> Result<Vec<u8>, StoreError> {
        {
            let mut fetches = self.fetches.lock().unwrap_or_else(PoisonError::into_inner);
            *fetches.entry(letter).or_insert(0) += 1;
        }

        if self.failing.contains(&letter) {
            return Err(StoreError::Network(format!("shard '{}' unreachable", letter)));
        }

        self.shards
            .get(&letter)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(shard_file_name(letter)))
    }
}
