//! Sharded reference dictionary lookups
//!
//! The dictionary is split into one shard per first letter. A
//! [`DictionaryResolver`] lives for one request: it fetches each shard at most
//! once and keeps it for the remaining lookups.
//!
//! Shard failures never fail the request. A shard that cannot be fetched or
//! decoded resolves to an empty, [`ShardStatus::Degraded`] shard and every
//! lookup against it misses.

pub mod sources;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use wordup_common::SourceRecord;

use crate::store::StoreError;

pub use sources::{GithubShardSource, LocalShardSource, StaticShardSource};

/// Provider of raw shard files
#[async_trait]
pub trait ShardSource: Send + Sync {
    /// Fetch the encoded shard for `letter`
    ///
    /// `StoreError::NotFound` means the dictionary has no shard for it.
    async fn fetch_shard(&self, letter: char) -> Result<Vec<u8>, StoreError>;
}

/// File name of the shard holding words starting with `letter`
pub fn shard_file_name(letter: char) -> String {
    format!("dictionary_{}.json", letter)
}

/// How a shard was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardStatus {
    /// Fetched and decoded
    Loaded,
    /// The dictionary has no shard for this letter
    Missing,
    /// Fetch or decode failed; treated as empty
    Degraded,
}

/// One letter's worth of dictionary records, keyed by lowercased word
#[derive(Debug, Clone)]
pub struct Shard {
    records: HashMap<String, SourceRecord>,
    status: ShardStatus,
}

impl Shard {
    fn empty(status: ShardStatus) -> Self {
        Self {
            records: HashMap::new(),
            status,
        }
    }

    /// Decode shard JSON
    ///
    /// Accepts either an array of records carrying `name`, or an object
    /// mapping word to record. Keys are lowercased; records without a usable
    /// name are skipped.
    pub fn from_json(bytes: &[u8]) -> Result<Self, String> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;

        let mut records = HashMap::new();
        match value {
            Value::Array(items) => {
                for item in items {
                    let Ok(record) = serde_json::from_value::<SourceRecord>(item) else {
                        continue;
                    };
                    let Some(name) = record.name.as_deref() else {
                        continue;
                    };
                    let key = name.trim().to_lowercase();
                    if !key.is_empty() {
                        records.entry(key).or_insert(record);
                    }
                }
            }
            Value::Object(map) => {
                for (word, item) in map {
                    let Ok(record) = serde_json::from_value::<SourceRecord>(item) else {
                        continue;
                    };
                    let key = word.trim().to_lowercase();
                    if !key.is_empty() {
                        records.entry(key).or_insert(record);
                    }
                }
            }
            _ => return Err("expected an array or object of records".to_string()),
        }

        Ok(Self {
            records,
            status: ShardStatus::Loaded,
        })
    }

    /// Exact match for an already-normalized word
    pub fn lookup(&self, word: &str) -> Option<&SourceRecord> {
        self.records.get(word)
    }

    pub fn status(&self) -> ShardStatus {
        self.status
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Per-request shard cache in front of a [`ShardSource`]
pub struct DictionaryResolver {
    source: Arc<dyn ShardSource>,
    shards: HashMap<char, Arc<Shard>>,
}

impl DictionaryResolver {
    pub fn new(source: Arc<dyn ShardSource>) -> Self {
        Self {
            source,
            shards: HashMap::new(),
        }
    }

    /// Shard for `letter`, fetched on first use
    pub async fn resolve_shard(&mut self, letter: char) -> Arc<Shard> {
        let letter = normalize_letter(letter);
        if let Some(shard) = self.shards.get(&letter) {
            return shard.clone();
        }

        let shard = Arc::new(load_shard(self.source.as_ref(), letter).await);
        self.shards.insert(letter, shard.clone());
        shard
    }

    /// Fetch all not-yet-cached shards for `letters` concurrently
    pub async fn prefetch<I>(&mut self, letters: I)
    where
        I: IntoIterator<Item = char>,
    {
        let pending: BTreeSet<char> = letters
            .into_iter()
            .map(normalize_letter)
            .filter(|letter| !self.shards.contains_key(letter))
            .collect();

        if pending.is_empty() {
            return;
        }

        let source = self.source.as_ref();
        let loaded = join_all(pending.iter().map(|&letter| async move {
            (letter, load_shard(source, letter).await)
        }))
        .await;

        for (letter, shard) in loaded {
            self.shards.insert(letter, Arc::new(shard));
        }
    }

    /// Letters whose shard resolved as degraded, in order
    pub fn degraded_letters(&self) -> Vec<char> {
        let mut letters: Vec<char> = self
            .shards
            .iter()
            .filter(|(_, shard)| shard.status() == ShardStatus::Degraded)
            .map(|(letter, _)| *letter)
            .collect();
        letters.sort_unstable();
        letters
    }
}

fn normalize_letter(letter: char) -> char {
    letter.to_lowercase().next().unwrap_or(letter)
}

async fn load_shard(source: &dyn ShardSource, letter: char) -> Shard {
    // Only letters and digits map to shard files
    if !letter.is_alphanumeric() {
        return Shard::empty(ShardStatus::Missing);
    }

    match source.fetch_shard(letter).await {
        Ok(bytes) => match Shard::from_json(&bytes) {
            Ok(shard) => {
                tracing::debug!(letter = %letter, records = shard.len(), "Loaded dictionary shard");
                shard
            }
            Err(e) => {
                tracing::warn!(letter = %letter, error = %e, "Dictionary shard is malformed, treating as empty");
                Shard::empty(ShardStatus::Degraded)
            }
        },
        Err(StoreError::NotFound(_)) => {
            tracing::debug!(letter = %letter, "No dictionary shard for letter");
            Shard::empty(ShardStatus::Missing)
        }
        Err(e) => {
            tracing::warn!(letter = %letter, error = %e, "Dictionary shard unavailable, treating as empty");
            Shard::empty(ShardStatus::Degraded)
        }
    }
}
