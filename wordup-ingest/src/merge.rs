//! Read-merge-write of the persisted collection
//!
//! **Algorithm:**
//! 1. Read the current collection and its version token (not-found = empty,
//!    create on write)
//! 2. Append new entries after existing ones
//! 3. Collapse duplicates according to the [`DedupPolicy`]
//! 4. Sort by name
//! 5. Write the whole collection back conditioned on the token from step 1
//!
//! Steps 1 and 5 are the only fallible ones. A stale token surfaces as
//! [`IngestError::ConcurrentModification`]; this module never retries.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use wordup_common::config::DedupPolicy;
use wordup_common::Entry;

use crate::error::IngestError;
use crate::store::{ContentStore, StoreError, VersionToken};

/// Collection read from the store
#[derive(Debug, Clone, Default)]
pub struct CurrentCollection {
    pub entries: Vec<Entry>,
    /// `None` when the collection does not exist yet
    pub version: Option<VersionToken>,
}

/// Result of a successful merge and write
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub collection: Vec<Entry>,
    /// Collection size before the merge
    pub previous_len: usize,
    pub version: VersionToken,
}

impl MergeOutcome {
    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    /// Growth of the collection caused by this merge
    pub fn added(&self) -> usize {
        self.collection.len().saturating_sub(self.previous_len)
    }
}

/// Owner of the persisted collection's read-merge-write sequence
pub struct MergeStore {
    store: Arc<dyn ContentStore>,
    path: String,
    policy: DedupPolicy,
    commit_message: String,
}

impl MergeStore {
    pub fn new(
        store: Arc<dyn ContentStore>,
        path: impl Into<String>,
        policy: DedupPolicy,
        commit_message: impl Into<String>,
    ) -> Self {
        Self {
            store,
            path: path.into(),
            policy,
            commit_message: commit_message.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn policy(&self) -> DedupPolicy {
        self.policy
    }

    /// Read the persisted collection and its version
    pub async fn read_current(&self) -> Result<CurrentCollection, IngestError> {
        let file = match self.store.read(&self.path).await {
            Ok(file) => file,
            Err(StoreError::NotFound(_)) => {
                tracing::info!(path = %self.path, "Collection does not exist yet, will create it");
                return Ok(CurrentCollection::default());
            }
            Err(e) => return Err(IngestError::StoreRead(e.to_string())),
        };

        let entries: Vec<Entry> = serde_json::from_slice(&file.content).map_err(|e| {
            IngestError::StoreRead(format!("{} is not an entry array: {}", self.path, e))
        })?;

        tracing::debug!(
            path = %self.path,
            version = %file.version,
            entries = entries.len(),
            "Read persisted collection"
        );

        Ok(CurrentCollection {
            entries,
            version: Some(file.version),
        })
    }

    /// Merge `new_entries` into the persisted collection and write it back
    pub async fn merge_and_persist(
        &self,
        new_entries: Vec<Entry>,
    ) -> Result<MergeOutcome, IngestError> {
        let current = self.read_current().await?;
        let previous_len = current.entries.len();

        let collection = merge_entries(current.entries, new_entries, self.policy);

        let mut content = serde_json::to_vec_pretty(&collection)
            .map_err(|e| IngestError::Common(wordup_common::Error::Json(e)))?;
        content.push(b'\n');

        let version = self
            .store
            .write(
                &self.path,
                &content,
                current.version.as_ref(),
                &self.commit_message,
            )
            .await
            .map_err(|e| match e {
                StoreError::Conflict(msg) => IngestError::ConcurrentModification(msg),
                other => IngestError::StoreWrite(other.to_string()),
            })?;

        tracing::info!(
            path = %self.path,
            previous = previous_len,
            total = collection.len(),
            version = %version,
            "Persisted merged collection"
        );

        Ok(MergeOutcome {
            collection,
            previous_len,
            version,
        })
    }
}

/// Concatenate, deduplicate, and sort
///
/// With [`DedupPolicy::Name`] each name (case-insensitive) appears once and
/// the entry added last wins, except that a not-found placeholder does not
/// replace an entry that has a translation. With [`DedupPolicy::Exact`] only identical
/// entries collapse.
pub fn merge_entries(existing: Vec<Entry>, new: Vec<Entry>, policy: DedupPolicy) -> Vec<Entry> {
    let combined = existing.into_iter().chain(new);

    let mut merged: Vec<Entry> = match policy {
        DedupPolicy::Name => {
            let mut by_name: HashMap<String, Entry> = HashMap::new();
            for entry in combined {
                let key = entry.name.trim().to_lowercase();
                // A placeholder never displaces a real translation
                if entry.is_not_found()
                    && by_name.get(&key).is_some_and(|kept| !kept.is_not_found())
                {
                    continue;
                }
                by_name.insert(key, entry);
            }
            by_name.into_values().collect()
        }
        DedupPolicy::Exact => {
            let mut seen: HashSet<Entry> = HashSet::new();
            combined.filter(|entry| seen.insert(entry.clone())).collect()
        }
    };

    merged.sort_by(|a, b| collate(&a.name, &b.name));
    merged
}

/// Locale-style name ordering
///
/// Compares case-folded text first so "Apple" sorts beside "apple", then
/// falls back to code-point order to keep the ordering total.
pub fn collate(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));

    folded.then_with(|| a.cmp(b))
}
