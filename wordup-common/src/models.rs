//! Canonical dictionary entry model
//!
//! Every persisted word is an [`Entry`]. Remote dictionary shards carry
//! [`SourceRecord`]s, which are looser (phonetics may be missing) and are
//! converted into entries during enrichment.

use serde::{Deserialize, Deserializer, Serialize};

/// Translation used when no dictionary record matches a word
pub const SENTINEL_NOT_FOUND: &str = "未找到翻译";

/// Canonical unit of the persisted collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    /// Lowercased, trimmed word (unique key within a collection)
    pub name: String,
    /// Ordered translations; never empty for enriched entries
    pub trans: Vec<String>,
    /// US phonetic transcription (may be empty)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub usphone: String,
    /// UK phonetic transcription (may be empty)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ukphone: String,
}

impl Entry {
    /// Entry for a word the dictionary has no record of
    pub fn not_found(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            trans: vec![SENTINEL_NOT_FOUND.to_string()],
            usphone: String::new(),
            ukphone: String::new(),
        }
    }

    /// Build an entry for `name` from a dictionary record
    ///
    /// Missing phonetics default to empty strings. A record without any
    /// translation still yields the sentinel so the entry stays well-formed.
    pub fn from_record(name: impl Into<String>, record: &SourceRecord) -> Self {
        let trans = if record.trans.is_empty() {
            vec![SENTINEL_NOT_FOUND.to_string()]
        } else {
            record.trans.clone()
        };

        Self {
            name: name.into(),
            trans,
            usphone: record.usphone.clone().unwrap_or_default(),
            ukphone: record.ukphone.clone().unwrap_or_default(),
        }
    }

    /// True when this entry carries only the sentinel translation
    pub fn is_not_found(&self) -> bool {
        self.trans.len() == 1 && self.trans[0] == SENTINEL_NOT_FOUND
    }
}

/// Record as stored in a remote dictionary shard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Headword; absent when the shard is keyed by word
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub trans: Vec<String>,
    #[serde(default)]
    pub usphone: Option<String>,
    #[serde(default)]
    pub ukphone: Option<String>,
}

// Older records carry `null` phonetics
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Trim and lowercase a raw word token
pub fn normalize_word(raw: &str) -> String {
    raw.trim().to_lowercase()
}
