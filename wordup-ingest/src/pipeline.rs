//! Upload ingest pipeline
//!
//! Format detection → parsing → enrichment → validation → merge and persist.
//! Parsing, validation and merging are synchronous; only shard fetches and
//! the store read/write suspend.

use serde::Serialize;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;
use wordup_common::models::normalize_word;
use wordup_common::Entry;

use crate::dictionary::{DictionaryResolver, ShardSource};
use crate::enricher::EntryEnricher;
use crate::error::IngestError;
use crate::format::{FormatTag, Parsed};
use crate::merge::{MergeOutcome, MergeStore};
use crate::validator;

/// A file handed over by the transport layer
#[derive(Debug, Clone)]
pub struct Upload {
    /// Original file name, used for format detection
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Summary of a completed ingest
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub format: FormatTag,
    /// Entries produced from the file
    pub received: usize,
    /// Growth of the persisted collection
    pub added: usize,
    /// Size of the persisted collection
    pub total: usize,
    /// Entries that got the sentinel translation
    pub not_found: usize,
    /// Letters whose dictionary shard was unavailable
    pub degraded_letters: Vec<char>,
    /// Version of the collection after the write
    pub version: String,
}

/// Entries ready for merging, with enrichment statistics
#[derive(Debug, Clone, Default)]
pub struct Converted {
    pub entries: Vec<Entry>,
    pub not_found: usize,
    pub degraded_letters: Vec<char>,
}

/// Convert-enrich-merge-persist pipeline
pub struct IngestPipeline {
    shards: Arc<dyn ShardSource>,
    merge: MergeStore,
    conflict_retries: u32,
}

impl IngestPipeline {
    pub fn new(shards: Arc<dyn ShardSource>, merge: MergeStore) -> Self {
        Self {
            shards,
            merge,
            conflict_retries: 0,
        }
    }

    /// Re-run the read-merge-write sequence up to `retries` extra times on
    /// a version conflict
    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.conflict_retries = retries;
        self
    }

    pub fn merge_store(&self) -> &MergeStore {
        &self.merge
    }

    /// Process one uploaded file end to end
    pub async fn ingest(&self, upload: Upload) -> Result<IngestReport, IngestError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("ingest", request_id = %request_id, file = %upload.filename);

        async move {
            tracing::info!(bytes = upload.size(), "Processing upload");

            let format = FormatTag::from_filename(&upload.filename)?;
            let converted = self.convert(format, &upload.bytes).await?;

            validator::check_entries(&converted.entries)
                .map_err(|violation| IngestError::SchemaValidation(violation.to_string()))?;

            let received = converted.entries.len();
            let outcome = self.persist(converted.entries).await?;

            let report = IngestReport {
                format,
                received,
                added: outcome.added(),
                total: outcome.len(),
                not_found: converted.not_found,
                degraded_letters: converted.degraded_letters,
                version: outcome.version.to_string(),
            };

            tracing::info!(
                format = %report.format,
                received = report.received,
                added = report.added,
                total = report.total,
                not_found = report.not_found,
                "Upload ingested"
            );

            Ok::<_, IngestError>(report)
        }
        .instrument(span)
        .await
    }

    /// Parse `bytes` and turn the result into entries
    pub async fn convert(&self, format: FormatTag, bytes: &[u8]) -> Result<Converted, IngestError> {
        match format.parser().parse(bytes)? {
            Parsed::Words(words) => {
                tracing::debug!(words = words.len(), "Enriching words");
                let resolver = DictionaryResolver::new(self.shards.clone());
                let enrichment = EntryEnricher::new(resolver).enrich(&words).await;

                if !enrichment.degraded_letters.is_empty() {
                    tracing::warn!(
                        letters = ?enrichment.degraded_letters,
                        "Some dictionary shards were unavailable; affected words use the placeholder translation"
                    );
                }

                Ok(Converted {
                    entries: enrichment.entries,
                    not_found: enrichment.not_found,
                    degraded_letters: enrichment.degraded_letters,
                })
            }
            Parsed::Entries(entries) => {
                let entries: Vec<Entry> = entries
                    .into_iter()
                    .map(|mut entry| {
                        entry.name = normalize_word(&entry.name);
                        entry
                    })
                    .collect();
                let not_found = entries.iter().filter(|e| e.is_not_found()).count();

                Ok(Converted {
                    entries,
                    not_found,
                    degraded_letters: Vec::new(),
                })
            }
        }
    }

    async fn persist(&self, entries: Vec<Entry>) -> Result<MergeOutcome, IngestError> {
        let mut attempt = 0;
        loop {
            match self.merge.merge_and_persist(entries.clone()).await {
                Err(IngestError::ConcurrentModification(msg)) if attempt < self.conflict_retries => {
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        max = self.conflict_retries,
                        error = %msg,
                        "Collection changed while merging, retrying"
                    );
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::StaticShardSource;
    use crate::store::MemoryContentStore;
    use wordup_common::config::DedupPolicy;

    fn pipeline(store: Arc<MemoryContentStore>) -> IngestPipeline {
        let shards = Arc::new(
            StaticShardSource::new().with_shard('a', r#"[{"name":"apple","trans":["n. 苹果"]}]"#),
        );
        let merge = MergeStore::new(store, "wordbook.json", DedupPolicy::Name, "update");
        IngestPipeline::new(shards, merge)
    }

    #[tokio::test]
    async fn test_structured_names_are_normalized() {
        let store = Arc::new(MemoryContentStore::new());
        let converted = pipeline(store)
            .convert(
                FormatTag::Structured,
                br#"[{"name":"  Zeta ","trans":["n. z"]}]"#,
            )
            .await
            .unwrap();

        assert_eq!(converted.entries[0].name, "zeta");
    }

    #[tokio::test]
    async fn test_empty_name_fails_validation_without_write() {
        let store = Arc::new(MemoryContentStore::new());
        let pipeline = pipeline(store.clone());

        let result = pipeline
            .ingest(Upload::new("bad.json", r#"[{"name":"   ","trans":["x"]}]"#))
            .await;

        assert!(matches!(result, Err(IngestError::SchemaValidation(_))));
        assert!(store.get("wordbook.json").await.is_none());
        assert!(store.commits().await.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let store = Arc::new(MemoryContentStore::new());
        let result = pipeline(store.clone()).ingest(Upload::new("words.csv", "apple")).await;

        assert!(matches!(result, Err(IngestError::UnsupportedFormat(_))));
        assert!(store.commits().await.is_empty());
    }
}
