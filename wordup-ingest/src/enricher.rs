//! Word enrichment
//!
//! Turns raw word tokens into entries by looking each one up in the
//! dictionary shard for its first letter. Misses (including words whose
//! shard could not be fetched) get the sentinel translation. Output order
//! follows input order and duplicates are kept; collapsing them is the
//! merge step's job.

use wordup_common::models::normalize_word;
use wordup_common::Entry;

use crate::dictionary::DictionaryResolver;

/// Result of enriching one batch of words
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub entries: Vec<Entry>,
    /// Entries that received the sentinel translation
    pub not_found: usize,
    /// Letters whose shard could not be fetched or decoded
    pub degraded_letters: Vec<char>,
}

/// Builds entries from raw words using a request-scoped resolver
pub struct EntryEnricher {
    resolver: DictionaryResolver,
}

impl EntryEnricher {
    pub fn new(resolver: DictionaryResolver) -> Self {
        Self { resolver }
    }

    /// Enrich `raw_words`; never fails
    ///
    /// Tokens that are blank after trimming are skipped. All shards needed
    /// by the batch are fetched concurrently before the first lookup.
    pub async fn enrich(&mut self, raw_words: &[String]) -> Enrichment {
        let words: Vec<String> = raw_words
            .iter()
            .map(|raw| normalize_word(raw))
            .filter(|word| !word.is_empty())
            .collect();

        self.resolver
            .prefetch(words.iter().filter_map(|word| word.chars().next()))
            .await;

        let mut enrichment = Enrichment {
            entries: Vec::with_capacity(words.len()),
            ..Default::default()
        };

        for word in words {
            // Non-empty after the filter above
            let Some(letter) = word.chars().next() else {
                continue;
            };
            let shard = self.resolver.resolve_shard(letter).await;

            let entry = match shard.lookup(&word) {
                Some(record) => Entry::from_record(word, record),
                None => {
                    tracing::debug!(word = %word, "No dictionary match");
                    Entry::not_found(word)
                }
            };

            if entry.is_not_found() {
                enrichment.not_found += 1;
            }
            enrichment.entries.push(entry);
        }

        enrichment.degraded_letters = self.resolver.degraded_letters();
        enrichment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::StaticShardSource;
    use std::sync::Arc;
    use wordup_common::SENTINEL_NOT_FOUND;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    fn enricher(source: StaticShardSource) -> (EntryEnricher, Arc<StaticShardSource>) {
        let source = Arc::new(source);
        let resolver = DictionaryResolver::new(source.clone());
        (EntryEnricher::new(resolver), source)
    }

    #[tokio::test]
    async fn test_match_copies_record_fields() {
        let (mut enricher, _) = enricher(StaticShardSource::new().with_shard(
            'a',
            r#"[{"name":"apple","trans":["n. 苹果"],"usphone":"ˈæpl","ukphone":"ˈæpəl"}]"#,
        ));

        let result = enricher.enrich(&words(&["  Apple "])).await;

        assert_eq!(result.entries.len(), 1);
        let entry = &result.entries[0];
        assert_eq!(entry.name, "apple");
        assert_eq!(entry.trans, vec!["n. 苹果".to_string()]);
        assert_eq!(entry.usphone, "ˈæpl");
        assert_eq!(entry.ukphone, "ˈæpəl");
        assert_eq!(result.not_found, 0);
    }

    #[tokio::test]
    async fn test_missing_phonetics_default_to_empty() {
        let (mut enricher, _) = enricher(
            StaticShardSource::new().with_shard('c', r#"[{"name":"cat","trans":["n. 猫"]}]"#),
        );

        let result = enricher.enrich(&words(&["cat"])).await;
        assert_eq!(result.entries[0].usphone, "");
        assert_eq!(result.entries[0].ukphone, "");
    }

    #[tokio::test]
    async fn test_misses_get_sentinel_and_order_is_kept() {
        let (mut enricher, _) = enricher(
            StaticShardSource::new().with_shard('a', r#"[{"name":"apple","trans":["n. 苹果"]}]"#),
        );

        let result = enricher.enrich(&words(&["zebra", "apple", "apricot", "apple"])).await;

        let names: Vec<&str> = result.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["zebra", "apple", "apricot", "apple"]);
        assert_eq!(result.entries[0].trans, vec![SENTINEL_NOT_FOUND.to_string()]);
        assert_eq!(result.entries[2].trans, vec![SENTINEL_NOT_FOUND.to_string()]);
        assert_eq!(result.not_found, 2);
    }

    #[tokio::test]
    async fn test_each_shard_fetched_once_per_request() {
        let (mut enricher, source) = enricher(
            StaticShardSource::new().with_shard('a', r#"[{"name":"apple","trans":["n. 苹果"]}]"#),
        );

        enricher
            .enrich(&words(&["apple", "Axe", "ant", "bee", "bear"]))
            .await;

        assert_eq!(source.fetch_count('a'), 1);
        assert_eq!(source.fetch_count('b'), 1);
    }

    #[tokio::test]
    async fn test_shard_failure_degrades_to_sentinel() {
        let (mut enricher, _) = enricher(StaticShardSource::new().with_failure('b'));

        let result = enricher.enrich(&words(&["banana", "berry"])).await;

        assert_eq!(result.entries.len(), 2);
        assert!(result.entries.iter().all(Entry::is_not_found));
        assert_eq!(result.degraded_letters, vec!['b']);
    }

    #[tokio::test]
    async fn test_blank_tokens_skipped() {
        let (mut enricher, _) = enricher(StaticShardSource::new());
        let result = enricher.enrich(&words(&["", "   ", "kiwi"])).await;
        assert_eq!(result.entries.len(), 1);
    }
}
