//! Memoization of analysis results.
//!
//! Analysis is a pure function of (corpus, quantile) for a fixed registry, so
//! results can be reused across calls. A cache belongs to one pipeline and
//! must not be shared between pipelines with different registries. It holds
//! at most `max_entries` results; inserting past that evicts an arbitrary one.

use std::sync::Arc;

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tracing::debug;

use content_signals::ContentItem;

use crate::types::RankedAnalysis;

/// Cache key: corpus fingerprint and quantile bits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    corpus: String,
    quantile_bits: u64,
}

impl CacheKey {
    /// Build a key for a corpus and quantile.
    pub fn new(corpus: &[ContentItem], quantile: f64) -> Self {
        Self {
            corpus: corpus_fingerprint(corpus),
            quantile_bits: quantile.to_bits(),
        }
    }

    /// Hex corpus fingerprint.
    pub fn corpus(&self) -> &str {
        &self.corpus
    }
}

/// Default bound on cached results.
pub const DEFAULT_MAX_ENTRIES: usize = 64;

/// Bounded concurrent map from [`CacheKey`] to analysis results.
#[derive(Debug)]
pub struct AnalysisCache {
    entries: DashMap<CacheKey, Arc<RankedAnalysis>>,
    max_entries: usize,
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }
}

impl AnalysisCache {
    /// Create an empty cache with the default bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache holding at most `max_entries` results (min 1).
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Bound on cached results.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Cached result for a key.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<RankedAnalysis>> {
        let hit = self.entries.get(key).map(|e| Arc::clone(e.value()));
        debug!(corpus = %key.corpus, hit = hit.is_some(), "Analysis cache lookup");
        hit
    }

    /// Store a result, evicting another one if the cache is full.
    pub fn insert(&self, key: CacheKey, analysis: RankedAnalysis) -> Arc<RankedAnalysis> {
        if !self.entries.contains_key(&key) {
            while self.entries.len() >= self.max_entries {
                // Take the key first; removing while an iterator guard is alive deadlocks
                let victim = self.entries.iter().next().map(|e| e.key().clone());
                match victim {
                    Some(victim) => {
                        self.entries.remove(&victim);
                        debug!(corpus = %victim.corpus, "Evicted analysis cache entry");
                    }
                    None => break,
                }
            }
        }

        let analysis = Arc::new(analysis);
        self.entries.insert(key, Arc::clone(&analysis));
        analysis
    }

    /// Number of cached results.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// SHA-256 over every field a detector or the score can see, in corpus order.
pub fn corpus_fingerprint(corpus: &[ContentItem]) -> String {
    let mut hasher = Sha256::new();

    for item in corpus {
        // Length prefixes keep adjacent fields from running together
        for field in [&item.id, &item.title, &item.body, &item.author_id] {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        hasher.update(item.created_at.timestamp_nanos_opt().unwrap_or(i64::MIN).to_le_bytes());

        let e = &item.engagement;
        for counter in [e.likes, e.comments, e.shares, e.views, e.bookmarks, e.donations] {
            hasher.update(counter.to_le_bytes());
        }

        hasher.update((item.tags.len() as u64).to_le_bytes());
        for tag in &item.tags {
            for field in [&tag.tag_type, &tag.key] {
                hasher.update((field.len() as u64).to_le_bytes());
                hasher.update(field.as_bytes());
            }
        }

        match &item.topic {
            Some(topic) => {
                hasher.update([1u8]);
                hasher.update((topic.len() as u64).to_le_bytes());
                hasher.update(topic.as_bytes());
            }
            None => hasher.update([0u8]),
        }

        hasher.update(item.source.as_str().as_bytes());
    }

    hex::encode(hasher.finalize())
}
