//! Knowledge base of prior (pattern → response) pairs.
//!
//! Every completed turn is sanitized, generalized into a pattern key, and
//! stored; later turns look up the closest past pattern with the same
//! emotional context and use its response to bias generation. Persistence
//! goes through the document-store seam and is best-effort: a write failure
//! is logged and the in-memory index stays authoritative.

use crate::ai::emotion::Emotion;
use crate::ai::sanitize::{pattern_of, sanitize};
use crate::store::document::DocumentStore;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Minimum pattern similarity for a stored entry to count as a match.
pub const SIMILARITY_THRESHOLD: f32 = 0.7;

const COLLECTION: &str = "learning_patterns";

// ── Similarity ─────────────────────────────────────────────

/// Classic Levenshtein distance over Unicode scalar values: insertion,
/// deletion, and substitution all cost 1, no transposition.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            current[j + 1] = (prev[j + 1] + 1)
                .min(current[j] + 1)
                .min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut current);
    }

    prev[b.len()]
}

/// Normalized similarity in [0, 1]: `1 - distance / max_len`. Two empty
/// strings are identical (1.0).
pub fn similarity(a: &str, b: &str) -> f32 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - edit_distance(a, b) as f32 / max_len as f32
}

// ── Entry types ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeContext {
    pub emotion: Emotion,
    /// Running estimate in [0, 1] of how well the response performed.
    pub effectiveness: f32,
    pub use_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeMetadata {
    pub last_used: i64,
    pub total_feedback_score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Sanitized, generalized lookup key.
    pub pattern: String,
    /// Sanitized response text.
    pub response: String,
    pub context: KnowledgeContext,
    pub metadata: KnowledgeMetadata,
}

// ── Store ──────────────────────────────────────────────────

/// In-memory pattern index backed by a best-effort document store.
///
/// The index preserves insertion order, which doubles as the tie-break rule
/// when two candidates score identically in `find`.
pub struct KnowledgeStore {
    entries: IndexMap<String, KnowledgeEntry>,
    /// Pattern → persisted document id, for entries whose write succeeded.
    doc_ids: HashMap<String, String>,
    store: Arc<dyn DocumentStore>,
    threshold: f32,
}

impl KnowledgeStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_threshold(store, SIMILARITY_THRESHOLD)
    }

    pub fn with_threshold(store: Arc<dyn DocumentStore>, threshold: f32) -> Self {
        Self {
            entries: IndexMap::new(),
            doc_ids: HashMap::new(),
            store,
            threshold,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rebuild the in-memory index from the document store. A load failure
    /// leaves the store empty rather than failing the session.
    pub async fn load(&mut self) {
        match self.store.query_documents(COLLECTION, &|_| true).await {
            Ok(docs) => {
                for doc in docs {
                    match serde_json::from_value::<KnowledgeEntry>(doc.body) {
                        Ok(entry) => {
                            self.doc_ids.insert(entry.pattern.clone(), doc.id);
                            self.entries.insert(entry.pattern.clone(), entry);
                        }
                        Err(e) => warn!("skipping malformed knowledge document: {}", e),
                    }
                }
                debug!("loaded {} knowledge entries", self.entries.len());
            }
            Err(e) => warn!("failed to load knowledge base: {}", e),
        }
    }

    /// Learn from a completed turn. Both strings are sanitized before
    /// storage; the in-memory index is updated synchronously regardless of
    /// the persistence outcome.
    pub async fn record(
        &mut self,
        user_input: &str,
        ai_response: &str,
        emotion: Emotion,
        effectiveness: f32,
    ) {
        let sanitized_input = sanitize(user_input);
        let sanitized_response = sanitize(ai_response);
        let pattern = pattern_of(&sanitized_input);

        let entry = KnowledgeEntry {
            pattern: pattern.clone(),
            response: sanitized_response,
            context: KnowledgeContext {
                emotion,
                effectiveness,
                use_count: 1,
            },
            metadata: KnowledgeMetadata {
                last_used: chrono::Utc::now().timestamp(),
                total_feedback_score: effectiveness,
            },
        };

        self.entries.insert(pattern.clone(), entry.clone());

        match serde_json::to_value(&entry) {
            Ok(body) => match self.store.add_document(COLLECTION, body).await {
                Ok(id) => {
                    self.doc_ids.insert(pattern, id);
                }
                Err(e) => warn!("failed to persist knowledge entry: {}", e),
            },
            Err(e) => warn!("failed to serialize knowledge entry: {}", e),
        }
    }

    /// Best match for `user_input` under the queried emotion, or None.
    ///
    /// Candidates must exceed the similarity threshold AND carry the exact
    /// same emotion; survivors rank by `effectiveness × use_count`, with
    /// insertion order breaking ties.
    pub fn find(&self, user_input: &str, emotion: Emotion) -> Option<&KnowledgeEntry> {
        let pattern = pattern_of(user_input);

        let mut best: Option<(&KnowledgeEntry, f32)> = None;
        for entry in self.entries.values() {
            if entry.context.emotion != emotion {
                continue;
            }
            if similarity(&pattern, &entry.pattern) <= self.threshold {
                continue;
            }
            let score = entry.context.effectiveness * entry.context.use_count as f32;
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((entry, score)),
            }
        }

        best.map(|(entry, _)| entry)
    }

    /// Fold new feedback into the entry matching `text`'s pattern:
    /// effectiveness moves to the midpoint of old and new, use count and the
    /// running feedback total advance. Unknown pattern is a no-op.
    pub async fn update_effectiveness(&mut self, text: &str, new_effectiveness: f32) {
        let pattern = pattern_of(text);

        let entry = match self.entries.get_mut(&pattern) {
            Some(entry) => entry,
            None => return,
        };

        entry.context.effectiveness = (entry.context.effectiveness + new_effectiveness) / 2.0;
        entry.context.use_count += 1;
        entry.metadata.last_used = chrono::Utc::now().timestamp();
        entry.metadata.total_feedback_score += new_effectiveness;

        let snapshot = entry.clone();
        match self.doc_ids.get(&pattern) {
            Some(id) => match serde_json::to_value(&snapshot) {
                Ok(body) => {
                    if let Err(e) = self.store.update_document(id, body).await {
                        warn!("failed to persist effectiveness update: {}", e);
                    }
                }
                Err(e) => warn!("failed to serialize knowledge entry: {}", e),
            },
            None => debug!("no persisted document for pattern, keeping update local"),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::document::MemoryDocumentStore;
    use proptest::prelude::*;

    fn memory_store() -> KnowledgeStore {
        KnowledgeStore::new(Arc::new(MemoryDocumentStore::new()))
    }

    #[test]
    fn edit_distance_known_values() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("same", "same"), 0);
    }

    #[test]
    fn similarity_identity_and_empty() {
        assert_eq!(similarity("hello there", "hello there"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
        let s = similarity("kitten", "sitting");
        assert!((s - (1.0 - 3.0 / 7.0)).abs() < 1e-6, "got {}", s);
    }

    proptest! {
        #[test]
        fn similarity_is_symmetric_and_bounded(a in ".{0,24}", b in ".{0,24}") {
            let forward = similarity(&a, &b);
            let backward = similarity(&b, &a);
            prop_assert!((forward - backward).abs() < 1e-6);
            prop_assert!((0.0..=1.0).contains(&forward));
        }

        #[test]
        fn similarity_with_self_is_one(a in ".{0,24}") {
            prop_assert!((similarity(&a, &a) - 1.0).abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn find_requires_matching_emotion() {
        let mut store = memory_store();
        store
            .record("I feel terrible today", "I'm here for you", Emotion::Sad, 0.9)
            .await;

        assert!(store.find("I feel terrible today", Emotion::Sad).is_some());
        assert!(
            store.find("I feel terrible today", Emotion::Happy).is_none(),
            "emotion mismatch must never match"
        );
    }

    #[tokio::test]
    async fn find_requires_similarity_above_threshold() {
        let mut store = memory_store();
        store
            .record("tell me a joke", "Here's one...", Emotion::Happy, 0.8)
            .await;

        assert!(store.find("tell me a joke", Emotion::Happy).is_some());
        assert!(
            store
                .find("completely unrelated request about cooking", Emotion::Happy)
                .is_none(),
            "dissimilar pattern must not match"
        );
    }

    #[tokio::test]
    async fn find_ranks_by_effectiveness_times_use_count() {
        let mut store = memory_store();
        store
            .record("i am so worried today", "Take a breath", Emotion::Stressed, 0.3)
            .await;
        store
            .record("i am so worried now", "Let's break it down", Emotion::Stressed, 0.9)
            .await;

        let hit = store.find("i am so worried now", Emotion::Stressed).unwrap();
        assert_eq!(hit.response, "Let's break it down");
    }

    #[tokio::test]
    async fn update_effectiveness_averages_and_counts() {
        let mut store = memory_store();
        store
            .record("how do i relax", "Try a walk", Emotion::Stressed, 0.5)
            .await;

        store.update_effectiveness("how do i relax", 1.0).await;
        store.update_effectiveness("how do i relax", 0.0).await;

        let entry = store.find("how do i relax", Emotion::Stressed).unwrap();
        // ((0.5 + 1.0) / 2 + 0.0) / 2 = 0.375
        assert!(
            (entry.context.effectiveness - 0.375).abs() < 1e-6,
            "got {}",
            entry.context.effectiveness
        );
        assert_eq!(entry.context.use_count, 3, "fresh entry + two updates");
        assert!((entry.metadata.total_feedback_score - 1.5).abs() < 1e-6);
    }

    #[tokio::test]
    async fn update_unknown_pattern_is_noop() {
        let mut store = memory_store();
        store.update_effectiveness("never recorded", 0.9).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn record_sanitizes_before_storing() {
        let mut store = memory_store();
        store
            .record(
                "my email is a@b.com and I'm sad",
                "Noted, let's talk about how you feel",
                Emotion::Sad,
                0.5,
            )
            .await;

        let entry = store
            .find("my email is a@b.com and I'm sad", Emotion::Sad)
            .unwrap();
        assert!(
            !entry.pattern.contains("a@b"),
            "raw email leaked into pattern: {}",
            entry.pattern
        );
    }

    #[tokio::test]
    async fn load_rebuilds_index_from_store() {
        let backend = Arc::new(MemoryDocumentStore::new());
        {
            let mut store = KnowledgeStore::new(backend.clone());
            store
                .record("good morning", "Morning! Sleep well?", Emotion::Happy, 0.7)
                .await;
        }

        let mut reloaded = KnowledgeStore::new(backend);
        reloaded.load().await;
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.find("good morning", Emotion::Happy).is_some());
    }

    #[tokio::test]
    async fn persistence_failure_keeps_memory_authoritative() {
        struct FailingStore;

        #[async_trait::async_trait]
        impl DocumentStore for FailingStore {
            async fn add_document(
                &self,
                _collection: &str,
                _body: serde_json::Value,
            ) -> anyhow::Result<String> {
                anyhow::bail!("backend offline")
            }

            async fn query_documents(
                &self,
                _collection: &str,
                _filter: &(dyn for<'a> Fn(&'a serde_json::Value) -> bool + Send + Sync),
            ) -> anyhow::Result<Vec<crate::store::document::Document>> {
                anyhow::bail!("backend offline")
            }

            async fn update_document(
                &self,
                _id: &str,
                _body: serde_json::Value,
            ) -> anyhow::Result<()> {
                anyhow::bail!("backend offline")
            }
        }

        let mut store = KnowledgeStore::new(Arc::new(FailingStore));
        store
            .record("are you there", "Always", Emotion::Neutral, 0.5)
            .await;

        assert_eq!(store.len(), 1, "in-memory index must survive write failure");
        assert!(store.find("are you there", Emotion::Neutral).is_some());

        store.update_effectiveness("are you there", 1.0).await;
        let entry = store.find("are you there", Emotion::Neutral).unwrap();
        assert_eq!(entry.context.use_count, 2);
    }
}
