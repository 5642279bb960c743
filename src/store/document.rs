//! Document store seam — best-effort persistence for knowledge entries and
//! engine snapshots.
//!
//! Failures are the caller's business to log and swallow: the in-memory
//! state stays authoritative for the rest of the session. No retries, no
//! backpressure.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use uuid::Uuid;

/// One stored record. `body` is an opaque JSON document.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub body: Value,
    pub created_at: i64,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a record into a named collection, returning its id.
    async fn add_document(&self, collection: &str, body: Value) -> Result<String>;

    /// Fetch the records of a collection that satisfy `filter`, in insertion
    /// order.
    async fn query_documents(
        &self,
        collection: &str,
        filter: &(dyn for<'a> Fn(&'a Value) -> bool + Send + Sync),
    ) -> Result<Vec<Document>>;

    /// Replace the body of an existing record.
    async fn update_document(&self, id: &str, body: Value) -> Result<()>;
}

// ── In-memory implementation ───────────────────────────────

/// Process-local store. Used in tests and as the default when no durable
/// backend is configured.
#[derive(Default)]
pub struct MemoryDocumentStore {
    records: Mutex<Vec<(String, Document)>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records across all collections.
    pub fn len(&self) -> usize {
        self.records.lock().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn add_document(&self, collection: &str, body: Value) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let doc = Document {
            id: id.clone(),
            body,
            created_at: chrono::Utc::now().timestamp(),
        };
        self.records
            .lock()
            .expect("store lock poisoned")
            .push((collection.to_string(), doc));
        Ok(id)
    }

    async fn query_documents(
        &self,
        collection: &str,
        filter: &(dyn for<'a> Fn(&'a Value) -> bool + Send + Sync),
    ) -> Result<Vec<Document>> {
        Ok(self
            .records
            .lock()
            .expect("store lock poisoned")
            .iter()
            .filter(|(c, doc)| c == collection && filter(&doc.body))
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    async fn update_document(&self, id: &str, body: Value) -> Result<()> {
        let mut records = self.records.lock().expect("store lock poisoned");
        match records.iter_mut().find(|(_, doc)| doc.id == id) {
            Some((_, doc)) => {
                doc.body = body;
                Ok(())
            }
            None => anyhow::bail!("no document with id {}", id),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────
