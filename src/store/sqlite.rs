//! SQLite-backed document store.
//!
//! One flat `documents` table; record bodies are serialized JSON. Good
//! enough for a single companion session's knowledge base (well under the
//! row counts where a real index would matter).

use crate::store::document::{Document, DocumentStore};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

pub struct SqliteDocumentStore {
    db: SqlitePool,
}

impl SqliteDocumentStore {
    /// Open (creating if missing) the database at `db_url` and ensure the
    /// documents table exists.
    pub async fn connect(db_url: &str) -> Result<Self> {
        let options =
            sqlx::sqlite::SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );",
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);",
        )
        .execute(&pool)
        .await?;

        Ok(Self { db: pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn add_document(&self, collection: &str, body: Value) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            "INSERT INTO documents (id, collection, body, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(collection)
        .bind(body.to_string())
        .bind(now)
        .execute(&self.db)
        .await?;

        Ok(id)
    }

    async fn query_documents(
        &self,
        collection: &str,
        filter: &(dyn for<'a> Fn(&'a Value) -> bool + Send + Sync),
    ) -> Result<Vec<Document>> {
        let rows = sqlx::query(
            "SELECT id, body, created_at FROM documents WHERE collection = ? ORDER BY rowid ASC",
        )
        .bind(collection)
        .fetch_all(&self.db)
        .await?;

        let mut docs = Vec::new();
        for row in rows {
            let raw: String = row.get("body");
            let body: Value = serde_json::from_str(&raw)?;
            if filter(&body) {
                docs.push(Document {
                    id: row.get("id"),
                    body,
                    created_at: row.get("created_at"),
                });
            }
        }
        Ok(docs)
    }

    async fn update_document(&self, id: &str, body: Value) -> Result<()> {
        let result = sqlx::query("UPDATE documents SET body = ? WHERE id = ?")
            .bind(body.to_string())
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("no document with id {}", id);
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────
