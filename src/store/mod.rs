pub mod document;
pub mod sqlite;

pub use document::{Document, DocumentStore, MemoryDocumentStore};
pub use sqlite::SqliteDocumentStore;
