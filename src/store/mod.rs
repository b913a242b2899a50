//! Document storage.
//!
//! Two document kinds live in the store: collections, which embed a snapshot
//! of every string they reference, and the global string store, which holds
//! the canonical copy of each distinct text. Both enforce a unique key
//! (collection name, string text); inserting a duplicate reports
//! [`StoreError::Conflict`] so callers can adopt the existing document.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Collection, DocId, TranslatedString};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,

    #[error("unique key already taken: {0}")]
    Conflict(String),

    #[error("storage backend failure")]
    Backend(#[source] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            other => StoreError::Backend(other.into()),
        }
    }
}

/// Document storage operations.
///
/// Writes to an existing collection touch only the field they change, so a
/// request that has been waiting on translations never writes back a stale
/// copy of the rest of the document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a collection by id, or [`StoreError::NotFound`].
    async fn find_collection(&self, id: &DocId) -> Result<Collection, StoreError>;

    async fn find_collection_by_name(&self, name: &str)
        -> Result<Option<Collection>, StoreError>;

    async fn insert_collection(&self, collection: &Collection) -> Result<(), StoreError>;

    /// Change only the name. [`StoreError::Conflict`] if another collection holds it.
    async fn rename_collection(&self, id: &DocId, name: &str) -> Result<(), StoreError>;

    async fn remove_collection(&self, id: &DocId) -> Result<(), StoreError>;

    /// Append `string` to the collection unless it already holds the same
    /// text. Returns the entry the collection ends up holding for that text.
    async fn attach_string(
        &self,
        collection_id: &DocId,
        string: &TranslatedString,
    ) -> Result<TranslatedString, StoreError>;

    /// Remove one string from the collection. [`StoreError::NotFound`] if the
    /// collection is missing or does not hold that string.
    async fn detach_string(&self, collection_id: &DocId, string_id: &DocId)
        -> Result<(), StoreError>;

    async fn find_string_by_text(&self, text: &str)
        -> Result<Option<TranslatedString>, StoreError>;

    async fn insert_string(&self, string: &TranslatedString) -> Result<(), StoreError>;
}
