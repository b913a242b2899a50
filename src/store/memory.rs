use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{DocumentStore, StoreError};
use crate::models::{Collection, DocId, TranslatedString};

#[derive(Default)]
struct Documents {
    collections: HashMap<DocId, Collection>,
    strings: HashMap<DocId, TranslatedString>,
}

/// In-process store used when no database is configured, and by tests.
///
/// Clones share the same documents.
#[derive(Clone, Default)]
pub struct MemoryStore {
    docs: Arc<RwLock<Documents>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn collection_count(&self) -> usize {
        self.docs.read().await.collections.len()
    }

    pub async fn string_count(&self) -> usize {
        self.docs.read().await.strings.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_collection(&self, id: &DocId) -> Result<Collection, StoreError> {
        self.docs
            .read()
            .await
            .collections
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_collection_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Collection>, StoreError> {
        Ok(self
            .docs
            .read()
            .await
            .collections
            .values()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn insert_collection(&self, collection: &Collection) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        if docs.collections.contains_key(&collection.id) {
            return Err(StoreError::Conflict(format!("collection id {}", collection.id)));
        }
        if docs.collections.values().any(|c| c.name == collection.name) {
            return Err(StoreError::Conflict(format!(
                "collection name '{}'",
                collection.name
            )));
        }
        docs.collections
            .insert(collection.id.clone(), collection.clone());
        Ok(())
    }

    async fn rename_collection(&self, id: &DocId, name: &str) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        if docs.collections.values().any(|c| c.name == name && &c.id != id) {
            return Err(StoreError::Conflict(format!("collection name '{}'", name)));
        }
        let collection = docs.collections.get_mut(id).ok_or(StoreError::NotFound)?;
        collection.name = name.to_string();
        Ok(())
    }

    async fn remove_collection(&self, id: &DocId) -> Result<(), StoreError> {
        self.docs
            .write()
            .await
            .collections
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn attach_string(
        &self,
        collection_id: &DocId,
        string: &TranslatedString,
    ) -> Result<TranslatedString, StoreError> {
        let mut docs = self.docs.write().await;
        let collection = docs
            .collections
            .get_mut(collection_id)
            .ok_or(StoreError::NotFound)?;
        if let Some(existing) = collection.find_by_text(&string.text) {
            return Ok(existing.clone());
        }
        collection.strings.push(string.clone());
        Ok(string.clone())
    }

    async fn detach_string(
        &self,
        collection_id: &DocId,
        string_id: &DocId,
    ) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        docs.collections
            .get_mut(collection_id)
            .and_then(|collection| collection.remove_string(string_id))
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn find_string_by_text(
        &self,
        text: &str,
    ) -> Result<Option<TranslatedString>, StoreError> {
        Ok(self
            .docs
            .read()
            .await
            .strings
            .values()
            .find(|s| s.text == text)
            .cloned())
    }

    async fn insert_string(&self, string: &TranslatedString) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        if docs.strings.values().any(|s| s.text == string.text) {
            return Err(StoreError::Conflict("string text".to_string()));
        }
        docs.strings.insert(string.id.clone(), string.clone());
        Ok(())
    }
}
