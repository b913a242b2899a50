use anyhow::anyhow;
use tracing::{debug, info};

use super::{collection_links, collections_links};
use crate::models::{Collection, DocId};
use crate::response::{ApiError, ApiResult, ApiSuccess, FormParams, StoreResultExt};
use crate::server::AppState;
use crate::store::StoreError;

fn respond(collection: &Collection) -> ApiResult {
    ApiSuccess::new()
        .with("collection", collection)?
        .with_next(collection_links(&collection.id))
}

/// POST /collections: create a collection, or return the one already using
/// `name`.
pub async fn create(state: &AppState, params: &FormParams) -> ApiResult {
    let name = params.get("name");
    if name.is_empty() {
        return Err(ApiError::invalid_name());
    }

    if let Some(existing) = state
        .store
        .find_collection_by_name(name)
        .await
        .api_context("looking up collection by name")?
    {
        debug!(collection_id = %existing.id, "Collection already exists");
        return respond(&existing);
    }

    let collection = Collection::new(name);
    match state.store.insert_collection(&collection).await {
        Ok(()) => {
            info!(collection_id = %collection.id, "Collection created");
            respond(&collection)
        }
        // Another request created the same name between lookup and insert.
        Err(StoreError::Conflict(_)) => {
            let existing = state
                .store
                .find_collection_by_name(name)
                .await
                .api_context("re-reading conflicting collection")?
                .ok_or_else(|| ApiError::Server(anyhow!("collection name conflicted but is missing")))?;
            respond(&existing)
        }
        Err(e) => Err(ApiError::from_store("inserting collection", e)),
    }
}

/// GET /collections/{id}
pub async fn read(state: &AppState, id: &DocId) -> ApiResult {
    let collection = state
        .store
        .find_collection(id)
        .await
        .api_context("loading collection")?;
    respond(&collection)
}

/// PUT /collections/{id}: rename, keeping names unique.
pub async fn rename(state: &AppState, id: &DocId, params: &FormParams) -> ApiResult {
    let name = params.get("name");
    if name.is_empty() {
        return Err(ApiError::invalid_name());
    }

    let mut collection = state
        .store
        .find_collection(id)
        .await
        .api_context("loading collection")?;

    if collection.name != name {
        let taken = state
            .store
            .find_collection_by_name(name)
            .await
            .api_context("looking up collection by name")?
            .is_some_and(|other| other.id != collection.id);
        if taken {
            return Err(ApiError::name_taken());
        }

        match state.store.rename_collection(&collection.id, name).await {
            Ok(()) => info!(collection_id = %collection.id, "Collection renamed"),
            Err(StoreError::Conflict(_)) => return Err(ApiError::name_taken()),
            Err(e) => return Err(ApiError::from_store("renaming collection", e)),
        }
        collection.name = name.to_string();
    }

    respond(&collection)
}

/// DELETE /collections/{id}
pub async fn remove(state: &AppState, id: &DocId) -> ApiResult {
    state
        .store
        .remove_collection(id)
        .await
        .api_context("removing collection")?;

    info!(collection_id = %id, "Collection deleted");
    ApiSuccess::new()
        .with("success", true)?
        .with_next(collections_links())
}
