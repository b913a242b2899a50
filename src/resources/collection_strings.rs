use anyhow::anyhow;
use tracing::{debug, info};

use super::{collection_strings_links, string_links};
use crate::models::{DocId, TranslatedString};
use crate::response::{ApiError, ApiResult, ApiSuccess, FormParams, StoreResultExt};
use crate::server::AppState;
use crate::store::StoreError;

/// POST /collections/{id}/strings: attach a string to a collection.
///
/// Texts already in the collection come straight back. Texts already known
/// to the store are reused with their translations. Only a text never seen
/// before is sent through the fan-out.
pub async fn add(state: &AppState, collection_id: &DocId, params: &FormParams) -> ApiResult {
    let text = params.get("string");
    if text.is_empty() {
        return Err(ApiError::invalid_string());
    }

    let collection = state
        .store
        .find_collection(collection_id)
        .await
        .api_context("loading collection")?;

    if let Some(existing) = collection.find_by_text(text) {
        debug!(collection_id = %collection.id, string_id = %existing.id, "String already in collection");
        return respond(collection_id, existing);
    }

    let string = resolve_string(state, text).await?;

    // Append only: the collection may have changed while translating.
    let attached = state
        .store
        .attach_string(collection_id, &string)
        .await
        .api_context("attaching string to collection")?;

    info!(collection_id = %collection_id, string_id = %attached.id, "String added to collection");
    respond(collection_id, &attached)
}

/// DELETE /collections/{id}/strings/{stringId}: detach a string. The global
/// string record is kept for other collections.
pub async fn remove(state: &AppState, collection_id: &DocId, string_id: &DocId) -> ApiResult {
    state
        .store
        .detach_string(collection_id, string_id)
        .await
        .api_context("detaching string from collection")?;

    info!(collection_id = %collection_id, string_id = %string_id, "String removed from collection");
    ApiSuccess::new()
        .with("success", true)?
        .with_next(collection_strings_links(collection_id))
}

fn respond(collection_id: &DocId, string: &TranslatedString) -> ApiResult {
    ApiSuccess::new()
        .with("string", string)?
        .with_next(string_links(collection_id, &string.id))
}

/// The global record for `text`, translating and storing it if it is new.
async fn resolve_string(state: &AppState, text: &str) -> Result<TranslatedString, ApiError> {
    if let Some(known) = state
        .store
        .find_string_by_text(text)
        .await
        .api_context("looking up string")?
    {
        debug!(string_id = %known.id, "Reusing stored translations");
        return Ok(known);
    }

    let translations = state.fanout.translate_all(text).await;
    let string = TranslatedString::new(text, translations);

    match state.store.insert_string(&string).await {
        Ok(()) => {
            info!(
                string_id = %string.id,
                languages = string.translations.len(),
                "Stored new string"
            );
            Ok(string)
        }
        // A concurrent request stored the same text first; its record wins.
        Err(StoreError::Conflict(_)) => state
            .store
            .find_string_by_text(text)
            .await
            .api_context("re-reading conflicting string")?
            .ok_or_else(|| ApiError::Server(anyhow!("string text conflicted but is missing"))),
        Err(e) => Err(ApiError::from_store("storing string", e)),
    }
}
