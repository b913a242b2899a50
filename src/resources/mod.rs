//! Request-scoped resources and the four-verb dispatch over them.
//!
//! [`crate::routing::route`] picks a [`Resource`] for a path; the HTTP layer
//! then calls the verb method matching the request. Verb methods are where
//! all reads and writes happen.

mod collection_strings;
mod collections;

use axum::http::Method;

use crate::models::DocId;
use crate::response::{ApiError, ApiResult, FormParams, Link};
use crate::server::AppState;

/// The four verbs every resource answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub fn from_method(method: &Method) -> Option<Self> {
        match method.as_str() {
            "GET" => Some(Verb::Get),
            "POST" => Some(Verb::Post),
            "PUT" => Some(Verb::Put),
            "DELETE" => Some(Verb::Delete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// `/collections`
    Collections,
    /// `/collections/{id}`
    Collection { id: DocId },
    /// `/collections/{id}/strings[/{stringId}]`
    CollectionStrings {
        collection_id: DocId,
        string_id: Option<DocId>,
    },
    NotFound,
}

impl Resource {
    pub async fn handle(&self, verb: Verb, params: &FormParams, state: &AppState) -> ApiResult {
        match verb {
            Verb::Get => self.get(params, state).await,
            Verb::Post => self.post(params, state).await,
            Verb::Put => self.put(params, state).await,
            Verb::Delete => self.delete(params, state).await,
        }
    }

    pub async fn get(&self, _params: &FormParams, state: &AppState) -> ApiResult {
        match self {
            Resource::Collections => Err(ApiError::method_not_allowed(collections_links())),
            Resource::Collection { id } => collections::read(state, id).await,
            Resource::CollectionStrings { collection_id, .. } => Err(ApiError::method_not_allowed(
                collection_strings_links(collection_id),
            )),
            Resource::NotFound => Err(ApiError::NotFound),
        }
    }

    pub async fn post(&self, params: &FormParams, state: &AppState) -> ApiResult {
        match self {
            Resource::Collections => collections::create(state, params).await,
            Resource::Collection { id } => Err(ApiError::method_not_allowed(collection_links(id))),
            Resource::CollectionStrings {
                collection_id,
                string_id: None,
            } => collection_strings::add(state, collection_id, params).await,
            Resource::CollectionStrings { collection_id, .. } => Err(ApiError::method_not_allowed(
                collection_strings_links(collection_id),
            )),
            Resource::NotFound => Err(ApiError::NotFound),
        }
    }

    pub async fn put(&self, params: &FormParams, state: &AppState) -> ApiResult {
        match self {
            Resource::Collections => Err(ApiError::method_not_allowed(collections_links())),
            Resource::Collection { id } => collections::rename(state, id, params).await,
            Resource::CollectionStrings { collection_id, .. } => Err(ApiError::method_not_allowed(
                collection_strings_links(collection_id),
            )),
            Resource::NotFound => Err(ApiError::NotFound),
        }
    }

    pub async fn delete(&self, _params: &FormParams, state: &AppState) -> ApiResult {
        match self {
            Resource::Collections => Err(ApiError::method_not_allowed(collections_links())),
            Resource::Collection { id } => collections::remove(state, id).await,
            Resource::CollectionStrings {
                collection_id,
                string_id: Some(string_id),
            } => collection_strings::remove(state, collection_id, string_id).await,
            Resource::CollectionStrings { collection_id, .. } => Err(ApiError::method_not_allowed(
                collection_strings_links(collection_id),
            )),
            Resource::NotFound => Err(ApiError::NotFound),
        }
    }
}

fn collection_path(id: &DocId) -> String {
    format!("/collections/{}", id)
}

/// Every operation the API offers, for requests using an unsupported verb.
pub fn api_links() -> Vec<Link> {
    vec![
        Link::new("POST", "/collections").with_params("name"),
        Link::new("GET", "/collections/{CollectionId}"),
        Link::new("PUT", "/collections/{CollectionId}").with_params("name"),
        Link::new("DELETE", "/collections/{CollectionId}"),
        Link::new("POST", "/collections/{CollectionId}/strings").with_params("string"),
        Link::new("DELETE", "/collections/{CollectionId}/strings/{StringId}"),
    ]
}

fn collections_links() -> Vec<Link> {
    vec![Link::new("POST", "/collections").with_params("name")]
}

fn collection_links(id: &DocId) -> Vec<Link> {
    let path = collection_path(id);
    vec![
        Link::new("GET", path.clone()),
        Link::new("PUT", path.clone()).with_params("name"),
        Link::new("DELETE", path.clone()),
        Link::new("POST", format!("{}/strings", path)).with_params("string"),
    ]
}

fn collection_strings_links(collection_id: &DocId) -> Vec<Link> {
    let path = collection_path(collection_id);
    vec![
        Link::new("POST", format!("{}/strings", path)).with_params("string"),
        Link::new("DELETE", format!("{}/strings/{{StringId}}", path)),
    ]
}

fn string_links(collection_id: &DocId, string_id: &DocId) -> Vec<Link> {
    vec![Link::new(
        "DELETE",
        format!("{}/strings/{}", collection_path(collection_id), string_id),
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fanout::FanOut;
    use crate::models::{Collection, TranslatedString, Translations};
    use crate::store::{DocumentStore, MemoryStore, StoreError};
    use crate::translation::Translator;
    use async_trait::async_trait;
    use axum::response::IntoResponse;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Hides every document from the first by-name and by-text lookups, as
    /// if a concurrent request wrote it just after the lookup.
    struct RacingStore {
        inner: MemoryStore,
        hide_collection_lookup: AtomicBool,
        hide_string_lookup: AtomicBool,
    }

    impl RacingStore {
        fn new(inner: MemoryStore) -> Self {
            Self {
                inner,
                hide_collection_lookup: AtomicBool::new(true),
                hide_string_lookup: AtomicBool::new(true),
            }
        }
    }

    #[async_trait]
    impl DocumentStore for RacingStore {
        async fn find_collection(&self, id: &DocId) -> Result<Collection, StoreError> {
            self.inner.find_collection(id).await
        }

        async fn find_collection_by_name(
            &self,
            name: &str,
        ) -> Result<Option<Collection>, StoreError> {
            if self.hide_collection_lookup.swap(false, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_collection_by_name(name).await
        }

        async fn insert_collection(&self, collection: &Collection) -> Result<(), StoreError> {
            self.inner.insert_collection(collection).await
        }

        async fn rename_collection(&self, id: &DocId, name: &str) -> Result<(), StoreError> {
            self.inner.rename_collection(id, name).await
        }

        async fn remove_collection(&self, id: &DocId) -> Result<(), StoreError> {
            self.inner.remove_collection(id).await
        }

        async fn attach_string(
            &self,
            collection_id: &DocId,
            string: &TranslatedString,
        ) -> Result<TranslatedString, StoreError> {
            self.inner.attach_string(collection_id, string).await
        }

        async fn detach_string(
            &self,
            collection_id: &DocId,
            string_id: &DocId,
        ) -> Result<(), StoreError> {
            self.inner.detach_string(collection_id, string_id).await
        }

        async fn find_string_by_text(
            &self,
            text: &str,
        ) -> Result<Option<TranslatedString>, StoreError> {
            if self.hide_string_lookup.swap(false, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_string_by_text(text).await
        }

        async fn insert_string(&self, string: &TranslatedString) -> Result<(), StoreError> {
            self.inner.insert_string(string).await
        }
    }

    struct EchoTranslator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Translator for EchoTranslator {
        async fn translate(&self, text: &str, _source: &str, target: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{} [{}]", text, target))
        }
    }

    fn racing_state(inner: &MemoryStore, translator: Arc<EchoTranslator>) -> AppState {
        let fanout = FanOut::new(translator, "en", vec!["fr".to_string()]);
        AppState::new(Arc::new(RacingStore::new(inner.clone())), fanout)
    }

    async fn body_json(result: ApiResult) -> Value {
        let response = result.expect("Should succeed").into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Should read body");
        serde_json::from_slice(&bytes).expect("Should be JSON")
    }

    fn echo_translator() -> Arc<EchoTranslator> {
        Arc::new(EchoTranslator {
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_create_collection_race_returns_winner() {
        let inner = MemoryStore::new();
        let winner = Collection::new("Acme");
        inner.insert_collection(&winner).await.unwrap();
        let state = racing_state(&inner, echo_translator());
        let params: FormParams = [("name", "Acme")].into_iter().collect();

        let body = body_json(Resource::Collections.handle(Verb::Post, &params, &state).await).await;

        assert_eq!(body["collection"]["id"], winner.id.as_str());
        assert_eq!(inner.collection_count().await, 1);
    }

    #[tokio::test]
    async fn test_add_string_race_adopts_stored_string() {
        let inner = MemoryStore::new();
        let collection = Collection::new("Acme");
        inner.insert_collection(&collection).await.unwrap();
        let mut translations = Translations::new();
        translations.insert("fr".to_string(), "Bonjour".to_string());
        let winner = TranslatedString::new("Hello", translations);
        inner.insert_string(&winner).await.unwrap();

        let translator = echo_translator();
        let state = racing_state(&inner, translator.clone());
        let resource = Resource::CollectionStrings {
            collection_id: collection.id.clone(),
            string_id: None,
        };
        let params: FormParams = [("string", "Hello")].into_iter().collect();

        let body = body_json(resource.handle(Verb::Post, &params, &state).await).await;

        assert_eq!(body["string"]["id"], winner.id.as_str());
        assert_eq!(body["string"]["translations"]["fr"], "Bonjour");
        assert_eq!(translator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(inner.string_count().await, 1);
        let stored = inner.find_collection(&collection.id).await.unwrap();
        assert_eq!(stored.strings, vec![winner]);
    }

    #[test]
    fn test_verb_from_method() {
        assert_eq!(Verb::from_method(&Method::GET), Some(Verb::Get));
        assert_eq!(Verb::from_method(&Method::POST), Some(Verb::Post));
        assert_eq!(Verb::from_method(&Method::PUT), Some(Verb::Put));
        assert_eq!(Verb::from_method(&Method::DELETE), Some(Verb::Delete));
        assert_eq!(Verb::from_method(&Method::PATCH), None);
        assert_eq!(Verb::from_method(&Method::HEAD), None);
    }

    #[test]
    fn test_collection_strings_links() {
        let id = DocId::parse("0123456789abcdef0123456789abcdef").unwrap();
        let links = collection_strings_links(&id);

        assert_eq!(links.len(), 2);
        assert_eq!(
            links[1].path,
            "/collections/0123456789abcdef0123456789abcdef/strings/{StringId}"
        );
        assert_eq!(links[0].params, Some("string"));
    }

    #[test]
    fn test_api_links_cover_every_operation() {
        let links = api_links();
        assert_eq!(links.len(), 6);
        assert_eq!(links.iter().filter(|l| l.method == "DELETE").count(), 2);
    }
}
