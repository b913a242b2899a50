//! JSON envelopes returned by every resource.
//!
//! Successes are an open map that always carries the primary entity and,
//! where it makes sense, a `next` list of affordances. Errors are wrapped as
//! `{"error": {type, message, code, param, allowed?}}` with a stable `type`
//! tag and a standard HTTP status in `code`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

/// One permitted next action: `{"<METHOD>": "<path>", "params": "<name>"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub method: &'static str,
    pub path: String,
    pub params: Option<&'static str>,
}

impl Link {
    pub fn new(method: &'static str, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: None,
        }
    }

    pub fn with_params(mut self, params: &'static str) -> Self {
        self.params = Some(params);
        self
    }
}

impl Serialize for Link {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.params.is_some() { 2 } else { 1 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry(self.method, &self.path)?;
        if let Some(params) = self.params {
            map.serialize_entry("params", params)?;
        }
        map.end()
    }
}

/// Successful response body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiSuccess {
    body: serde_json::Map<String, serde_json::Value>,
}

impl ApiSuccess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. A value that cannot be represented as JSON is a server error.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Result<Self, ApiError> {
        let value = serde_json::to_value(value).map_err(|e| {
            ApiError::Server(anyhow::Error::new(e).context(format!("serializing '{}'", key)))
        })?;
        self.body.insert(key.to_string(), value);
        Ok(self)
    }

    pub fn with_next(self, next: Vec<Link>) -> Result<Self, ApiError> {
        self.with("next", next)
    }
}

impl IntoResponse for ApiSuccess {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self.body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad or missing input; `param` names the offending parameter.
    #[error("{message}")]
    Validation {
        kind: &'static str,
        message: &'static str,
        param: &'static str,
    },

    #[error("This resource was not found.")]
    NotFound,

    #[error("Sorry, this method is not allowed.")]
    MethodNotAllowed { allowed: Vec<Link> },

    /// Internal failure. The cause is logged, never sent to the client.
    #[error("This response could not be processed at this time.")]
    Server(#[source] anyhow::Error),
}

pub type ApiResult = Result<ApiSuccess, ApiError>;

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    message: String,
    code: u16,
    param: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed: Option<&'a [Link]>,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

impl ApiError {
    pub fn invalid_name() -> Self {
        ApiError::Validation {
            kind: "invalid-name",
            message: "A non-empty name is required.",
            param: "name",
        }
    }

    pub fn name_taken() -> Self {
        ApiError::Validation {
            kind: "invalid-name",
            message: "A collection with this name already exists.",
            param: "name",
        }
    }

    pub fn invalid_string() -> Self {
        ApiError::Validation {
            kind: "invalid-string",
            message: "A non-empty string is required.",
            param: "string",
        }
    }

    pub fn method_not_allowed(allowed: Vec<Link>) -> Self {
        ApiError::MethodNotAllowed { allowed }
    }

    /// Not-found stays not-found; anything else becomes an opaque server
    /// error carrying `operation` for the log.
    pub fn from_store(operation: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound,
            other => ApiError::Server(anyhow::Error::new(other).context(operation)),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation { kind, .. } => *kind,
            ApiError::NotFound => "not-found",
            ApiError::MethodNotAllowed { .. } => "invalid-method",
            ApiError::Server(_) => "server-error",
        }
    }

    fn envelope(&self) -> ErrorEnvelope<'_> {
        let param = match self {
            ApiError::Validation { param, .. } => vec![*param],
            _ => Vec::new(),
        };
        let allowed = match self {
            ApiError::MethodNotAllowed { allowed } => Some(allowed.as_slice()),
            _ => None,
        };

        ErrorEnvelope {
            error: ErrorBody {
                kind: self.kind(),
                message: self.to_string(),
                code: self.status().as_u16(),
                param,
                allowed,
            },
        }
    }
}

/// Attach the failing operation to store errors on their way to the client.
pub trait StoreResultExt<T> {
    fn api_context(self, operation: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreResultExt<T> for Result<T, StoreError> {
    fn api_context(self, operation: &'static str) -> Result<T, ApiError> {
        self.map_err(|err| ApiError::from_store(operation, err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Server(ref cause) = self {
            error!("Request failed: {:#}", cause);
        }
        (self.status(), Json(self.envelope())).into_response()
    }
}

/// Request parameters: form body values first, then query string values.
#[derive(Debug, Clone, Default)]
pub struct FormParams {
    pairs: Vec<(String, String)>,
}

impl FormParams {
    /// Parse a urlencoded body (if any) and query string (if any).
    pub fn parse(body: Option<&[u8]>, query: Option<&str>) -> Self {
        let mut pairs: Vec<(String, String)> = Vec::new();
        if let Some(body) = body {
            pairs.extend(url::form_urlencoded::parse(body).into_owned());
        }
        if let Some(query) = query {
            pairs.extend(url::form_urlencoded::parse(query.as_bytes()).into_owned());
        }
        Self { pairs }
    }

    /// First value for `key`, or `""` when absent.
    pub fn get(&self, key: &str) -> &str {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
