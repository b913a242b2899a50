//! HTTP front end.
//!
//! There is a single fallback handler: every request is routed by
//! [`crate::routing::route`] and dispatched on its verb, so path matching
//! stays in one place instead of being split across axum routes.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::fanout::FanOut;
use crate::resources::{api_links, Resource, Verb};
use crate::response::{ApiError, FormParams};
use crate::routing::route;
use crate::store::DocumentStore;

/// Shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub fanout: Arc<FanOut>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, fanout: FanOut) -> Self {
        Self {
            store,
            fanout: Arc::new(fanout),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .fallback(api_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn api_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let resource = route(uri.path());
    debug!(%method, path = uri.path(), ?resource, "Routed request");

    let Some(verb) = Verb::from_method(&method) else {
        return match resource {
            Resource::NotFound => ApiError::NotFound.into_response(),
            _ => ApiError::method_not_allowed(api_links()).into_response(),
        };
    };

    let form_body = is_form(&headers).then_some(body.as_ref());
    let params = FormParams::parse(form_body, uri.query());

    match resource.handle(verb, &params, &state).await {
        Ok(success) => success.into_response(),
        Err(err) => err.into_response(),
    }
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

/// Serve on `listener` until Ctrl+C.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!(address = %addr, "HTTP server starting");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for Ctrl+C, running until killed: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
