//! Axum handlers for the nine external routes. The five proxy endpoints
//! dispatch straight into [`crate::engine::Engine::handle`]; the rest are
//! operational surface that reads the active snapshot or the metrics sink
//! without going through the request pipeline.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;

use crate::auth;
use crate::classify::ProxyRoute;
use crate::error::error_response;
use crate::state::AppState;

pub async fn v1_chat_completions(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    state.engine.handle(ProxyRoute::V1ChatCompletions, headers, body).await
}

pub async fn v1_completions(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    state.engine.handle(ProxyRoute::V1Completions, headers, body).await
}

pub async fn v2_chat_completions(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    state.engine.handle(ProxyRoute::V2ChatCompletions, headers, body).await
}

pub async fn v2_messages(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    state.engine.handle(ProxyRoute::V2Messages, headers, body).await
}

pub async fn v2_responses(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    state.engine.handle(ProxyRoute::V2Responses, headers, body).await
}

/// Lists the union of enabled model keys the calling credential is allowed
/// to use, deduplicated by name.
pub async fn list_models(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let snapshot = state.engine.store.current();
    let credential = match auth::authenticate(&snapshot, &headers) {
        Ok(credential) => credential,
        Err(err) => return error_response(&err),
    };

    let mut models: Vec<&str> = snapshot
        .providers
        .iter()
        .filter(|provider| provider.is_enabled)
        .flat_map(|provider| provider.model_mapping.keys().map(String::as_str))
        .filter(|model| credential.allows_model(model))
        .collect();
    models.sort_unstable();
    models.dedup();

    Json(serde_json::json!({
        "object": "list",
        "data": models
            .iter()
            .map(|id| serde_json::json!({ "id": id, "object": "model" }))
            .collect::<Vec<_>>(),
    }))
    .into_response()
}

pub async fn health() -> Response {
    Json(serde_json::json!({ "status": "ok" })).into_response()
}

/// Basic liveness plus the snapshot version and dropped-event count, for
/// operators who need more than a bare 200.
pub async fn health_detailed(State(state): State<AppState>) -> Response {
    let snapshot = state.engine.store.current();
    Json(serde_json::json!({
        "status": "ok",
        "snapshot_version": snapshot.version,
        "providers": snapshot.providers.len(),
        "credentials": snapshot.credentials.len(),
        "dropped_events_total": state.engine.hub.dropped_total(),
    }))
    .into_response()
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.metrics.render();
    ([(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response()
}
