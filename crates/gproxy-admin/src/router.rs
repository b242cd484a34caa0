use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use gproxy_provider_core::{Credential, Provider};
use gproxy_storage::SnapshotStore;
use serde::Deserialize;

#[derive(Clone)]
pub struct AdminState {
    pub store: Arc<dyn SnapshotStore>,
    pub admin_key: String,
}

/// The publish-snapshot RPC's request body: a full replacement snapshot,
/// never a delta. The store assigns the version on publish.
#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    #[serde(default)]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub credentials: Vec<Credential>,
}

pub fn admin_router(store: Arc<dyn SnapshotStore>, admin_key: String) -> Router {
    let state = AdminState { store, admin_key };

    Router::new()
        .route("/health", get(health))
        .route("/publish", post(publish))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth))
        .with_state(state)
}

async fn admin_auth(
    State(state): State<AdminState>,
    headers: HeaderMap,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let key = extract_admin_key(&headers, req.uri()).ok_or(StatusCode::UNAUTHORIZED)?;
    if !constant_time_eq(key.as_bytes(), state.admin_key.as_bytes()) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

fn extract_admin_key(headers: &HeaderMap, uri: &axum::http::Uri) -> Option<String> {
    if let Some(value) = headers.get("x-admin-key")
        && let Ok(s) = value.to_str()
    {
        let s = s.trim();
        if !s.is_empty() {
            return Some(s.to_string());
        }
    }

    if let Some(value) = headers.get(header::AUTHORIZATION)
        && let Ok(auth) = value.to_str()
    {
        let auth = auth.trim();
        let prefix = "Bearer ";
        if auth.len() > prefix.len() && auth[..prefix.len()].eq_ignore_ascii_case(prefix) {
            let token = auth[prefix.len()..].trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    let query = uri.query()?;
    let parsed: std::collections::HashMap<String, String> = serde_urlencoded::from_str(query).ok()?;
    let key = parsed.get("admin_key")?.trim();
    if key.is_empty() {
        return None;
    }
    Some(key.to_string())
}

/// Byte-length-independent comparison so a timing attack can't binary-search
/// the admin key the way it could against a short-circuiting `==`.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "ok": true })))
}

async fn publish(State(state): State<AdminState>, Json(req): Json<PublishRequest>) -> impl IntoResponse {
    let version = state.store.publish(req.providers, req.credentials);
    tracing::info!(event = "snapshot_published_via_admin", version);
    (StatusCode::OK, Json(serde_json::json!({ "version": version })))
}
