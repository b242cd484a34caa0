//! Thin axum route wiring for the proxy surface. All handler logic lives in
//! `gproxy-core`; this crate only assembles the `Router`, matching the
//! split between route wiring and request handling used throughout.

use axum::routing::{get, post};
use axum::Router;
use gproxy_core::state::AppState;
use gproxy_core::handler;

/// The five proxy endpoints plus the operational surface (model listing,
/// health, metrics). Does not include the admin surface, which is its own
/// crate nested separately by the binary.
pub fn proxy_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/chat/completions", post(handler::v1_chat_completions))
        .route("/v1/completions", post(handler::v1_completions))
        .route("/v1/models", get(handler::list_models))
        .route("/v2/chat/completions", post(handler::v2_chat_completions))
        .route("/v2/messages", post(handler::v2_messages))
        .route("/v2/responses", post(handler::v2_responses))
        .route("/health", get(handler::health))
        .route("/health/detailed", get(handler::health_detailed))
        .route("/metrics", get(handler::metrics))
        .with_state(state)
}
