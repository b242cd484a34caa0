//! Shared application state: everything an axum handler needs, built once
//! at bootstrap and cloned (cheaply, via `Arc`) into every request.

use std::sync::Arc;

use gproxy_storage::MetricsEventSink;

use crate::engine::Engine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub metrics: Arc<MetricsEventSink>,
}
