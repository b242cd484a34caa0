//! Upstream IO: the wreq-backed HTTP client, per-backend request assembly,
//! and Vertex's service-account token exchange. `gproxy-core` calls into
//! this crate once a `Provider` has been selected; nothing here knows about
//! routing, rate limiting, or the client-facing protocol.

pub mod auth;
pub mod builders;
pub mod client;
pub mod request;

pub use builders::{build_request, build_vertex_request, PathKind};
pub use client::{UpstreamClientConfig, WreqUpstreamClient};
pub use request::{HttpMethod, UpstreamBody, UpstreamHttpRequest, UpstreamHttpResponse};

/// Builds the outbound request for `provider`, dispatching to the async
/// Vertex path when the provider type requires a token exchange.
pub async fn build_upstream_request(
    client: &WreqUpstreamClient,
    provider: &gproxy_provider_core::Provider,
    mapped_model: &str,
    path_kind: builders::PathKind,
    body: bytes::Bytes,
    is_stream: bool,
) -> Result<request::UpstreamHttpRequest, gproxy_common::GproxyError> {
    match provider.provider_type {
        gproxy_provider_core::ProviderType::GeminiVertex => {
            let auth_client = client.auth_client()?;
            builders::build_vertex_request(&auth_client, provider, mapped_model, is_stream, body).await
        }
        _ => builders::build_request(provider, mapped_model, path_kind, body, is_stream),
    }
}
