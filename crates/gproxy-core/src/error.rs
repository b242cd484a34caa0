//! Converts a [`GproxyError`] into the client-visible `axum::Response`:
//! proxy-generated errors get the client protocol's `{"error": {...}}`
//! envelope, upstream pass-through errors keep their original body,
//! content-type and (4xx/5xx) status code verbatim.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use gproxy_common::GproxyError;

/// Headers that must never be forwarded across the proxy boundary: they
/// describe this hop's connection, not the payload.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

/// Builds the client response for a fallible step anywhere in the request
/// path. Streaming errors that occur after the first byte are handled
/// separately by the pump, which can no longer alter the status line.
pub fn error_response(err: &GproxyError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let client_error_type = err.log_category();
    let body = err.client_body(client_error_type);

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;

    let content_type = match err {
        GproxyError::UpstreamHttp { content_type, .. } => {
            content_type.clone().unwrap_or_else(|| "application/json".to_string())
        }
        GproxyError::Proxy { .. } => "application/json".to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&content_type) {
        response.headers_mut().insert(axum::http::header::CONTENT_TYPE, value);
    }
    response
}
