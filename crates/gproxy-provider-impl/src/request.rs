//! Upstream HTTP request/response shapes, independent of any concrete HTTP
//! client — `client.rs` is the only module that knows about `wreq`.

use bytes::Bytes;
use gproxy_provider_core::Headers;
use tokio::sync::mpsc::Receiver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct UpstreamHttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Bytes>,
    pub is_stream: bool,
}

pub enum UpstreamBody {
    Bytes(Bytes),
    Stream(Receiver<Bytes>),
}

pub struct UpstreamHttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: UpstreamBody,
}
