//! Upstream HTTP client: connection pooling keyed by (scheme, host, port),
//! per-request and TTFT timeouts, and the mandatory error classification
//! table (2xx/4xx/5xx pass through, transport failures map to 502/504/499).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use gproxy_common::GproxyError;
use gproxy_provider_core::Headers;
use wreq::{Client, Method};

use crate::request::{HttpMethod, UpstreamBody, UpstreamHttpRequest, UpstreamHttpResponse};

#[derive(Debug, Clone)]
pub struct UpstreamClientConfig {
    pub request_timeout: Duration,
    pub ttft_timeout: Duration,
    pub stream_idle_timeout: Duration,
    pub verify_ssl: bool,
}

impl UpstreamClientConfig {
    pub fn from_settings(settings: &gproxy_common::Settings) -> Self {
        Self {
            request_timeout: settings.request_timeout(),
            ttft_timeout: settings.ttft_timeout(),
            stream_idle_timeout: Duration::from_secs(30),
            verify_ssl: settings.verify_ssl,
        }
    }
}

/// One pooled `wreq::Client` per (scheme, host, port), matching the
/// upstream connection-pooling requirement. `wreq` already pools
/// keep-alive connections internally per client instance; keying by
/// authority here caps the number of distinct client instances rather than
/// recreating one per request.
pub struct WreqUpstreamClient {
    config: UpstreamClientConfig,
    clients: Mutex<HashMap<String, Client>>,
}

impl WreqUpstreamClient {
    pub fn new(config: UpstreamClientConfig) -> Result<Self, wreq::Error> {
        Ok(Self {
            config,
            clients: Mutex::new(HashMap::new()),
        })
    }

    /// A shared client for one-off calls that aren't keyed to a provider's
    /// authority, such as the Vertex OAuth token endpoint.
    pub fn auth_client(&self) -> Result<Client, GproxyError> {
        self.client_for("oauth2.googleapis.com")
    }

    fn client_for(&self, authority: &str) -> Result<Client, GproxyError> {
        let mut guard = self
            .clients
            .lock()
            .map_err(|_| GproxyError::internal("upstream client cache lock poisoned"))?;
        if let Some(client) = guard.get(authority) {
            return Ok(client.clone());
        }
        let client = build_client(&self.config).map_err(map_wreq_error)?;
        guard.insert(authority.to_string(), client.clone());
        Ok(client)
    }

    pub async fn send(&self, req: UpstreamHttpRequest) -> Result<UpstreamHttpResponse, GproxyError> {
        let authority = authority_of(&req.url);
        let client = self.client_for(&authority)?;

        let method = match req.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };
        let mut builder = client.request(method, &req.url);
        for (k, v) in &req.headers {
            builder = builder.header(k, v);
        }
        if let Some(body) = req.body {
            builder = builder.body(body);
        }

        let ttft_timeout = self.config.ttft_timeout;
        let resp = tokio::time::timeout(ttft_timeout, builder.send())
            .await
            .map_err(|_| GproxyError::new(gproxy_common::ErrorKind::TtftTimeout, "timed out waiting for upstream response headers"))?
            .map_err(map_wreq_error)?;

        convert_response(resp, req.is_stream, self.config.stream_idle_timeout).await
    }
}

fn authority_of(url: &str) -> String {
    url.split("://")
        .nth(1)
        .and_then(|rest| rest.split('/').next())
        .unwrap_or(url)
        .to_string()
}

fn build_client(config: &UpstreamClientConfig) -> Result<Client, wreq::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(config.request_timeout)
        .read_timeout(config.stream_idle_timeout)
        .danger_accept_invalid_certs(!config.verify_ssl)
        .build()
}

async fn convert_response(
    resp: wreq::Response,
    want_stream: bool,
    stream_idle_timeout: Duration,
) -> Result<UpstreamHttpResponse, GproxyError> {
    let status = resp.status().as_u16();
    let headers = headers_from_wreq(resp.headers());

    let is_success = (200..300).contains(&status);
    if !is_success || !want_stream {
        let body = resp.bytes().await.map_err(map_wreq_error)?;
        return Ok(UpstreamHttpResponse {
            status,
            headers,
            body: UpstreamBody::Bytes(body),
        });
    }

    let (tx, rx) = tokio::sync::mpsc::channel::<Bytes>(16);
    tokio::spawn(async move {
        let mut stream = resp.bytes_stream();
        loop {
            let next = tokio::time::timeout(stream_idle_timeout, stream.next()).await;
            let item = match next {
                Ok(item) => item,
                // Provider went silent mid-stream: log and let the task end,
                // which closes `tx` and terminates the pump's read side.
                Err(_) => {
                    tracing::warn!(event = "upstream_stream_idle_timeout", "closing stalled upstream stream");
                    break;
                }
            };
            let Some(item) = item else { break };
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(err) => {
                    tracing::warn!(event = "upstream_stream_error", error = %err, "upstream closed mid-stream");
                    break;
                }
            };
            if tx.send(chunk).await.is_err() {
                break;
            }
        }
    });

    Ok(UpstreamHttpResponse {
        status,
        headers,
        body: UpstreamBody::Stream(rx),
    })
}

fn headers_from_wreq(map: &wreq::header::HeaderMap) -> Headers {
    let mut out = Vec::new();
    for (k, v) in map {
        if let Ok(s) = v.to_str() {
            out.push((k.as_str().to_string(), s.to_string()));
        }
    }
    out
}

/// Maps a transport-level `wreq` failure onto the mandatory classification
/// table: connection reset / TLS / DNS -> 502, request timeout -> 504.
fn map_wreq_error(err: wreq::Error) -> GproxyError {
    if err.is_timeout() {
        return GproxyError::new(gproxy_common::ErrorKind::UpstreamTimeout, err.to_string());
    }
    GproxyError::new(gproxy_common::ErrorKind::UpstreamNetworkError, err.to_string())
}
