//! Ties the request path together end to end: authenticate, resolve,
//! select, transform (or bypass), call upstream, pump the response, and
//! observe. This is the one place in the crate that knows the full request
//! path; every other module is a pure step it calls into.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::HeaderMap;
use axum::response::Response;
use bytes::Bytes;
use gproxy_common::{GproxyError, Settings};
use gproxy_protocol::ProtocolTag;
use gproxy_provider_core::{bounded_body, header_get, Event, EventHub, RequestRecord};
use gproxy_provider_impl::{build_upstream_request, UpstreamBody, WreqUpstreamClient};
use gproxy_storage::SnapshotStore;
use gproxy_transform::script::ScriptHooks;
use gproxy_transform::{is_bypass, stream_pipeline, transform_request, transform_response, HookCtx};
use serde_json::Value;
use uuid::Uuid;

use crate::classify::{adapt_legacy_completions, peek_model, peek_stream, ProxyRoute};
use crate::error::{error_response, strip_hop_by_hop};
use crate::pump;
use crate::ratelimit::RateLimiter;
use crate::{auth, resolve, select};

const MAX_LOGGED_BODY_BYTES: usize = 16 * 1024;

pub struct Engine {
    pub store: Arc<dyn SnapshotStore>,
    pub upstream: Arc<WreqUpstreamClient>,
    pub limiter: Arc<RateLimiter>,
    pub hub: Arc<EventHub>,
    pub settings: Arc<Settings>,
}

impl Engine {
    pub async fn handle(&self, route: ProxyRoute, headers: HeaderMap, body: Bytes) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let start = Instant::now();

        let body = if route == ProxyRoute::V1Completions {
            match adapt_legacy_completions(&body) {
                Ok(adapted) => adapted,
                Err(err) => return error_response(&err),
            }
        } else {
            body
        };

        match self.handle_inner(&request_id, start, route, &headers, body).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(event = "request_failed", request_id = %request_id, category = err.log_category());
                error_response(&err)
            }
        }
    }

    async fn handle_inner(
        &self,
        request_id: &str,
        start: Instant,
        route: ProxyRoute,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<Response, GproxyError> {
        let client_tag = route.client_tag();

        // One snapshot handle for the entire request lifetime, so a
        // concurrent publish can never mix providers from two snapshots
        // into one selection.
        let snapshot = self.store.current();

        let raw_model = peek_model(&body)?;
        let model = resolve::normalize_model(&raw_model, self.settings.provider_suffix.as_deref());
        let is_stream = peek_stream(&body);

        let credential = auth::authenticate(&snapshot, headers)?;
        auth::check_model_allowed(credential, &model)?;
        self.limiter.try_acquire(credential)?;

        let candidates = resolve::resolve_candidates(&snapshot, &model)?;
        let picked = select::select_weighted(&candidates)?;
        let provider = picked.provider;
        let mapped_model = picked.mapped_model.to_string();
        let provider_tag = provider.provider_type.protocol_tag();
        let bypass = is_bypass(client_tag, provider_tag, None);

        tracing::info!(
            event = "downstream_received",
            request_id,
            endpoint = route.endpoint(),
            credential_id = credential.id,
            model_requested = %raw_model,
            model_mapped = %mapped_model,
            provider_id = provider.id,
            is_stream,
            is_bypass = bypass,
        );

        let provider_body = if bypass {
            patch_model_field(&body, &mapped_model)?
        } else {
            let mut ctx = HookCtx::new(client_tag, provider_tag, provider.key.clone(), mapped_model.clone());
            let scripts = model_override_hooks(client_tag, mapped_model.clone(), is_stream);
            transform_request(&mut ctx, &body, Some(&scripts))?
        };

        let built_req = build_upstream_request(
            &self.upstream,
            provider,
            &mapped_model,
            route.path_kind(),
            provider_body.clone(),
            is_stream,
        )
        .await?;

        let upstream_resp = self.upstream.send(built_req).await?;
        let status = upstream_resp.status;
        let headers_owned = headers.clone();

        if !(200..300).contains(&status) {
            let UpstreamBody::Bytes(error_body) = upstream_resp.body else {
                return Err(GproxyError::internal("upstream returned a stream for a non-2xx status"));
            };
            let content_type = header_get(&upstream_resp.headers, "content-type").map(str::to_string);
            let err = GproxyError::UpstreamHttp { status, body: error_body.clone(), content_type };

            self.hub
                .emit(Event::Terminal(RequestRecord {
                    request_id: request_id.to_string(),
                    endpoint: route.endpoint().to_string(),
                    credential_id: credential.id,
                    credential_name: credential.name.clone(),
                    client_protocol: client_tag,
                    provider_protocol: provider_tag,
                    provider_id: Some(provider.id),
                    model_requested: raw_model.clone(),
                    model_mapped: Some(mapped_model.clone()),
                    is_streaming: is_stream,
                    is_bypass: bypass,
                    status_code: status,
                    input_tokens: None,
                    output_tokens: None,
                    total_tokens: None,
                    duration_ms: start.elapsed().as_millis() as u64,
                    ttft_ms: None,
                    error_category: Some(err.log_category().to_string()),
                    error_message: None,
                    request_headers: headers_to_record(&headers_owned),
                    request_body: Some(bounded_body(&body, MAX_LOGGED_BODY_BYTES)),
                    response_body: Some(bounded_body(&error_body, MAX_LOGGED_BODY_BYTES)),
                    provider_request_body: Some(bounded_body(&provider_body, MAX_LOGGED_BODY_BYTES)),
                    provider_request_headers: Vec::new(),
                }))
                .await;
            return Err(err);
        }

        if !is_stream {
            let UpstreamBody::Bytes(upstream_body) = upstream_resp.body else {
                return Err(GproxyError::internal("upstream returned a stream for a non-streaming request"));
            };

            let (client_body, usage) = if bypass {
                (upstream_body.clone(), None)
            } else {
                let mut ctx = HookCtx::new(client_tag, provider_tag, provider.key.clone(), mapped_model.clone());
                let client_body = transform_response(&mut ctx, &upstream_body, None)?;
                let usage = ctx.get_uif_response().map(|r| r.usage.clone());
                (client_body, usage)
            };

            self.hub
                .emit(Event::Terminal(RequestRecord {
                    request_id: request_id.to_string(),
                    endpoint: route.endpoint().to_string(),
                    credential_id: credential.id,
                    credential_name: credential.name.clone(),
                    client_protocol: client_tag,
                    provider_protocol: provider_tag,
                    provider_id: Some(provider.id),
                    model_requested: raw_model.clone(),
                    model_mapped: Some(mapped_model.clone()),
                    is_streaming: false,
                    is_bypass: bypass,
                    status_code: status,
                    input_tokens: usage.as_ref().and_then(|u| u.prompt_tokens),
                    output_tokens: usage.as_ref().and_then(|u| u.completion_tokens),
                    total_tokens: usage.as_ref().and_then(|u| u.total_tokens),
                    duration_ms: start.elapsed().as_millis() as u64,
                    ttft_ms: None,
                    error_category: None,
                    error_message: None,
                    request_headers: headers_to_record(&headers_owned),
                    request_body: Some(bounded_body(&body, MAX_LOGGED_BODY_BYTES)),
                    response_body: Some(bounded_body(&client_body, MAX_LOGGED_BODY_BYTES)),
                    provider_request_body: Some(bounded_body(&provider_body, MAX_LOGGED_BODY_BYTES)),
                    provider_request_headers: Vec::new(),
                }))
                .await;

            tracing::info!(event = "downstream_responded", request_id, status, elapsed_ms = start.elapsed().as_millis() as u64);

            let mut resp = Response::new(Body::from(client_body));
            *resp.status_mut() = axum::http::StatusCode::from_u16(status).unwrap_or(axum::http::StatusCode::OK);
            let mut response_headers = HeaderMap::new();
            response_headers.insert(axum::http::header::CONTENT_TYPE, axum::http::HeaderValue::from_static("application/json"));
            strip_hop_by_hop(&mut response_headers);
            *resp.headers_mut() = response_headers;
            return Ok(resp);
        }

        // Streaming path: hand the upstream receiver to the pump and return
        // the client-facing body immediately. Terminal logging happens when
        // the pump's background task observes the stream end.
        let UpstreamBody::Stream(upstream_rx) = upstream_resp.body else {
            return Err(GproxyError::internal("upstream returned buffered bytes for a streaming request"));
        };

        let hub = self.hub.clone();
        let request_id_owned = request_id.to_string();
        let endpoint = route.endpoint().to_string();
        let credential_id = credential.id;
        let credential_name = credential.name.clone();
        let raw_model_owned = raw_model.clone();
        let mapped_model_owned = mapped_model.clone();
        let provider_id = provider.id;
        let request_body_for_log = Some(bounded_body(&body, MAX_LOGGED_BODY_BYTES));

        let client_stream = if bypass {
            pump::spawn_bypass(upstream_rx, hub, move |ttft| RequestRecord {
                request_id: request_id_owned,
                endpoint,
                credential_id,
                credential_name,
                client_protocol: client_tag,
                provider_protocol: provider_tag,
                provider_id: Some(provider_id),
                model_requested: raw_model_owned,
                model_mapped: Some(mapped_model_owned),
                is_streaming: true,
                is_bypass: true,
                status_code: status,
                input_tokens: None,
                output_tokens: None,
                total_tokens: None,
                duration_ms: start.elapsed().as_millis() as u64,
                ttft_ms: ttft.map(|t| t.duration_since(start).as_millis() as u64),
                error_category: None,
                error_message: None,
                request_headers: headers_to_record(&headers_owned),
                request_body: request_body_for_log,
                response_body: None,
                provider_request_body: None,
                provider_request_headers: Vec::new(),
            })
        } else {
            let ctx = HookCtx::new(client_tag, provider_tag, provider.key.clone(), mapped_model.clone());
            let pipeline = stream_pipeline(&ctx);
            pump::spawn_transform(upstream_rx, pipeline, hub, move |ttft, pipeline| {
                let usage = pipeline.cursor().usage.clone();
                RequestRecord {
                    request_id: request_id_owned,
                    endpoint,
                    credential_id,
                    credential_name,
                    client_protocol: client_tag,
                    provider_protocol: provider_tag,
                    provider_id: Some(provider_id),
                    model_requested: raw_model_owned,
                    model_mapped: Some(mapped_model_owned),
                    is_streaming: true,
                    is_bypass: false,
                    status_code: status,
                    input_tokens: usage.prompt_tokens,
                    output_tokens: usage.completion_tokens,
                    total_tokens: usage.total_tokens,
                    duration_ms: start.elapsed().as_millis() as u64,
                    ttft_ms: ttft.map(|t| t.duration_since(start).as_millis() as u64),
                    error_category: None,
                    error_message: None,
                    request_headers: headers_to_record(&headers_owned),
                    request_body: request_body_for_log,
                    response_body: None,
                    provider_request_body: None,
                    provider_request_headers: Vec::new(),
                }
            })
        };

        let mut resp = Response::new(Body::from_stream(client_stream));
        resp.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("text/event-stream"),
        );
        Ok(resp)
    }
}

/// Patches only the `model` key of a raw JSON body without decoding it into
/// a unified request, used on the bypass path where that materialization
/// must not happen.
fn patch_model_field(body: &Bytes, mapped_model: &str) -> Result<Bytes, GproxyError> {
    let mut value: Value = serde_json::from_slice(body)
        .map_err(|err| GproxyError::transform_error(format!("invalid request body: {err}")))?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("model".to_string(), Value::String(mapped_model.to_string()));
    }
    serde_json::to_vec(&value)
        .map(Bytes::from)
        .map_err(|err| GproxyError::transform_error(format!("failed to re-encode request body: {err}")))
}

/// Builds a `request_out` override that reuses the script-hook extension
/// point to rewrite the client-parsed `model`/`stream` fields to the
/// resolver's provider-facing values, before the default codec encodes the
/// provider body.
fn model_override_hooks(client_tag: ProtocolTag, mapped_model: String, is_stream: bool) -> ScriptHooks {
    ScriptHooks {
        request_out: Some(Box::new(move |body: &Bytes| {
            let mut uif = gproxy_transform::codec::decode_request(client_tag, body).ok()?;
            uif.model = mapped_model.clone();
            uif.stream = is_stream;
            Some(uif)
        })),
        ..Default::default()
    }
}

fn headers_to_record(headers: &HeaderMap) -> gproxy_provider_core::Headers {
    headers
        .iter()
        .filter(|(name, _)| name.as_str() != "authorization")
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.to_string(), v.to_string())))
        .collect()
}
