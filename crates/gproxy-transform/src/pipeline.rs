//! The four-hook transformer pipeline: `request_out`, `request_in`,
//! `response_in`, `response_out`, composed from per-protocol codecs keyed
//! by (client_tag, provider_tag) instead of a hand-written pairwise matrix.

use std::collections::HashMap;

use bytes::Bytes;
use gproxy_protocol::ProtocolTag;

use crate::stream::StreamPipeline;
use crate::uif::{UifRequest, UifResponse};
use crate::TransformResult;
use crate::{codec, script::ScriptHooks};

/// Mutable context threaded through all four hooks for one request. Hooks
/// (hardcoded or scripted) read and write through this handle rather than
/// re-parsing bodies themselves.
pub struct HookCtx {
    client_tag: ProtocolTag,
    provider_tag: ProtocolTag,
    request_body: Option<Bytes>,
    response_body: Option<Bytes>,
    uif_request: Option<UifRequest>,
    uif_response: Option<UifResponse>,
    provider: String,
    model: String,
    metadata: HashMap<String, serde_json::Value>,
}

impl HookCtx {
    pub fn new(client_tag: ProtocolTag, provider_tag: ProtocolTag, provider: String, model: String) -> Self {
        Self {
            client_tag,
            provider_tag,
            request_body: None,
            response_body: None,
            uif_request: None,
            uif_response: None,
            provider,
            model,
            metadata: HashMap::new(),
        }
    }

    pub fn get_request(&self) -> Option<&Bytes> {
        self.request_body.as_ref()
    }

    pub fn set_request(&mut self, body: Bytes) {
        self.request_body = Some(body);
    }

    pub fn get_response(&self) -> Option<&Bytes> {
        self.response_body.as_ref()
    }

    pub fn set_response(&mut self, body: Bytes) {
        self.response_body = Some(body);
    }

    pub fn get_uif_request(&self) -> Option<&UifRequest> {
        self.uif_request.as_ref()
    }

    pub fn set_uif_request(&mut self, uif: UifRequest) {
        self.uif_request = Some(uif);
    }

    pub fn get_uif_response(&self) -> Option<&UifResponse> {
        self.uif_response.as_ref()
    }

    pub fn set_uif_response(&mut self, uif: UifResponse) {
        self.uif_response = Some(uif);
    }

    pub fn get_provider(&self) -> &str {
        &self.provider
    }

    pub fn get_model(&self) -> &str {
        &self.model
    }

    pub fn get_metadata(&self) -> &HashMap<String, serde_json::Value> {
        &self.metadata
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.metadata.insert(key.into(), value);
    }
}

/// True exactly when the bypass condition holds: same protocol tag on both
/// sides and no script attached. The caller must not materialize UIF in
/// this case.
pub fn is_bypass(client_tag: ProtocolTag, provider_tag: ProtocolTag, scripts: Option<&ScriptHooks>) -> bool {
    client_tag == provider_tag && scripts.is_none()
}

/// `request_out` then `request_in`: client body -> UIF -> provider body.
/// Guarantees UIF exists before any provider body is built.
pub fn transform_request(
    ctx: &mut HookCtx,
    client_body: &Bytes,
    scripts: Option<&ScriptHooks>,
) -> TransformResult<Bytes> {
    ctx.set_request(client_body.clone());

    let uif = match scripts.and_then(|s| s.request_out(client_body)) {
        Some(uif) => uif,
        None => codec::decode_request(ctx.client_tag, client_body)?,
    };
    ctx.set_uif_request(uif);

    let uif_ref = ctx.get_uif_request().expect("set above");
    let provider_body = match scripts.and_then(|s| s.request_in(uif_ref)) {
        Some(body) => body,
        None => codec::encode_request(ctx.provider_tag, uif_ref)?,
    };
    Ok(provider_body)
}

/// `response_in` then `response_out`: provider body -> UIF -> client body.
pub fn transform_response(
    ctx: &mut HookCtx,
    provider_body: &Bytes,
    scripts: Option<&ScriptHooks>,
) -> TransformResult<Bytes> {
    ctx.set_response(provider_body.clone());

    let uif = match scripts.and_then(|s| s.response_in(provider_body)) {
        Some(uif) => uif,
        None => codec::decode_response(ctx.provider_tag, provider_body)?,
    };
    ctx.set_uif_response(uif);

    let uif_ref = ctx.get_uif_response().expect("set above");
    let client_body = match scripts.and_then(|s| s.response_out(uif_ref)) {
        Some(body) => body,
        None => codec::encode_response(ctx.client_tag, uif_ref)?,
    };
    Ok(client_body)
}

/// Builds the streaming pipeline for one request: feeds upstream chunks
/// through `response_in` incrementally and `response_out` on each delta.
pub fn stream_pipeline(ctx: &HookCtx) -> StreamPipeline {
    StreamPipeline::new(ctx.provider_tag, ctx.client_tag)
}
