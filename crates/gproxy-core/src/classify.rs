//! Route classification: maps one of the five proxy routes to the client
//! protocol it speaks and the upstream path shape a provider needs.
//! `/v1/completions` is the one legacy exception — its body is adapted into
//! a chat-shaped request before entering the common pipeline.

use bytes::Bytes;
use gproxy_common::GproxyError;
use gproxy_protocol::ProtocolTag;
use gproxy_provider_impl::PathKind;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyRoute {
    V1ChatCompletions,
    V1Completions,
    V2ChatCompletions,
    V2Messages,
    V2Responses,
}

impl ProxyRoute {
    pub fn client_tag(self) -> ProtocolTag {
        match self {
            ProxyRoute::V1ChatCompletions | ProxyRoute::V1Completions | ProxyRoute::V2ChatCompletions => {
                ProtocolTag::OpenaiChat
            }
            ProxyRoute::V2Messages => ProtocolTag::AnthropicMessages,
            ProxyRoute::V2Responses => ProtocolTag::ResponseApi,
        }
    }

    pub fn path_kind(self) -> PathKind {
        match self {
            ProxyRoute::V1ChatCompletions | ProxyRoute::V1Completions | ProxyRoute::V2ChatCompletions => {
                PathKind::ChatCompletions
            }
            ProxyRoute::V2Messages => PathKind::Messages,
            ProxyRoute::V2Responses => PathKind::Responses,
        }
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            ProxyRoute::V1ChatCompletions => "/v1/chat/completions",
            ProxyRoute::V1Completions => "/v1/completions",
            ProxyRoute::V2ChatCompletions => "/v2/chat/completions",
            ProxyRoute::V2Messages => "/v2/messages",
            ProxyRoute::V2Responses => "/v2/responses",
        }
    }
}

/// Rewrites the legacy `/v1/completions` `{"prompt": ...}` body into the
/// chat-shaped `{"messages": [...]}` form the pipeline understands, per the
/// route table's "routed through openai_chat adapter" note. Any field the
/// chat shape already recognizes (model, stream, sampling params) passes
/// through unchanged.
pub fn adapt_legacy_completions(body: &Bytes) -> Result<Bytes, GproxyError> {
    let mut value: Value = serde_json::from_slice(body)
        .map_err(|err| GproxyError::transform_error(format!("invalid legacy completions body: {err}")))?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| GproxyError::transform_error("legacy completions body must be a JSON object"))?;

    let prompt = object
        .remove("prompt")
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    object.insert(
        "messages".to_string(),
        serde_json::json!([{ "role": "user", "content": prompt }]),
    );

    serde_json::to_vec(&value)
        .map(Bytes::from)
        .map_err(|err| GproxyError::transform_error(format!("failed to re-encode legacy completions body: {err}")))
}

/// Peeks the `model` field without materializing UIF; needed before
/// authentication since the allow-list check requires the normalized model
/// name.
pub fn peek_model(body: &Bytes) -> Result<String, GproxyError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| GproxyError::transform_error(format!("invalid request body: {err}")))?;
    value
        .get("model")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| GproxyError::transform_error("request body is missing a 'model' field"))
}

/// Peeks the `stream` field, defaulting to `false` when absent.
pub fn peek_stream(body: &Bytes) -> bool {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("stream").and_then(Value::as_bool))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_completions_prompt_becomes_a_user_message() {
        let body = Bytes::from_static(br#"{"model":"gpt-4o","prompt":"hi","stream":false}"#);
        let adapted = adapt_legacy_completions(&body).unwrap();
        let value: Value = serde_json::from_slice(&adapted).unwrap();
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hi");
        assert_eq!(value["model"], "gpt-4o");
    }

    #[test]
    fn peek_model_reads_without_full_parse() {
        let body = Bytes::from_static(br#"{"model":"claude-3-opus","messages":[]}"#);
        assert_eq!(peek_model(&body).unwrap(), "claude-3-opus");
    }
}
