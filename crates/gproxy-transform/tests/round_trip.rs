use bytes::Bytes;
use gproxy_protocol::ProtocolTag;
use gproxy_transform::pipeline::{is_bypass, transform_request};
use gproxy_transform::uif::StreamCursor;
use gproxy_transform::{codec, HookCtx};

/// Same client/provider tag and no script means the pipeline must never
/// touch the bytes at all.
#[test]
fn bypass_applies_for_matching_tags_and_no_script() {
    assert!(is_bypass(ProtocolTag::OpenaiChat, ProtocolTag::OpenaiChat, None));
    assert!(!is_bypass(ProtocolTag::OpenaiChat, ProtocolTag::AnthropicMessages, None));
}

/// An OpenAI chat request that only uses UIF-expressible features
/// round-trips through UIF back to an OpenAI body with the same messages,
/// roles, tools, and sampling parameters.
#[test]
fn openai_round_trip_preserves_messages_and_sampling() {
    let original = serde_json::json!({
        "model": "gpt-4o",
        "messages": [
            {"role": "system", "content": "be terse"},
            {"role": "user", "content": "hi there"}
        ],
        "temperature": 0.4,
        "max_completion_tokens": 256,
        "stop": ["\n\n"],
        "stream": false
    });
    let body = Bytes::from(serde_json::to_vec(&original).unwrap());

    let mut ctx = HookCtx::new(
        ProtocolTag::OpenaiChat,
        ProtocolTag::OpenaiChat,
        "openai-main".to_string(),
        "gpt-4o".to_string(),
    );
    let round_tripped = transform_request(&mut ctx, &body, None).unwrap();

    let decoded: serde_json::Value = serde_json::from_slice(&round_tripped).unwrap();
    assert_eq!(decoded["model"], "gpt-4o");
    assert_eq!(decoded["messages"][0]["role"], "system");
    assert_eq!(decoded["messages"][1]["content"], "hi there");
    assert_eq!(decoded["temperature"], 0.4);
    assert_eq!(decoded["max_completion_tokens"], 256);
    assert_eq!(decoded["stop"][0], "\n\n");
}

#[test]
fn cross_protocol_preserves_system_and_tool_definitions() {
    let original = serde_json::json!({
        "model": "claude-3-opus",
        "messages": [{"role": "user", "content": "what's the weather"}],
        "stream": true,
        "tools": [{
            "type": "function",
            "function": {
                "name": "get_weather",
                "description": "Looks up the weather for a city",
                "parameters": {"type": "object", "properties": {"city": {"type": "string"}}}
            }
        }]
    });
    let body = Bytes::from(serde_json::to_vec(&original).unwrap());

    let uif = codec::decode_request(ProtocolTag::OpenaiChat, &body).unwrap();
    let anthropic_body = codec::encode_request(ProtocolTag::AnthropicMessages, &uif).unwrap();

    let decoded: serde_json::Value = serde_json::from_slice(&anthropic_body).unwrap();
    assert_eq!(decoded["model"], "claude-3-opus");
    assert_eq!(decoded["messages"][0]["role"], "user");
    assert_eq!(decoded["stream"], true);
    assert_eq!(decoded["tools"][0]["name"], "get_weather");
    assert_eq!(decoded["tools"][0]["input_schema"]["properties"]["city"]["type"], "string");
}

/// A tool call in an OpenAI provider response round-trips, with its id,
/// through UIF into an Anthropic client body as a `tool_use` block.
#[test]
fn tool_call_round_trips_from_openai_response_into_anthropic_client_body() {
    let provider_response = serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 0,
        "model": "gpt-4o",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_abc123",
                    "type": "function",
                    "function": {"name": "get_weather", "arguments": "{\"city\":\"Paris\"}"}
                }]
            },
            "finish_reason": "tool_calls"
        }]
    });
    let body = Bytes::from(serde_json::to_vec(&provider_response).unwrap());

    let uif = codec::decode_response(ProtocolTag::OpenaiChat, &body).unwrap();
    let anthropic_body = codec::encode_response(ProtocolTag::AnthropicMessages, &uif).unwrap();

    let decoded: serde_json::Value = serde_json::from_slice(&anthropic_body).unwrap();
    let tool_use = &decoded["content"][0];
    assert_eq!(tool_use["type"], "tool_use");
    assert_eq!(tool_use["id"], "call_abc123");
    assert_eq!(tool_use["name"], "get_weather");
    assert_eq!(tool_use["input"]["city"], "Paris");
    assert_eq!(decoded["stop_reason"], "tool_use");
}

/// The same tool call, streamed: an Anthropic provider's
/// `content_block_start`/`content_block_delta` pair carries the tool id and
/// name through to an OpenAI client's `tool_calls` delta.
#[test]
fn streamed_tool_call_id_and_name_survive_cross_protocol() {
    let mut cursor = StreamCursor::default();

    let start_frame = b"event: content_block_start\ndata: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"tool_use\",\"id\":\"toolu_1\",\"name\":\"get_weather\",\"input\":{}}}\n\n";
    let start_delta = codec::decode_stream_frame(ProtocolTag::AnthropicMessages, start_frame, &mut cursor)
        .unwrap()
        .expect("tool_use block start must produce a delta");
    assert_eq!(start_delta.tool_call_id.as_deref(), Some("toolu_1"));
    assert_eq!(start_delta.tool_name.as_deref(), Some("get_weather"));

    let openai_frame = codec::encode_stream_frame(ProtocolTag::OpenaiChat, &start_delta, &cursor).unwrap();
    let payload = std::str::from_utf8(&openai_frame)
        .unwrap()
        .strip_prefix("data: ")
        .unwrap()
        .trim();
    let chunk: serde_json::Value = serde_json::from_str(payload).unwrap();
    let tool_call = &chunk["choices"][0]["delta"]["tool_calls"][0];
    assert_eq!(tool_call["id"], "toolu_1");
    assert_eq!(tool_call["function"]["name"], "get_weather");
}
