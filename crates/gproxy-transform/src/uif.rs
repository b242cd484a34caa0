//! Unified Internal Format: the protocol-neutral request/response
//! representation every codec decodes into and encodes out of.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One piece of a message's content. Thinking blocks round-trip through the
/// UIF even when the destination protocol cannot express them; the codec
/// that can't express `Thinking` drops it from the outgoing body but it
/// stays on the UIF for the log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    Image {
        url: String,
    },
    ToolCall {
        id: String,
        name: String,
        arguments: String,
    },
    ToolResult {
        tool_call_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
    Thinking {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplingParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Error,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_unix_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_chunk_unix_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_unix_ms: Option<i64>,
}

/// Protocol-neutral request. The model id here is the *provider-facing*
/// name once the resolver has mapped it; callers reconstruct the
/// client-facing model id separately when encoding a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UifRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDef>,
    #[serde(default)]
    pub sampling: SamplingParams,
    pub stream: bool,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UifResponse {
    pub id: String,
    pub model: String,
    pub content: Vec<ContentPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    #[serde(default)]
    pub usage: Usage,
    #[serde(default)]
    pub timing: Timing,
}

/// Incremental parser state for one streaming response. Lives on
/// `RequestContext`; never shared across requests.
#[derive(Debug, Clone, Default)]
pub struct StreamCursor {
    pub response_id: Option<String>,
    pub model: Option<String>,
    /// Accumulated text per content-part index, used to compute deltas.
    pub accumulated_text: HashMap<u32, String>,
    pub accumulated_tool_args: HashMap<u32, String>,
    pub finish_reason: Option<FinishReason>,
    pub usage: Usage,
    pub first_chunk_seen: bool,
}

/// One incremental update produced by a streaming `response_in` call: the
/// newly observed delta plus the cursor's updated view, so `response_out`
/// can emit a client chunk from the delta alone rather than the full UIF.
#[derive(Debug, Clone, Default)]
pub struct UifDelta {
    pub content_index: u32,
    pub text_delta: Option<String>,
    pub tool_call_id: Option<String>,
    pub tool_name: Option<String>,
    pub tool_args_delta: Option<String>,
    pub finish_reason: Option<FinishReason>,
    pub usage: Option<Usage>,
    pub is_terminal: bool,
}
