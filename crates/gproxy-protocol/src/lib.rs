//! Wire-level request/response/stream-event types for the three client
//! protocols the proxy accepts, plus the SSE framing shared by all of them.
//!
//! These types are intentionally narrower than any one vendor's full API
//! surface: enough fields to round-trip through the unified internal form
//! losslessly for the fields gproxy actually forwards, not a byte-for-byte
//! mirror of every vendor extension.

pub mod anthropic;
pub mod openai;
pub mod sse;

/// The three client-facing wire protocols gproxy understands. Backend
/// providers are tagged with the same set: Vertex/Gemini-hosted Claude is
/// tagged `AnthropicMessages` since its request/response bodies are
/// Anthropic-shaped, so no fourth variant exists for Gemini's native wire
/// format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolTag {
    OpenaiChat,
    AnthropicMessages,
    ResponseApi,
}

impl ProtocolTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolTag::OpenaiChat => "openai_chat",
            ProtocolTag::AnthropicMessages => "anthropic_messages",
            ProtocolTag::ResponseApi => "response_api",
        }
    }
}

impl std::fmt::Display for ProtocolTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
