pub mod anthropic;
pub mod openai;
pub mod response_api;

use bytes::Bytes;
use gproxy_protocol::ProtocolTag;

use crate::uif::{StreamCursor, UifDelta, UifRequest, UifResponse};
use crate::TransformResult;

/// Decodes a client/provider body of the given protocol into UIF.
pub fn decode_request(tag: ProtocolTag, body: &Bytes) -> TransformResult<UifRequest> {
    match tag {
        ProtocolTag::OpenaiChat => openai::decode_request(body),
        ProtocolTag::AnthropicMessages => anthropic::decode_request(body),
        ProtocolTag::ResponseApi => response_api::decode_request(body),
    }
}

/// Encodes UIF into a body of the given protocol.
pub fn encode_request(tag: ProtocolTag, uif: &UifRequest) -> TransformResult<Bytes> {
    match tag {
        ProtocolTag::OpenaiChat => openai::encode_request(uif),
        ProtocolTag::AnthropicMessages => anthropic::encode_request(uif),
        ProtocolTag::ResponseApi => response_api::encode_request(uif),
    }
}

pub fn decode_response(tag: ProtocolTag, body: &Bytes) -> TransformResult<UifResponse> {
    match tag {
        ProtocolTag::OpenaiChat => openai::decode_response(body),
        ProtocolTag::AnthropicMessages => anthropic::decode_response(body),
        ProtocolTag::ResponseApi => response_api::decode_response(body),
    }
}

pub fn encode_response(tag: ProtocolTag, uif: &UifResponse) -> TransformResult<Bytes> {
    match tag {
        ProtocolTag::OpenaiChat => openai::encode_response(uif),
        ProtocolTag::AnthropicMessages => anthropic::encode_response(uif),
        ProtocolTag::ResponseApi => response_api::encode_response(uif),
    }
}

pub fn decode_stream_frame(
    tag: ProtocolTag,
    frame: &[u8],
    cursor: &mut StreamCursor,
) -> TransformResult<Option<UifDelta>> {
    match tag {
        ProtocolTag::OpenaiChat => openai::decode_stream_frame(frame, cursor),
        ProtocolTag::AnthropicMessages => anthropic::decode_stream_frame(frame, cursor),
        ProtocolTag::ResponseApi => response_api::decode_stream_frame(frame, cursor),
    }
}

pub fn encode_stream_frame(
    tag: ProtocolTag,
    delta: &UifDelta,
    cursor: &StreamCursor,
) -> TransformResult<Bytes> {
    match tag {
        ProtocolTag::OpenaiChat => openai::encode_stream_frame(delta, cursor),
        ProtocolTag::AnthropicMessages => anthropic::encode_stream_frame(delta, cursor),
        ProtocolTag::ResponseApi => response_api::encode_stream_frame(delta, cursor),
    }
}
