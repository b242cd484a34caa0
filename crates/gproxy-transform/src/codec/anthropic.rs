//! `anthropic_messages` codec. Also used for Claude-on-Vertex providers,
//! whose wire body is Anthropic-shaped.

use bytes::Bytes;
use gproxy_protocol::anthropic::messages::{
    ContentBlock, ContentDelta, CreateMessageRequest, Message as AnthMessage, MessageContent,
    MessageDeltaFields, MessageParam, StreamEvent, SystemPrompt, Tool, Usage as AnthUsage,
};
use gproxy_protocol::sse;

use crate::uif::{ContentPart, FinishReason, Message, Role, SamplingParams, Usage as UifUsage};
use crate::uif::{StreamCursor, UifDelta, UifRequest, UifResponse};
use crate::TransformResult;

pub fn decode_request(body: &Bytes) -> TransformResult<UifRequest> {
    let req: CreateMessageRequest = serde_json::from_slice(body)
        .map_err(|e| crate::transform_err(format!("anthropic_messages request_out: {e}")))?;

    let mut messages = Vec::with_capacity(req.messages.len() + 1);
    if let Some(system) = req.system {
        let text = match system {
            SystemPrompt::Text(t) => t,
            SystemPrompt::Blocks(blocks) => {
                blocks.into_iter().map(|b| b.text).collect::<Vec<_>>().join("\n")
            }
        };
        messages.push(Message {
            role: Role::System,
            content: vec![ContentPart::Text { text }],
        });
    }

    for m in req.messages {
        messages.push(decode_message(m)?);
    }

    let tools = req
        .tools
        .unwrap_or_default()
        .into_iter()
        .map(|t| crate::uif::ToolDef {
            name: t.name,
            description: t.description,
            parameters: t.input_schema,
        })
        .collect();

    Ok(UifRequest {
        model: req.model,
        messages,
        tools,
        sampling: SamplingParams {
            temperature: req.temperature,
            top_p: req.top_p,
            max_output_tokens: Some(req.max_tokens),
            stop_sequences: req.stop_sequences.unwrap_or_default(),
        },
        stream: req.stream.unwrap_or(false),
        metadata: Default::default(),
    })
}

fn decode_message(m: MessageParam) -> TransformResult<Message> {
    let role = match m.role.as_str() {
        "user" => Role::User,
        "assistant" => Role::Assistant,
        other => return Err(crate::transform_err(format!("unknown anthropic role: {other}"))),
    };

    let blocks = match m.content {
        MessageContent::Text(text) => vec![ContentBlock::Text { text }],
        MessageContent::Blocks(blocks) => blocks,
    };

    let content = blocks.into_iter().map(decode_content_block).collect();
    Ok(Message { role, content })
}

fn decode_content_block(b: ContentBlock) -> ContentPart {
    match b {
        ContentBlock::Text { text } => ContentPart::Text { text },
        ContentBlock::Image { source } => ContentPart::Image {
            url: format!("data:{};base64,{}", source.media_type, source.data),
        },
        ContentBlock::ToolUse { id, name, input } => ContentPart::ToolCall {
            id,
            name,
            arguments: input.to_string(),
        },
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => {
            let text = match content {
                Some(gproxy_protocol::anthropic::messages::ToolResultContent::Text(t)) => t,
                Some(gproxy_protocol::anthropic::messages::ToolResultContent::Blocks(blocks)) => {
                    blocks
                        .into_iter()
                        .filter_map(|b| match b {
                            ContentBlock::Text { text } => Some(text),
                            _ => None,
                        })
                        .collect::<Vec<_>>()
                        .join("")
                }
                None => String::new(),
            };
            ContentPart::ToolResult {
                tool_call_id: tool_use_id,
                content: text,
                is_error: is_error.unwrap_or(false),
            }
        }
        ContentBlock::Thinking { thinking, signature } => ContentPart::Thinking {
            text: thinking,
            signature,
        },
    }
}

pub fn encode_request(uif: &UifRequest) -> TransformResult<Bytes> {
    let mut system_parts = Vec::new();
    let mut messages = Vec::new();

    for m in &uif.messages {
        if m.role == Role::System {
            for part in &m.content {
                if let ContentPart::Text { text } = part {
                    system_parts.push(text.clone());
                }
            }
            continue;
        }
        messages.push(encode_message(m));
    }

    let system = (!system_parts.is_empty()).then(|| SystemPrompt::Text(system_parts.join("\n")));

    let tools = (!uif.tools.is_empty()).then(|| {
        uif.tools
            .iter()
            .map(|t| Tool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.parameters.clone(),
            })
            .collect()
    });

    let req = CreateMessageRequest {
        model: uif.model.clone(),
        max_tokens: uif.sampling.max_output_tokens.unwrap_or(4096),
        messages,
        system,
        temperature: uif.sampling.temperature,
        top_p: uif.sampling.top_p,
        top_k: None,
        stop_sequences: (!uif.sampling.stop_sequences.is_empty())
            .then(|| uif.sampling.stop_sequences.clone()),
        stream: Some(uif.stream),
        tools,
        tool_choice: None,
        thinking: None,
        extensions: Default::default(),
    };

    serde_json::to_vec(&req)
        .map(Bytes::from)
        .map_err(|e| crate::transform_err(format!("anthropic_messages request_in: {e}")))
}

fn encode_message(m: &Message) -> MessageParam {
    let role = match m.role {
        Role::Assistant => "assistant",
        _ => "user",
    }
    .to_string();

    let content: Vec<ContentBlock> = m
        .content
        .iter()
        .map(|part| match part {
            ContentPart::Text { text } => ContentBlock::Text { text: text.clone() },
            ContentPart::Image { url } => ContentBlock::Image {
                source: gproxy_protocol::anthropic::messages::ImageSource {
                    kind: "base64".to_string(),
                    media_type: "image/png".to_string(),
                    data: url.clone(),
                },
            },
            ContentPart::ToolCall { id, name, arguments } => ContentBlock::ToolUse {
                id: id.clone(),
                name: name.clone(),
                input: serde_json::from_str(arguments).unwrap_or(serde_json::json!({})),
            },
            ContentPart::ToolResult {
                tool_call_id,
                content,
                is_error,
            } => ContentBlock::ToolResult {
                tool_use_id: tool_call_id.clone(),
                content: Some(gproxy_protocol::anthropic::messages::ToolResultContent::Text(
                    content.clone(),
                )),
                is_error: Some(*is_error),
            },
            ContentPart::Thinking { text, signature } => ContentBlock::Thinking {
                thinking: text.clone(),
                signature: signature.clone(),
            },
        })
        .collect();

    MessageParam {
        role,
        content: MessageContent::Blocks(content),
    }
}

pub fn decode_response(body: &Bytes) -> TransformResult<UifResponse> {
    let resp: AnthMessage = serde_json::from_slice(body)
        .map_err(|e| crate::transform_err(format!("anthropic_messages response_in: {e}")))?;

    let content = resp.content.into_iter().map(decode_content_block).collect();

    Ok(UifResponse {
        id: resp.id,
        model: resp.model,
        content,
        finish_reason: resp.stop_reason.as_deref().map(map_stop_reason_in),
        usage: UifUsage {
            prompt_tokens: Some(resp.usage.input_tokens),
            completion_tokens: Some(resp.usage.output_tokens),
            total_tokens: Some(resp.usage.input_tokens + resp.usage.output_tokens),
            reasoning_tokens: None,
        },
        timing: Default::default(),
    })
}

pub fn encode_response(uif: &UifResponse) -> TransformResult<Bytes> {
    let content = uif
        .content
        .iter()
        .map(|part| match part {
            ContentPart::Text { text } => ContentBlock::Text { text: text.clone() },
            ContentPart::ToolCall { id, name, arguments } => ContentBlock::ToolUse {
                id: id.clone(),
                name: name.clone(),
                input: serde_json::from_str(arguments).unwrap_or(serde_json::json!({})),
            },
            ContentPart::Thinking { text, signature } => ContentBlock::Thinking {
                thinking: text.clone(),
                signature: signature.clone(),
            },
            ContentPart::Image { url } => ContentBlock::Text { text: url.clone() },
            ContentPart::ToolResult {
                tool_call_id,
                content,
                is_error,
            } => ContentBlock::ToolResult {
                tool_use_id: tool_call_id.clone(),
                content: Some(gproxy_protocol::anthropic::messages::ToolResultContent::Text(
                    content.clone(),
                )),
                is_error: Some(*is_error),
            },
        })
        .collect();

    let resp = AnthMessage {
        id: uif.id.clone(),
        kind: "message".to_string(),
        role: "assistant".to_string(),
        content,
        model: uif.model.clone(),
        stop_reason: uif.finish_reason.map(map_stop_reason_out).map(String::from),
        stop_sequence: None,
        usage: AnthUsage {
            input_tokens: uif.usage.prompt_tokens.unwrap_or(0),
            output_tokens: uif.usage.completion_tokens.unwrap_or(0),
            cache_creation_input_tokens: None,
            cache_read_input_tokens: None,
        },
    };

    serde_json::to_vec(&resp)
        .map(Bytes::from)
        .map_err(|e| crate::transform_err(format!("anthropic_messages response_out: {e}")))
}

pub fn decode_stream_frame(
    frame: &[u8],
    cursor: &mut StreamCursor,
) -> TransformResult<Option<UifDelta>> {
    let Some(payload) = sse::data_payload(frame) else {
        return Ok(None);
    };

    let event: StreamEvent = serde_json::from_str(payload)
        .map_err(|e| crate::transform_err(format!("anthropic_messages response_in (stream): {e}")))?;

    match event {
        StreamEvent::MessageStart { message } => {
            cursor.response_id = Some(message.id);
            cursor.model = Some(message.model);
            Ok(None)
        }
        StreamEvent::ContentBlockDelta { index, delta } => Ok(Some(match delta {
            ContentDelta::TextDelta { text } => UifDelta {
                content_index: index,
                text_delta: Some(text),
                ..Default::default()
            },
            ContentDelta::InputJsonDelta { partial_json } => UifDelta {
                content_index: index,
                tool_args_delta: Some(partial_json),
                ..Default::default()
            },
            ContentDelta::ThinkingDelta { .. } | ContentDelta::SignatureDelta { .. } => {
                return Ok(None);
            }
        })),
        StreamEvent::MessageDelta { delta, usage } => {
            let finish_reason = delta.stop_reason.as_deref().map(map_stop_reason_in);
            if let Some(fr) = finish_reason {
                cursor.finish_reason = Some(fr);
            }
            cursor.usage = UifUsage {
                prompt_tokens: None,
                completion_tokens: Some(usage.output_tokens),
                total_tokens: None,
                reasoning_tokens: None,
            };
            Ok(Some(UifDelta {
                finish_reason,
                usage: Some(cursor.usage.clone()),
                ..Default::default()
            }))
        }
        StreamEvent::MessageStop => Ok(Some(UifDelta {
            is_terminal: true,
            ..Default::default()
        })),
        StreamEvent::ContentBlockStart { index, content_block } => match content_block {
            ContentBlock::ToolUse { id, name, .. } => Ok(Some(UifDelta {
                content_index: index,
                tool_call_id: Some(id),
                tool_name: Some(name),
                ..Default::default()
            })),
            _ => Ok(None),
        },
        StreamEvent::ContentBlockStop { .. } | StreamEvent::Ping => Ok(None),
        StreamEvent::Error { error } => Err(crate::transform_err(format!(
            "anthropic_messages upstream stream error: {}",
            error.message
        ))),
    }
}

pub fn encode_stream_frame(delta: &UifDelta, _cursor: &StreamCursor) -> TransformResult<Bytes> {
    if delta.is_terminal {
        return sse::encode_named("message_stop", &serde_json::json!({"type": "message_stop"}))
            .map_err(|e| crate::transform_err(format!("anthropic_messages stream encode: {e}")));
    }

    if let Some(name) = &delta.tool_name {
        let content_block = ContentBlock::ToolUse {
            id: delta.tool_call_id.clone().unwrap_or_default(),
            name: name.clone(),
            input: serde_json::json!({}),
        };
        return sse::encode_named(
            "content_block_start",
            &StreamEvent::ContentBlockStart {
                index: delta.content_index,
                content_block,
            },
        )
        .map_err(|e| crate::transform_err(format!("anthropic_messages stream encode: {e}")));
    }

    let delta_event = if let Some(text) = &delta.text_delta {
        ContentDelta::TextDelta { text: text.clone() }
    } else if let Some(partial) = &delta.tool_args_delta {
        ContentDelta::InputJsonDelta {
            partial_json: partial.clone(),
        }
    } else {
        let fields = MessageDeltaFields {
            stop_reason: delta.finish_reason.map(map_stop_reason_out).map(String::from),
            stop_sequence: None,
        };
        return sse::encode_named(
            "message_delta",
            &StreamEvent::MessageDelta {
                delta: fields,
                usage: AnthUsage {
                    input_tokens: 0,
                    output_tokens: delta
                        .usage
                        .as_ref()
                        .and_then(|u| u.completion_tokens)
                        .unwrap_or(0),
                    cache_creation_input_tokens: None,
                    cache_read_input_tokens: None,
                },
            },
        )
        .map_err(|e| crate::transform_err(format!("anthropic_messages stream encode: {e}")));
    };

    sse::encode_named(
        "content_block_delta",
        &StreamEvent::ContentBlockDelta {
            index: delta.content_index,
            delta: delta_event,
        },
    )
    .map_err(|e| crate::transform_err(format!("anthropic_messages stream encode: {e}")))
}

fn map_stop_reason_in(s: &str) -> FinishReason {
    match s {
        "max_tokens" => FinishReason::Length,
        "tool_use" => FinishReason::ToolCalls,
        "stop_sequence" | "end_turn" => FinishReason::Stop,
        _ => FinishReason::Stop,
    }
}

fn map_stop_reason_out(r: FinishReason) -> &'static str {
    match r {
        FinishReason::Stop => "end_turn",
        FinishReason::Length => "max_tokens",
        FinishReason::ToolCalls => "tool_use",
        FinishReason::ContentFilter => "end_turn",
        FinishReason::Error => "end_turn",
    }
}
