//! `openai_chat` codec: client/provider-facing OpenAI Chat Completions
//! shape on one side, [`crate::uif`] on the other.

use bytes::Bytes;
use gproxy_protocol::openai::chat::{
    ChatChoice, ChatChunkChoice, ChatCompletionChunk, ChatCompletionRequest,
    ChatCompletionResponse, ChatContent, ChatContentPart, ChatDelta, ChatFunctionCall,
    ChatFunctionCallDelta, ChatFunctionDef, ChatImageUrl, ChatMessage, ChatTool, ChatToolCall,
    ChatToolCallDelta, ChatUsage, StopSequences,
};
use gproxy_protocol::sse;

use crate::uif::{ContentPart, FinishReason, Message, Role, SamplingParams, Usage as UifUsage};
use crate::uif::{StreamCursor, UifDelta, UifRequest, UifResponse};
use crate::TransformResult;

pub fn decode_request(body: &Bytes) -> TransformResult<UifRequest> {
    let req: ChatCompletionRequest = serde_json::from_slice(body)
        .map_err(|e| crate::transform_err(format!("openai_chat request_out: {e}")))?;

    let messages = req
        .messages
        .into_iter()
        .map(decode_message)
        .collect::<TransformResult<Vec<_>>>()?;

    let tools = req
        .tools
        .unwrap_or_default()
        .into_iter()
        .map(|t| crate::uif::ToolDef {
            name: t.function.name,
            description: t.function.description,
            parameters: t.function.parameters.unwrap_or(serde_json::json!({})),
        })
        .collect();

    let mut stop_sequences = Vec::new();
    if let Some(stop) = req.stop {
        match stop {
            StopSequences::One(s) => stop_sequences.push(s),
            StopSequences::Many(v) => stop_sequences = v,
        }
    }

    Ok(UifRequest {
        model: req.model,
        messages,
        tools,
        sampling: SamplingParams {
            temperature: req.temperature,
            top_p: req.top_p,
            max_output_tokens: req.max_completion_tokens.or(req.max_tokens),
            stop_sequences,
        },
        stream: req.stream.unwrap_or(false),
        metadata: Default::default(),
    })
}

fn decode_message(m: ChatMessage) -> TransformResult<Message> {
    let role = match m.role.as_str() {
        "system" | "developer" => Role::System,
        "user" => Role::User,
        "assistant" => Role::Assistant,
        "tool" => Role::Tool,
        other => return Err(crate::transform_err(format!("unknown chat role: {other}"))),
    };

    let mut content = Vec::new();
    match m.content {
        Some(ChatContent::Text(text)) => content.push(ContentPart::Text { text }),
        Some(ChatContent::Parts(parts)) => {
            for part in parts {
                match part {
                    ChatContentPart::Text { text } => content.push(ContentPart::Text { text }),
                    ChatContentPart::ImageUrl { image_url } => {
                        content.push(ContentPart::Image { url: image_url.url })
                    }
                }
            }
        }
        None => {}
    }

    if let Some(tool_call_id) = m.tool_call_id {
        let text = match m.content {
            Some(ChatContent::Text(t)) => t,
            _ => String::new(),
        };
        content = vec![ContentPart::ToolResult {
            tool_call_id,
            content: text,
            is_error: false,
        }];
    }

    for call in m.tool_calls.unwrap_or_default() {
        content.push(ContentPart::ToolCall {
            id: call.id,
            name: call.function.name,
            arguments: call.function.arguments,
        });
    }

    Ok(Message { role, content })
}

pub fn encode_request(uif: &UifRequest) -> TransformResult<Bytes> {
    let messages = uif
        .messages
        .iter()
        .map(encode_message)
        .collect::<TransformResult<Vec<_>>>()?;

    let tools = if uif.tools.is_empty() {
        None
    } else {
        Some(
            uif.tools
                .iter()
                .map(|t| ChatTool {
                    kind: "function".to_string(),
                    function: ChatFunctionDef {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters: Some(t.parameters.clone()),
                    },
                })
                .collect(),
        )
    };

    let req = ChatCompletionRequest {
        model: uif.model.clone(),
        messages,
        temperature: uif.sampling.temperature,
        top_p: uif.sampling.top_p,
        max_tokens: None,
        max_completion_tokens: uif.sampling.max_output_tokens,
        stop: (!uif.sampling.stop_sequences.is_empty())
            .then(|| StopSequences::Many(uif.sampling.stop_sequences.clone())),
        stream: Some(uif.stream),
        tools,
        tool_choice: None,
        extensions: Default::default(),
    };

    serde_json::to_vec(&req)
        .map(Bytes::from)
        .map_err(|e| crate::transform_err(format!("openai_chat request_in: {e}")))
}

fn encode_message(m: &Message) -> TransformResult<ChatMessage> {
    let role = match m.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
    .to_string();

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    let mut tool_call_id = None;
    let mut image_parts = Vec::new();

    for part in &m.content {
        match part {
            ContentPart::Text { text: t } => text.push_str(t),
            ContentPart::Image { url } => image_parts.push(ChatContentPart::ImageUrl {
                image_url: ChatImageUrl { url: url.clone() },
            }),
            ContentPart::ToolCall { id, name, arguments } => tool_calls.push(ChatToolCall {
                id: id.clone(),
                kind: "function".to_string(),
                function: ChatFunctionCall {
                    name: name.clone(),
                    arguments: arguments.clone(),
                },
            }),
            ContentPart::ToolResult {
                tool_call_id: id,
                content,
                ..
            } => {
                tool_call_id = Some(id.clone());
                text.push_str(content);
            }
            ContentPart::Thinking { .. } => {}
        }
    }

    let content = if image_parts.is_empty() {
        (!text.is_empty() || tool_calls.is_empty()).then(|| ChatContent::Text(text))
    } else {
        let mut parts = image_parts;
        if !text.is_empty() {
            parts.insert(0, ChatContentPart::Text { text });
        }
        Some(ChatContent::Parts(parts))
    };

    Ok(ChatMessage {
        role,
        content,
        name: None,
        tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
        tool_call_id,
    })
}

pub fn decode_response(body: &Bytes) -> TransformResult<UifResponse> {
    let resp: ChatCompletionResponse = serde_json::from_slice(body)
        .map_err(|e| crate::transform_err(format!("openai_chat response_in: {e}")))?;

    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| crate::transform_err("openai_chat response has no choices"))?;

    let mut content = match choice.message.content {
        Some(ChatContent::Text(text)) => vec![ContentPart::Text { text }],
        Some(ChatContent::Parts(_)) | None => Vec::new(),
    };
    for call in choice.message.tool_calls.unwrap_or_default() {
        content.push(ContentPart::ToolCall {
            id: call.id,
            name: call.function.name,
            arguments: call.function.arguments,
        });
    }

    Ok(UifResponse {
        id: resp.id,
        model: resp.model,
        content,
        finish_reason: choice.finish_reason.as_deref().map(map_finish_reason_in),
        usage: resp
            .usage
            .map(|u| UifUsage {
                prompt_tokens: Some(u.prompt_tokens),
                completion_tokens: Some(u.completion_tokens),
                total_tokens: Some(u.total_tokens),
                reasoning_tokens: u.completion_tokens_details.and_then(|d| d.reasoning_tokens),
            })
            .unwrap_or_default(),
        timing: Default::default(),
    })
}

pub fn encode_response(uif: &UifResponse) -> TransformResult<Bytes> {
    let text: String = uif
        .content
        .iter()
        .filter_map(|p| match p {
            ContentPart::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();

    let tool_calls: Vec<ChatToolCall> = uif
        .content
        .iter()
        .filter_map(|p| match p {
            ContentPart::ToolCall { id, name, arguments } => Some(ChatToolCall {
                id: id.clone(),
                kind: "function".to_string(),
                function: ChatFunctionCall {
                    name: name.clone(),
                    arguments: arguments.clone(),
                },
            }),
            _ => None,
        })
        .collect();

    let resp = ChatCompletionResponse {
        id: uif.id.clone(),
        object: "chat.completion".to_string(),
        created: uif.timing.start_unix_ms.unwrap_or(0) / 1000,
        model: uif.model.clone(),
        choices: vec![ChatChoice {
            index: 0,
            message: ChatMessage {
                role: "assistant".to_string(),
                content: (!text.is_empty() || tool_calls.is_empty()).then(|| ChatContent::Text(text)),
                name: None,
                tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                tool_call_id: None,
            },
            finish_reason: uif.finish_reason.map(map_finish_reason_out).map(String::from),
        }],
        usage: Some(ChatUsage {
            prompt_tokens: uif.usage.prompt_tokens.unwrap_or(0),
            completion_tokens: uif.usage.completion_tokens.unwrap_or(0),
            total_tokens: uif.usage.total_tokens.unwrap_or(0),
            completion_tokens_details: None,
        }),
    };

    serde_json::to_vec(&resp)
        .map(Bytes::from)
        .map_err(|e| crate::transform_err(format!("openai_chat response_out: {e}")))
}

/// Decodes one upstream SSE frame into a [`UifDelta`], updating `cursor`.
pub fn decode_stream_frame(
    frame: &[u8],
    cursor: &mut StreamCursor,
) -> TransformResult<Option<UifDelta>> {
    let Some(payload) = sse::data_payload(frame) else {
        return Ok(None);
    };
    if payload == "[DONE]" {
        return Ok(Some(UifDelta {
            is_terminal: true,
            ..Default::default()
        }));
    }

    let chunk: ChatCompletionChunk = serde_json::from_str(payload)
        .map_err(|e| crate::transform_err(format!("openai_chat response_in (stream): {e}")))?;

    cursor.response_id = Some(chunk.id);
    cursor.model = Some(chunk.model);

    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(None);
    };

    let finish_reason = choice.finish_reason.as_deref().map(map_finish_reason_in);
    if let Some(fr) = finish_reason {
        cursor.finish_reason = Some(fr);
    }
    if let Some(u) = chunk.usage {
        cursor.usage = UifUsage {
            prompt_tokens: Some(u.prompt_tokens),
            completion_tokens: Some(u.completion_tokens),
            total_tokens: Some(u.total_tokens),
            reasoning_tokens: u.completion_tokens_details.and_then(|d| d.reasoning_tokens),
        };
    }

    let mut delta = UifDelta {
        content_index: choice.index,
        text_delta: choice.delta.content,
        finish_reason,
        usage: chunk.usage.is_some().then(|| cursor.usage.clone()),
        is_terminal: false,
        ..Default::default()
    };

    if let Some(tool_call) = choice.delta.tool_calls.into_iter().flatten().next() {
        delta.content_index = tool_call.index;
        delta.tool_call_id = tool_call.id;
        if let Some(function) = tool_call.function {
            delta.tool_name = function.name;
            delta.tool_args_delta = function.arguments;
        }
    }

    Ok(Some(delta))
}

/// Encodes a [`UifDelta`] as one outgoing OpenAI SSE frame.
pub fn encode_stream_frame(delta: &UifDelta, cursor: &StreamCursor) -> TransformResult<Bytes> {
    if delta.is_terminal {
        return Ok(Bytes::from_static(sse::OPENAI_DONE_FRAME));
    }

    let tool_calls = (delta.tool_call_id.is_some()
        || delta.tool_name.is_some()
        || delta.tool_args_delta.is_some())
    .then(|| {
        vec![ChatToolCallDelta {
            index: delta.content_index,
            id: delta.tool_call_id.clone(),
            function: (delta.tool_name.is_some() || delta.tool_args_delta.is_some()).then(|| {
                ChatFunctionCallDelta {
                    name: delta.tool_name.clone(),
                    arguments: delta.tool_args_delta.clone(),
                }
            }),
        }]
    });

    let chunk = ChatCompletionChunk {
        id: cursor.response_id.clone().unwrap_or_default(),
        object: "chat.completion.chunk".to_string(),
        created: 0,
        model: cursor.model.clone().unwrap_or_default(),
        choices: vec![ChatChunkChoice {
            index: delta.content_index,
            delta: ChatDelta {
                role: None,
                content: delta.text_delta.clone(),
                tool_calls,
            },
            finish_reason: delta.finish_reason.map(map_finish_reason_out).map(String::from),
        }],
        usage: None,
    };

    sse::encode_data(&chunk).map_err(|e| crate::transform_err(format!("openai_chat stream encode: {e}")))
}

fn map_finish_reason_in(s: &str) -> FinishReason {
    match s {
        "length" => FinishReason::Length,
        "tool_calls" => FinishReason::ToolCalls,
        "content_filter" => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    }
}

fn map_finish_reason_out(r: FinishReason) -> &'static str {
    match r {
        FinishReason::Stop => "stop",
        FinishReason::Length => "length",
        FinishReason::ToolCalls => "tool_calls",
        FinishReason::ContentFilter => "content_filter",
        FinishReason::Error => "stop",
    }
}
