//! `response_api` codec (`/v2/responses`).

use bytes::Bytes;
use gproxy_protocol::openai::responses::{
    CreateResponseRequest, Response, ResponseContentPart, ResponseInput, ResponseInputItem,
    ResponseOutputItem, ResponseOutputTokensDetails, ResponseStreamEvent, ResponseUsage,
};

use crate::uif::{ContentPart, FinishReason, Message, Role, SamplingParams, Usage as UifUsage};
use crate::uif::{StreamCursor, UifDelta, UifRequest, UifResponse};
use crate::TransformResult;

pub fn decode_request(body: &Bytes) -> TransformResult<UifRequest> {
    let req: CreateResponseRequest = serde_json::from_slice(body)
        .map_err(|e| crate::transform_err(format!("response_api request_out: {e}")))?;

    let mut messages = Vec::new();
    if let Some(instructions) = req.instructions {
        messages.push(Message {
            role: Role::System,
            content: vec![ContentPart::Text { text: instructions }],
        });
    }

    match req.input {
        ResponseInput::Text(text) => messages.push(Message {
            role: Role::User,
            content: vec![ContentPart::Text { text }],
        }),
        ResponseInput::Items(items) => {
            for item in items {
                if let Some(m) = decode_input_item(item) {
                    messages.push(m);
                }
            }
        }
    }

    Ok(UifRequest {
        model: req.model,
        messages,
        tools: Vec::new(),
        sampling: SamplingParams {
            temperature: req.temperature,
            top_p: req.top_p,
            max_output_tokens: req.max_output_tokens,
            stop_sequences: Vec::new(),
        },
        stream: req.stream.unwrap_or(false),
        metadata: Default::default(),
    })
}

fn decode_input_item(item: ResponseInputItem) -> Option<Message> {
    match item {
        ResponseInputItem::Message { role, content } => {
            let role = match role.as_str() {
                "system" | "developer" => Role::System,
                "assistant" => Role::Assistant,
                _ => Role::User,
            };
            let content = content
                .into_iter()
                .map(|p| match p {
                    ResponseContentPart::InputText { text } | ResponseContentPart::OutputText { text } => {
                        ContentPart::Text { text }
                    }
                    ResponseContentPart::InputImage { image_url } => ContentPart::Image { url: image_url },
                })
                .collect();
            Some(Message { role, content })
        }
        ResponseInputItem::FunctionCall {
            id,
            name,
            arguments,
            ..
        } => Some(Message {
            role: Role::Assistant,
            content: vec![ContentPart::ToolCall { id, name, arguments }],
        }),
        ResponseInputItem::FunctionCallOutput { call_id, output } => Some(Message {
            role: Role::Tool,
            content: vec![ContentPart::ToolResult {
                tool_call_id: call_id,
                content: output,
                is_error: false,
            }],
        }),
        ResponseInputItem::Reasoning { summary, .. } => {
            let text = summary.into_iter().map(|s| s.text).collect::<Vec<_>>().join("\n");
            (!text.is_empty()).then(|| Message {
                role: Role::Assistant,
                content: vec![ContentPart::Thinking {
                    text,
                    signature: None,
                }],
            })
        }
    }
}

pub fn encode_request(uif: &UifRequest) -> TransformResult<Bytes> {
    let mut instructions = None;
    let mut items = Vec::new();

    for m in &uif.messages {
        if m.role == Role::System {
            let text: String = m
                .content
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect();
            instructions = Some(text);
            continue;
        }

        let role = match m.role {
            Role::Assistant => "assistant",
            Role::Tool => "user",
            _ => "user",
        }
        .to_string();

        let content = m
            .content
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text { text } => Some(ResponseContentPart::InputText { text: text.clone() }),
                ContentPart::Image { url } => Some(ResponseContentPart::InputImage { image_url: url.clone() }),
                _ => None,
            })
            .collect();

        items.push(ResponseInputItem::Message { role, content });
    }

    let req = CreateResponseRequest {
        model: uif.model.clone(),
        input: ResponseInput::Items(items),
        instructions,
        temperature: uif.sampling.temperature,
        top_p: uif.sampling.top_p,
        max_output_tokens: uif.sampling.max_output_tokens,
        stream: Some(uif.stream),
        tools: None,
        extensions: Default::default(),
    };

    serde_json::to_vec(&req)
        .map(Bytes::from)
        .map_err(|e| crate::transform_err(format!("response_api request_in: {e}")))
}

pub fn decode_response(body: &Bytes) -> TransformResult<UifResponse> {
    let resp: Response = serde_json::from_slice(body)
        .map_err(|e| crate::transform_err(format!("response_api response_in: {e}")))?;

    let mut content = Vec::new();
    for item in &resp.output {
        match item {
            ResponseOutputItem::Message { content: parts, .. } => {
                for part in parts {
                    if let ResponseContentPart::OutputText { text } = part {
                        content.push(ContentPart::Text { text: text.clone() });
                    }
                }
            }
            ResponseOutputItem::FunctionCall {
                call_id, name, arguments, ..
            } => content.push(ContentPart::ToolCall {
                id: call_id.clone(),
                name: name.clone(),
                arguments: arguments.clone(),
            }),
            ResponseOutputItem::Reasoning { .. } => {}
        }
    }

    Ok(UifResponse {
        id: resp.id,
        model: resp.model,
        content,
        finish_reason: (resp.status == "completed").then_some(FinishReason::Stop),
        usage: resp
            .usage
            .map(|u| UifUsage {
                prompt_tokens: Some(u.input_tokens),
                completion_tokens: Some(u.output_tokens),
                total_tokens: Some(u.total_tokens),
                reasoning_tokens: u.output_tokens_details.and_then(|d| d.reasoning_tokens),
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

    let mut output = Vec::new();
    if !text.is_empty() {
        output.push(ResponseOutputItem::Message {
            id: format!("{}-msg", uif.id),
            role: "assistant".to_string(),
            content: vec![ResponseContentPart::OutputText { text }],
        });
    }
    for (i, part) in uif.content.iter().enumerate() {
        if let ContentPart::ToolCall { id, name, arguments } = part {
            output.push(ResponseOutputItem::FunctionCall {
                id: format!("{}-call-{i}", uif.id),
                call_id: id.clone(),
                name: name.clone(),
                arguments: arguments.clone(),
            });
        }
    }

    let resp = Response {
        id: uif.id.clone(),
        object: "response".to_string(),
        created_at: uif.timing.start_unix_ms.unwrap_or(0) / 1000,
        model: uif.model.clone(),
        status: "completed".to_string(),
        output,
        usage: Some(ResponseUsage {
            input_tokens: uif.usage.prompt_tokens.unwrap_or(0),
            output_tokens: uif.usage.completion_tokens.unwrap_or(0),
            total_tokens: uif.usage.total_tokens.unwrap_or(0),
            output_tokens_details: uif
                .usage
                .reasoning_tokens
                .map(|r| ResponseOutputTokensDetails {
                    reasoning_tokens: Some(r),
                }),
        }),
    };

    serde_json::to_vec(&resp)
        .map(Bytes::from)
        .map_err(|e| crate::transform_err(format!("response_api response_out: {e}")))
}

/// The Response API isn't Anthropic-style named SSE or OpenAI's flat
/// `data:` chunk train; it's a tagged `ResponseStreamEvent` per frame.
pub fn decode_stream_frame(
    frame: &[u8],
    cursor: &mut StreamCursor,
) -> TransformResult<Option<UifDelta>> {
    let Some(payload) = gproxy_protocol::sse::data_payload(frame) else {
        return Ok(None);
    };

    let event: ResponseStreamEvent = serde_json::from_str(payload)
        .map_err(|e| crate::transform_err(format!("response_api response_in (stream): {e}")))?;

    match event {
        ResponseStreamEvent::Created { response } => {
            cursor.response_id = Some(response.id);
            cursor.model = Some(response.model);
            Ok(None)
        }
        ResponseStreamEvent::OutputTextDelta { delta, .. } => Ok(Some(UifDelta {
            text_delta: Some(delta),
            ..Default::default()
        })),
        ResponseStreamEvent::OutputItemDone { output_index, item } => match item {
            ResponseOutputItem::FunctionCall {
                call_id, name, arguments, ..
            } => Ok(Some(UifDelta {
                content_index: output_index,
                tool_call_id: Some(call_id),
                tool_name: Some(name),
                tool_args_delta: Some(arguments),
                ..Default::default()
            })),
            ResponseOutputItem::Message { .. } | ResponseOutputItem::Reasoning { .. } => Ok(None),
        },
        ResponseStreamEvent::Completed { response } => {
            if let Some(u) = response.usage {
                cursor.usage = UifUsage {
                    prompt_tokens: Some(u.input_tokens),
                    completion_tokens: Some(u.output_tokens),
                    total_tokens: Some(u.total_tokens),
                    reasoning_tokens: u.output_tokens_details.and_then(|d| d.reasoning_tokens),
                };
            }
            cursor.finish_reason = Some(FinishReason::Stop);
            Ok(Some(UifDelta {
                finish_reason: Some(FinishReason::Stop),
                usage: Some(cursor.usage.clone()),
                is_terminal: true,
                ..Default::default()
            }))
        }
        ResponseStreamEvent::Error { message } => {
            Err(crate::transform_err(format!("response_api upstream stream error: {message}")))
        }
    }
}

pub fn encode_stream_frame(delta: &UifDelta, cursor: &StreamCursor) -> TransformResult<Bytes> {
    let event = if delta.is_terminal {
        ResponseStreamEvent::Completed {
            response: Response {
                id: cursor.response_id.clone().unwrap_or_default(),
                object: "response".to_string(),
                created_at: 0,
                model: cursor.model.clone().unwrap_or_default(),
                status: "completed".to_string(),
                output: Vec::new(),
                usage: Some(ResponseUsage {
                    input_tokens: cursor.usage.prompt_tokens.unwrap_or(0),
                    output_tokens: cursor.usage.completion_tokens.unwrap_or(0),
                    total_tokens: cursor.usage.total_tokens.unwrap_or(0),
                    output_tokens_details: None,
                }),
            },
        }
    } else if let Some(name) = &delta.tool_name {
        ResponseStreamEvent::OutputItemDone {
            output_index: delta.content_index,
            item: ResponseOutputItem::FunctionCall {
                id: format!("{}-call-{}", cursor.response_id.clone().unwrap_or_default(), delta.content_index),
                call_id: delta.tool_call_id.clone().unwrap_or_default(),
                name: name.clone(),
                arguments: delta.tool_args_delta.clone().unwrap_or_default(),
            },
        }
    } else {
        ResponseStreamEvent::OutputTextDelta {
            item_id: cursor.response_id.clone().unwrap_or_default(),
            output_index: delta.content_index,
            delta: delta.text_delta.clone().unwrap_or_default(),
        }
    };

    gproxy_protocol::sse::encode_data(&event)
        .map_err(|e| crate::transform_err(format!("response_api stream encode: {e}")))
}
