pub mod chat;
pub mod responses;

pub use chat::{
    ChatChoice, ChatChunkChoice, ChatCompletionChunk, ChatCompletionRequest,
    ChatCompletionResponse, ChatContent, ChatContentPart, ChatDelta, ChatFunctionCall,
    ChatFunctionCallDelta, ChatFunctionDef, ChatImageUrl, ChatMessage, ChatTool, ChatToolCall,
    ChatToolCallDelta, ChatUsage, CompletionTokensDetails, ModelEntry as ChatModelEntry,
    ModelListResponse as ChatModelListResponse, StopSequences,
};
pub use responses::{
    CreateResponseRequest, Response, ResponseContentPart, ResponseInput, ResponseInputItem,
    ResponseOutputItem, ResponseOutputTokensDetails, ResponseReasoningSummary, ResponseStreamEvent,
    ResponseUsage,
};
