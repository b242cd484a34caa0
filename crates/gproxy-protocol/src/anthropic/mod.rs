pub mod error;
pub mod messages;

pub use error::{ErrorDetail, ErrorEnvelope};
pub use messages::{
    ContentBlock, ContentDelta, CreateMessageRequest, Message, MessageContent,
    MessageDeltaFields, MessageParam, ModelEntry, ModelListResponse, StreamEvent, SystemPrompt,
    ThinkingConfig, Tool, ToolResultContent, Usage,
};
