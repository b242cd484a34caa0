//! Unified Internal Format and the four-hook transformer pipeline: the
//! subsystem that lets a client speaking one wire protocol be served by a
//! provider speaking another.

pub mod codec;
pub mod pipeline;
pub mod script;
pub mod stream;
pub mod uif;

pub type TransformResult<T> = Result<T, gproxy_common::GproxyError>;

pub(crate) fn transform_err(message: impl Into<String>) -> gproxy_common::GproxyError {
    gproxy_common::GproxyError::transform_error(message)
}

pub use pipeline::{is_bypass, stream_pipeline, transform_request, transform_response, HookCtx};
pub use script::ScriptHooks;
pub use stream::StreamPipeline;
