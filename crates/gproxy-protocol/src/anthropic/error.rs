//! Anthropic's `{"type": "error", "error": {...}}` envelope, both for
//! top-level error responses and the `error` stream event.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(rename = "type", default = "default_error_type")]
    pub kind: String,
    pub error: ErrorDetail,
}

fn default_error_type() -> String {
    "error".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}
