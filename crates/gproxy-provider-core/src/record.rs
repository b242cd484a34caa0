//! The per-request log record the observer sink fans out to its targets.

use gproxy_protocol::ProtocolTag;
use serde::{Deserialize, Serialize};

use crate::credential::CredentialId;
use crate::headers::Headers;
use crate::model::ProviderId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRecord {
    pub request_id: String,
    pub endpoint: String,
    pub credential_id: CredentialId,
    pub credential_name: String,
    pub client_protocol: ProtocolTag,
    pub provider_protocol: ProtocolTag,
    pub provider_id: Option<ProviderId>,
    pub model_requested: String,
    pub model_mapped: Option<String>,
    pub is_streaming: bool,
    pub is_bypass: bool,
    pub status_code: u16,
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
    pub duration_ms: u64,
    pub ttft_ms: Option<u64>,
    pub error_category: Option<String>,
    pub error_message: Option<String>,
    pub request_headers: Headers,
    pub request_body: Option<Vec<u8>>,
    pub response_body: Option<Vec<u8>>,
    pub provider_request_body: Option<Vec<u8>>,
    pub provider_request_headers: Headers,
}

/// Truncates a body before it enters a [`RequestRecord`]; sinks must never
/// carry unbounded payloads.
pub fn bounded_body(body: &[u8], max_len: usize) -> Vec<u8> {
    if body.len() <= max_len {
        body.to_vec()
    } else {
        body[..max_len].to_vec()
    }
}
