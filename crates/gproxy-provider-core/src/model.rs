//! Provider configuration: a backend the selector can route to.

use std::collections::HashMap;

use gproxy_protocol::ProtocolTag;
use serde::{Deserialize, Serialize};

pub type ProviderId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    Openai,
    Azure,
    Anthropic,
    GeminiVertex,
    Copilot,
    Custom,
}

impl ProviderType {
    /// The wire protocol this provider type speaks, independent of the
    /// client's protocol. Vertex/Gemini providers speak Anthropic-shaped
    /// bodies here (Claude-on-Vertex); Gemini's own native wire format is
    /// out of scope for the transform pipeline.
    pub fn protocol_tag(self) -> ProtocolTag {
        match self {
            ProviderType::Openai | ProviderType::Azure | ProviderType::Copilot => {
                ProtocolTag::OpenaiChat
            }
            ProviderType::Anthropic | ProviderType::GeminiVertex => ProtocolTag::AnthropicMessages,
            ProviderType::Custom => ProtocolTag::OpenaiChat,
        }
    }
}

/// One entry in a provider's `model_mapping`: either a bare target model
/// name or a target plus capability hints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelMapping {
    Target(String),
    Entry {
        mapped_model: String,
        #[serde(default)]
        supports_tools: bool,
        #[serde(default)]
        supports_vision: bool,
    },
}

impl ModelMapping {
    pub fn mapped_model(&self) -> &str {
        match self {
            ModelMapping::Target(s) => s,
            ModelMapping::Entry { mapped_model, .. } => mapped_model,
        }
    }
}

/// Type-specific provider parameters: GCP project/location/publisher for
/// Vertex, arbitrary extra headers for any provider type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcp_project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcp_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcp_publisher: Option<String>,
    #[serde(default)]
    pub custom_headers: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub key: String,
    pub provider_type: ProviderType,
    pub api_base: String,
    pub api_key: String,
    pub model_mapping: HashMap<String, ModelMapping>,
    #[serde(default = "default_weight")]
    pub weight: u32,
    pub is_enabled: bool,
    #[serde(default)]
    pub provider_params: ProviderParams,
}

fn default_weight() -> u32 {
    1
}

impl Provider {
    /// Resolves `model` against this provider's mapping, preferring an
    /// exact match over the wildcard `"*"` entry.
    pub fn resolve_model(&self, model: &str) -> Option<&ModelMapping> {
        self.model_mapping.get(model).or_else(|| self.model_mapping.get("*"))
    }
}
