//! Client-facing bearer credential: distinct from any provider's own
//! upstream API key, which lives on [`crate::model::Provider`].

use serde::{Deserialize, Serialize};

pub type CredentialId = i64;

/// Requests per second. `None` on the owning [`Credential`] means
/// unlimited; `Some(0)` means deny all.
pub type RateLimit = f64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: CredentialId,
    pub name: String,
    /// Hash of the bearer key, compared in constant time against the
    /// incoming `Authorization` header. Plaintext keys never round-trip
    /// through this type.
    pub key_hash: [u8; 32],
    pub key_preview: String,
    /// Empty means "all models allowed".
    #[serde(default)]
    pub allowed_models: Vec<String>,
    #[serde(default)]
    pub rate_limit: Option<RateLimit>,
    pub is_enabled: bool,
}

impl Credential {
    /// Exact match or a single wildcard `*` entry; an allow-list containing
    /// both wins via the wildcard per the open-question resolution.
    pub fn allows_model(&self, model: &str) -> bool {
        self.allowed_models.is_empty()
            || self.allowed_models.iter().any(|m| m == "*" || m == model)
    }
}
