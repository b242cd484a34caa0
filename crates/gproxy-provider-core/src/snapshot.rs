//! Immutable, versioned view of providers + credentials, with indexes
//! precomputed once at construction rather than lazily — the selector and
//! authenticator must never pay parse cost on the hot path.

use std::collections::HashMap;
use std::time::SystemTime;

use sha2::{Digest, Sha256};

use crate::credential::{Credential, CredentialId};
use crate::model::{Provider, ProviderId};

#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    pub version: u64,
    pub created_at: SystemTime,
    pub providers: Vec<Provider>,
    pub credentials: Vec<Credential>,
    credential_by_hash: HashMap<[u8; 32], usize>,
    model_to_providers: HashMap<String, Vec<usize>>,
}

impl ConfigSnapshot {
    /// Builds a snapshot and its derived indexes in one pass. Disabled
    /// providers and credentials are kept (not filtered out) so ordering by
    /// snapshot insertion position is preserved for callers that need it;
    /// the selector skips disabled entries itself.
    pub fn new(version: u64, providers: Vec<Provider>, credentials: Vec<Credential>) -> Self {
        let mut credential_by_hash = HashMap::with_capacity(credentials.len());
        for (idx, cred) in credentials.iter().enumerate() {
            credential_by_hash.insert(cred.key_hash, idx);
        }

        let mut model_to_providers: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, provider) in providers.iter().enumerate() {
            for model in provider.model_mapping.keys() {
                model_to_providers.entry(model.clone()).or_default().push(idx);
            }
        }

        Self {
            version,
            created_at: SystemTime::now(),
            providers,
            credentials,
            credential_by_hash,
            model_to_providers,
        }
    }

    /// Hash-compares a raw bearer token in constant time against the
    /// credential index; plaintext keys never touch this path except as the
    /// ephemeral input to the hash.
    pub fn find_credential_by_bearer(&self, bearer: &str) -> Option<&Credential> {
        let hash: [u8; 32] = Sha256::digest(bearer.as_bytes()).into();
        self.credential_by_hash
            .keys()
            .find(|candidate| constant_time_eq(candidate, &hash))
            .and_then(|matched| self.credential_by_hash.get(matched))
            .map(|&idx| &self.credentials[idx])
    }

    pub fn credential_by_id(&self, id: CredentialId) -> Option<&Credential> {
        self.credentials.iter().find(|c| c.id == id)
    }

    /// Candidate providers advertising `model`, in snapshot order, including
    /// providers that only declare a wildcard mapping. Disabled providers
    /// are excluded here since callers never want them as candidates.
    pub fn candidates_for_model(&self, model: &str) -> Vec<&Provider> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();

        let mut push_all = |idxs: &[usize], out: &mut Vec<&Provider>| {
            for &idx in idxs {
                if seen.insert(idx) {
                    let provider = &self.providers[idx];
                    if provider.is_enabled {
                        out.push(provider);
                    }
                }
            }
        };

        if let Some(idxs) = self.model_to_providers.get(model) {
            push_all(idxs, &mut out);
        }
        if let Some(idxs) = self.model_to_providers.get("*") {
            push_all(idxs, &mut out);
        }
        out
    }

    pub fn provider_by_id(&self, id: ProviderId) -> Option<&Provider> {
        self.providers.iter().find(|p| p.id == id)
    }
}

/// Plain constant-time byte comparison (no data-dependent branching or
/// short-circuiting), independent of any third-party constant-time-compare
/// crate.
fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    let mut diff = 0u8;
    for i in 0..32 {
        diff |= a[i] ^ b[i];
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProviderParams, ProviderType};

    fn provider(id: ProviderId, model: &str) -> Provider {
        let mut mapping = HashMap::new();
        mapping.insert(model.to_string(), crate::model::ModelMapping::Target(model.to_string()));
        Provider {
            id,
            key: format!("provider-{id}"),
            provider_type: ProviderType::Openai,
            api_base: "https://api.example.com".to_string(),
            api_key: "sk-test".to_string(),
            model_mapping: mapping,
            weight: 1,
            is_enabled: true,
            provider_params: ProviderParams::default(),
        }
    }

    #[test]
    fn candidate_lookup_includes_wildcard_providers() {
        let mut wildcard = provider(2, "ignored");
        wildcard.model_mapping = HashMap::from([(
            "*".to_string(),
            crate::model::ModelMapping::Target("fallback".to_string()),
        )]);

        let snapshot = ConfigSnapshot::new(1, vec![provider(1, "gpt-4o"), wildcard], Vec::new());
        let candidates = snapshot.candidates_for_model("gpt-4o");
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn disabled_providers_are_never_candidates() {
        let mut p = provider(1, "gpt-4o");
        p.is_enabled = false;
        let snapshot = ConfigSnapshot::new(1, vec![p], Vec::new());
        assert!(snapshot.candidates_for_model("gpt-4o").is_empty());
    }
}
