//! Credential authenticator: resolves the bearer token on an incoming
//! request to a credential and enforces its model allow-list. Rate limiting
//! is a separate concern (see [`crate::ratelimit`]); this module performs
//! no I/O and never touches the upstream.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use gproxy_common::GproxyError;
use gproxy_provider_core::{ConfigSnapshot, Credential};

/// Pulls the bearer token out of a standard `Authorization: Bearer <key>`
/// header. Any other scheme, or an absent header, is malformed.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(str::trim)
}

/// Steps 1-3 of the authenticator contract: extract, hash-compare, check
/// enabled. Model allow-list enforcement is a separate call since it needs
/// the normalized model name, which the caller derives via
/// [`crate::resolve::normalize_model`] before calling this.
pub fn authenticate<'a>(
    snapshot: &'a ConfigSnapshot,
    headers: &HeaderMap,
) -> Result<&'a Credential, GproxyError> {
    let Some(bearer) = extract_bearer(headers) else {
        tracing::warn!(event = "auth_rejected", reason = "missing_or_malformed_header", credential_id = -1);
        return Err(GproxyError::unauthorized("missing or malformed Authorization header"));
    };
    let Some(credential) = snapshot.find_credential_by_bearer(bearer) else {
        tracing::warn!(event = "auth_rejected", reason = "unknown_credential", credential_id = -1);
        return Err(GproxyError::unauthorized("unknown credential"));
    };
    if !credential.is_enabled {
        tracing::warn!(event = "auth_rejected", reason = "credential_disabled", credential_id = credential.id);
        return Err(GproxyError::forbidden("credential disabled"));
    }
    Ok(credential)
}

pub fn check_model_allowed(credential: &Credential, model: &str) -> Result<(), GproxyError> {
    if credential.allows_model(model) {
        Ok(())
    } else {
        tracing::warn!(
            event = "auth_rejected",
            credential_id = credential.id,
            model,
            reason = "forbidden_model"
        );
        Err(GproxyError::forbidden_model(format!(
            "model '{model}' is not in this credential's allow-list"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn credential(allowed: &[&str]) -> Credential {
        Credential {
            id: 1,
            name: "test".to_string(),
            key_hash: [0u8; 32],
            key_preview: "sk-***".to_string(),
            allowed_models: allowed.iter().map(|s| s.to_string()).collect(),
            rate_limit: None,
            is_enabled: true,
        }
    }

    #[test]
    fn extract_bearer_requires_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer sk-abc"));
        assert_eq!(extract_bearer(&headers), Some("sk-abc"));

        let mut basic = HeaderMap::new();
        basic.insert(AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(extract_bearer(&basic), None);
    }

    #[test]
    fn wildcard_allow_list_wins_over_specific_entries() {
        let credential = credential(&["gpt-4o", "*"]);
        assert!(check_model_allowed(&credential, "claude-3-opus").is_ok());
    }

    #[test]
    fn empty_allow_list_permits_everything() {
        let credential = credential(&[]);
        assert!(check_model_allowed(&credential, "anything").is_ok());
    }

    #[test]
    fn specific_allow_list_rejects_unlisted_model() {
        let credential = credential(&["gpt-4o"]);
        assert!(check_model_allowed(&credential, "claude-3-opus").is_err());
    }
}
