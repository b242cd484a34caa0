//! Model resolver: strips the configured provider prefix and finds the
//! enabled providers that advertise the requested model, resolving each
//! candidate's provider-facing target name.

use gproxy_common::GproxyError;
use gproxy_provider_core::{ConfigSnapshot, Provider};

/// Strips a `"<suffix>/"` prefix from the incoming model name when a
/// provider suffix is configured. An unrelated prefix (or no suffix
/// configured) passes the model name through unchanged.
pub fn normalize_model(raw_model: &str, provider_suffix: Option<&str>) -> String {
    match provider_suffix {
        Some(suffix) if !suffix.is_empty() => {
            let prefix = format!("{suffix}/");
            raw_model
                .strip_prefix(prefix.as_str())
                .unwrap_or(raw_model)
                .to_string()
        }
        _ => raw_model.to_string(),
    }
}

/// A provider able to serve the normalized model, plus the provider-facing
/// model name the UIF should carry instead of the client's name.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub provider: &'a Provider,
    pub mapped_model: &'a str,
}

/// The candidate set for `model`, in snapshot order. Empty only when no
/// enabled provider advertises the model (direct or wildcard mapping).
pub fn resolve_candidates<'a>(
    snapshot: &'a ConfigSnapshot,
    model: &str,
) -> Result<Vec<Candidate<'a>>, GproxyError> {
    let providers = snapshot.candidates_for_model(model);
    if providers.is_empty() {
        return Err(GproxyError::unknown_model(format!(
            "no enabled provider advertises model '{model}'"
        )));
    }

    let candidates: Vec<Candidate<'a>> = providers
        .into_iter()
        .filter_map(|provider| {
            provider
                .resolve_model(model)
                .map(|mapping| Candidate {
                    provider,
                    mapped_model: mapping.mapped_model(),
                })
        })
        .collect();

    if candidates.is_empty() {
        return Err(GproxyError::unknown_model(format!(
            "model '{model}' has no resolvable mapping on any enabled provider"
        )));
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_is_stripped_only_when_present() {
        assert_eq!(normalize_model("Proxy/gpt-4o", Some("Proxy")), "gpt-4o");
        assert_eq!(normalize_model("gpt-4o", Some("Proxy")), "gpt-4o");
        assert_eq!(normalize_model("gpt-4o", None), "gpt-4o");
    }
}
