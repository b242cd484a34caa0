//! Weighted selector: picks one candidate by weighted random draw,
//! walking deterministically in snapshot order. Stateless — no round-robin
//! cursor is kept, so concurrent reads never interfere with each other.

use gproxy_common::GproxyError;
use rand::Rng;

use crate::resolve::Candidate;

/// Draws a uniform `r` in `[0, W)` where `W` is the total weight of the
/// candidate set, then walks candidates in order subtracting weights until
/// the running sum exceeds `r`. A zero total weight yields `no_provider`.
pub fn select_weighted<'a, 'b>(candidates: &'b [Candidate<'a>]) -> Result<&'b Candidate<'a>, GproxyError> {
    let total: u64 = candidates.iter().map(|c| c.provider.weight as u64).sum();
    if total == 0 {
        return Err(GproxyError::no_provider(
            "candidate set has zero total weight",
        ));
    }

    let mut r = rand::rng().random_range(0..total);
    for candidate in candidates {
        let weight = candidate.provider.weight as u64;
        if r < weight {
            return Ok(candidate);
        }
        r -= weight;
    }
    // Unreachable when total > 0, but avoids a panic on floating-point drift.
    candidates.last().ok_or_else(|| GproxyError::no_provider("no candidates"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gproxy_provider_core::{ModelMapping, Provider, ProviderParams, ProviderType};
    use std::collections::HashMap;

    fn provider(id: i64, weight: u32) -> Provider {
        Provider {
            id,
            key: format!("p{id}"),
            provider_type: ProviderType::Openai,
            api_base: "https://example.com".to_string(),
            api_key: "sk-test".to_string(),
            model_mapping: HashMap::from([("m".to_string(), ModelMapping::Target("m".to_string()))]),
            weight,
            is_enabled: true,
            provider_params: ProviderParams::default(),
        }
    }

    #[test]
    fn zero_total_weight_yields_no_provider() {
        let providers = [provider(1, 0), provider(2, 0)];
        let candidates: Vec<Candidate> = providers
            .iter()
            .map(|p| Candidate { provider: p, mapped_model: "m" })
            .collect();
        assert!(select_weighted(&candidates).is_err());
    }

    #[test]
    fn single_candidate_always_wins() {
        let providers = [provider(1, 5)];
        let candidates: Vec<Candidate> = providers
            .iter()
            .map(|p| Candidate { provider: p, mapped_model: "m" })
            .collect();
        let picked = select_weighted(&candidates).unwrap();
        assert_eq!(picked.provider.id, 1);
    }

    #[test]
    fn frequency_converges_to_weight_ratio() {
        let providers = [provider(1, 1), provider(2, 3)];
        let candidates: Vec<Candidate> = providers
            .iter()
            .map(|p| Candidate { provider: p, mapped_model: "m" })
            .collect();
        let mut counts = [0u32; 2];
        for _ in 0..4000 {
            let picked = select_weighted(&candidates).unwrap();
            counts[(picked.provider.id - 1) as usize] += 1;
        }
        let ratio = counts[1] as f64 / counts[0] as f64;
        assert!((ratio - 3.0).abs() < 0.5, "ratio was {ratio}");
    }
}
