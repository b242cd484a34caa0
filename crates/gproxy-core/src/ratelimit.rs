//! Rate limiter: a per-credential token bucket keyed by credential id.
//! Bucket state is process-local; nothing here coordinates across
//! replicas. Credentials without a configured rate limit bypass the
//! limiter entirely; a configured limit of zero denies every request.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use gproxy_common::GproxyError;
use gproxy_provider_core::{Credential, CredentialId};

struct Bucket {
    capacity: f64,
    rate: f64,
    tokens: f64,
    last_refill: Instant,
}

pub struct RateLimiter {
    buckets: Mutex<HashMap<CredentialId, Bucket>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Refills the credential's bucket by elapsed time * rate (capped at
    /// capacity) and withdraws one token, atomically under the bucket map's
    /// lock. `rate_limit == 0` is an explicit, permanent deny.
    pub fn try_acquire(&self, credential: &Credential) -> Result<(), GproxyError> {
        let Some(rate) = credential.rate_limit else {
            return Ok(());
        };
        if rate <= 0.0 {
            return Err(GproxyError::rate_limited("credential rate_limit is zero"));
        }

        let mut buckets = self.buckets.lock().expect("rate limiter lock poisoned");
        let now = Instant::now();
        let bucket = buckets.entry(credential.id).or_insert_with(|| Bucket {
            capacity: rate.max(1.0),
            rate,
            tokens: rate.max(1.0),
            last_refill: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * bucket.rate).min(bucket.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else {
            Err(GproxyError::rate_limited("rate limit exceeded"))
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(rate_limit: Option<f64>) -> Credential {
        Credential {
            id: 1,
            name: "test".to_string(),
            key_hash: [0u8; 32],
            key_preview: "sk-***".to_string(),
            allowed_models: Vec::new(),
            rate_limit,
            is_enabled: true,
        }
    }

    #[test]
    fn absent_limit_never_rejects() {
        let limiter = RateLimiter::new();
        let credential = credential(None);
        for _ in 0..100 {
            assert!(limiter.try_acquire(&credential).is_ok());
        }
    }

    #[test]
    fn zero_limit_always_rejects() {
        let limiter = RateLimiter::new();
        let credential = credential(Some(0.0));
        assert!(limiter.try_acquire(&credential).is_err());
    }

    #[test]
    fn burst_beyond_capacity_is_throttled() {
        let limiter = RateLimiter::new();
        let credential = credential(Some(2.0));
        let mut successes = 0;
        for _ in 0..10 {
            if limiter.try_acquire(&credential).is_ok() {
                successes += 1;
            }
        }
        assert!(successes <= 2);
    }
}
