//! Admission guard shared by every write path: fixed-window quotas per client address and
//! the generic payload caps.
//!
//! Counters live in process memory. They are keyed by `(bucket, client)` so each quota
//! is independent, and expired windows are swept by [`RateLimiter::prune`].

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use crate::{
    config::{PayloadLimits, RateLimitConfig},
    error::ServiceError,
    state::SharedState,
};

/// Quota a request is counted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateBucket {
    /// Room creation.
    RoomCreate,
    /// Join attempts.
    Join,
    /// Game-state writes and Script Murder actions.
    StateWrite,
}

/// Who is calling, as far as the admission guard and the registries care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    /// Client address the quotas are counted against.
    pub addr: String,
    /// Identity supplied by the upstream session layer (`x-client-id`).
    pub client_id: Option<String>,
    /// Whether the upstream session layer marked the caller as premium.
    pub premium: bool,
}

impl CallerContext {
    /// Caller with an address only.
    pub fn anonymous(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            client_id: None,
            premium: false,
        }
    }

    /// Attach an identity.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window counters keyed by bucket and client address.
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: DashMap<(RateBucket, String), Window>,
}

impl RateLimiter {
    /// Create a limiter enforcing the quotas in `config`.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: DashMap::new(),
        }
    }

    fn quota(&self, bucket: RateBucket) -> u32 {
        match bucket {
            RateBucket::RoomCreate => self.config.room_create,
            RateBucket::Join => self.config.join,
            RateBucket::StateWrite => self.config.state_write,
        }
    }

    /// Count one request from `client` against `bucket`.
    pub fn check(&self, bucket: RateBucket, client: &str) -> Result<(), ServiceError> {
        self.check_at(bucket, client, Instant::now())
    }

    /// Same as [`RateLimiter::check`] with an explicit clock.
    pub fn check_at(
        &self,
        bucket: RateBucket,
        client: &str,
        now: Instant,
    ) -> Result<(), ServiceError> {
        let window_len = self.config.window();
        let quota = self.quota(bucket);
        let mut entry = self
            .windows
            .entry((bucket, client.to_owned()))
            .or_insert(Window {
                started: now,
                count: 0,
            });

        let elapsed = now.saturating_duration_since(entry.started);
        if elapsed >= window_len {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= quota {
            let remaining = window_len.saturating_sub(now.saturating_duration_since(entry.started));
            return Err(ServiceError::RateLimited {
                bucket,
                retry_after_secs: ceil_secs(remaining).max(1),
            });
        }

        entry.count += 1;
        Ok(())
    }

    /// Drop windows that closed before `now`. Returns how many were removed.
    pub fn prune(&self, now: Instant) -> usize {
        let window_len = self.config.window();
        let before = self.windows.len();
        self.windows
            .retain(|_, window| now.saturating_duration_since(window.started) < window_len);
        before.saturating_sub(self.windows.len())
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// Count the request against the caller's quota, logging rejections.
pub fn admit(
    state: &SharedState,
    bucket: RateBucket,
    caller: &CallerContext,
) -> Result<(), ServiceError> {
    state
        .rate_limiter()
        .check(bucket, &caller.addr)
        .inspect_err(|err| {
            debug!(client = %caller.addr, bucket = ?bucket, error = %err, "request rejected by rate limiter");
        })
}

/// Enforce the generic caps on a game-state payload: JSON object, key count, serialized size.
pub fn check_payload(payload: &Value, limits: &PayloadLimits) -> Result<(), ServiceError> {
    let Value::Object(map) = payload else {
        return Err(ServiceError::InvalidPayloadType);
    };

    if map.len() > limits.max_keys {
        return Err(ServiceError::TooManyKeys {
            count: map.len(),
            max: limits.max_keys,
        });
    }

    let size = serde_json::to_vec(payload)
        .map(|bytes| bytes.len())
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
    if size > limits.max_bytes {
        return Err(ServiceError::PayloadTooLarge {
            size,
            max: limits.max_bytes,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn limiter(quota: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            window_secs: 60,
            room_create: quota,
            join: quota,
            state_write: quota,
        })
    }

    #[test]
    fn rejects_once_quota_is_spent() {
        let limiter = limiter(2);
        let now = Instant::now();
        assert!(limiter.check_at(RateBucket::Join, "1.2.3.4", now).is_ok());
        assert!(limiter.check_at(RateBucket::Join, "1.2.3.4", now).is_ok());

        let err = limiter
            .check_at(RateBucket::Join, "1.2.3.4", now + Duration::from_secs(10))
            .unwrap_err();
        match err {
            ServiceError::RateLimited {
                bucket,
                retry_after_secs,
            } => {
                assert_eq!(bucket, RateBucket::Join);
                assert_eq!(retry_after_secs, 50);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn buckets_and_clients_are_independent() {
        let limiter = limiter(1);
        let now = Instant::now();
        assert!(limiter.check_at(RateBucket::Join, "a", now).is_ok());
        assert!(limiter.check_at(RateBucket::StateWrite, "a", now).is_ok());
        assert!(limiter.check_at(RateBucket::Join, "b", now).is_ok());
        assert!(limiter.check_at(RateBucket::Join, "a", now).is_err());
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = limiter(1);
        let now = Instant::now();
        assert!(limiter.check_at(RateBucket::RoomCreate, "a", now).is_ok());
        assert!(limiter.check_at(RateBucket::RoomCreate, "a", now).is_err());
        assert!(
            limiter
                .check_at(RateBucket::RoomCreate, "a", now + Duration::from_secs(60))
                .is_ok()
        );
    }

    #[test]
    fn prune_drops_expired_windows() {
        let limiter = limiter(5);
        let now = Instant::now();
        limiter.check_at(RateBucket::Join, "a", now).unwrap();
        limiter
            .check_at(RateBucket::Join, "b", now + Duration::from_secs(30))
            .unwrap();

        assert_eq!(limiter.prune(now + Duration::from_secs(61)), 1);
        assert_eq!(limiter.windows.len(), 1);
    }

    #[test]
    fn payload_must_be_an_object() {
        let limits = PayloadLimits::default();
        for value in [json!(null), json!([1, 2]), json!("text"), json!(3)] {
            assert!(matches!(
                check_payload(&value, &limits),
                Err(ServiceError::InvalidPayloadType)
            ));
        }
        assert!(check_payload(&json!({}), &limits).is_ok());
    }

    #[test]
    fn payload_key_and_size_caps() {
        let limits = PayloadLimits {
            max_keys: 2,
            max_bytes: 32,
        };
        assert!(matches!(
            check_payload(&json!({"a": 1, "b": 2, "c": 3}), &limits),
            Err(ServiceError::TooManyKeys { count: 3, max: 2 })
        ));
        assert!(matches!(
            check_payload(&json!({"a": "x".repeat(40)}), &limits),
            Err(ServiceError::PayloadTooLarge { max: 32, .. })
        ));
    }
}
