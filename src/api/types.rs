//! Shared types for the API layer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::models::UserRole;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
/// Wraps `CoreState` plus API-specific limiters.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    pub login_limiter: Arc<Mutex<RateLimiter>>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self {
            core,
            login_limiter: Arc::new(Mutex::new(RateLimiter::new())),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// User context: injected by auth middleware
// ═══════════════════════════════════════════════════════════

/// Authenticated staff member, injected into request extensions
/// by the auth middleware after successful token validation.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
    pub token_hash: [u8; 32],
}

impl UserContext {
    /// Fail with 403 unless this user's role covers `required`.
    pub fn require(&self, required: UserRole) -> Result<(), ApiError> {
        if self.role.grants(required) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(required))
        }
    }
}

/// Parse a path segment as a UUID.
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid ID format: {raw}")))
}

/// Run CPU-heavy work (password hashing) off the async worker threads.
pub async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("Blocking task failed: {e}")))?
}

// ═══════════════════════════════════════════════════════════
// Rate limiter: per-key sliding window
// ═══════════════════════════════════════════════════════════

const WINDOW: Duration = Duration::from_secs(3600);

/// Per-key rate limiter with per-minute and per-hour limits.
/// Keyed by username for login attempts. At most `max_keys` keys are
/// tracked at once.
pub struct RateLimiter {
    windows: HashMap<String, Vec<Instant>>,
    per_minute: u32,
    per_hour: u32,
    max_keys: usize,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_limits(10, 100, 1000)
    }

    pub fn with_limits(per_minute: u32, per_hour: u32, max_keys: usize) -> Self {
        Self {
            windows: HashMap::new(),
            per_minute,
            per_hour,
            max_keys: max_keys.max(1),
        }
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    /// Drop expired keys; if still full, evict the least recently used
    /// down to three quarters of capacity.
    fn sweep(&mut self, now: Instant) {
        self.windows.retain(|_, entries| {
            entries.retain(|ts| now.duration_since(*ts) < WINDOW);
            !entries.is_empty()
        });
        if self.windows.len() < self.max_keys {
            return;
        }

        let mut by_last: Vec<(Instant, String)> = self
            .windows
            .iter()
            .filter_map(|(key, entries)| entries.last().map(|ts| (*ts, key.clone())))
            .collect();
        by_last.sort();
        let keep = self.max_keys * 3 / 4;
        let excess = self.windows.len().saturating_sub(keep);
        for (_, key) in by_last.into_iter().take(excess) {
            self.windows.remove(&key);
        }
    }

    /// Check if a key is within rate limits. Returns `Ok(())` or
    /// `Err(retry_after_secs)` if exceeded.
    pub fn check(&mut self, key: &str) -> Result<(), u64> {
        let now = Instant::now();
        if !self.windows.contains_key(key) && self.windows.len() >= self.max_keys {
            self.sweep(now);
        }
        let entries = self.windows.entry(key.to_string()).or_default();

        entries.retain(|ts| now.duration_since(*ts) < WINDOW);

        let last_minute = entries
            .iter()
            .filter(|ts| now.duration_since(**ts) < Duration::from_secs(60))
            .count() as u32;
        if last_minute >= self.per_minute {
            return Err(60);
        }
        if entries.len() as u32 >= self.per_hour {
            return Err(3600);
        }

        entries.push(now);
        Ok(())
    }

    /// Forget a key's history (after a successful login).
    pub fn clear(&mut self, key: &str) {
        self.windows.remove(key);
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

    fn ctx(role: UserRole) -> UserContext {
        UserContext {
            user_id: Uuid::new_v4(),
            username: "u".into(),
            role,
            token_hash: [0u8; 32],
        }
    }

    #[test]
    fn role_requirements() {
        assert!(ctx(UserRole::Admin).require(UserRole::Admin).is_ok());
        assert!(ctx(UserRole::Doctor).require(UserRole::Receptionist).is_ok());
        assert!(ctx(UserRole::Doctor).require(UserRole::Admin).is_err());
        assert!(ctx(UserRole::Receptionist).require(UserRole::Doctor).is_err());
    }

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(parse_id("not-a-uuid").is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn rate_limiter_allows_under_limit() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.check("admin").is_ok());
        assert!(limiter.check("admin").is_ok());
    }

    #[test]
    fn rate_limiter_rejects_over_per_minute() {
        let mut limiter = RateLimiter::with_limits(2, 1000, 1000);
        assert!(limiter.check("admin").is_ok());
        assert!(limiter.check("admin").is_ok());
        assert_eq!(limiter.check("admin"), Err(60));
        limiter.clear("admin");
        assert!(limiter.check("admin").is_ok());
    }

    #[test]
    fn rate_limiter_isolates_keys() {
        let mut limiter = RateLimiter::with_limits(1, 1000, 1000);
        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("b").is_ok());
        assert_eq!(limiter.check("a"), Err(60));
    }

    #[test]
    fn rate_limiter_caps_tracked_keys() {
        let mut limiter = RateLimiter::with_limits(1, 1000, 10);
        for i in 0..100 {
            assert!(limiter.check(&format!("user-{i}")).is_ok());
            assert!(limiter.tracked_keys() <= 10);
        }
        // The most recent key keeps its history.
        assert_eq!(limiter.check("user-99"), Err(60));
    }

    #[test]
    fn rate_limiter_sweep_keeps_recent_keys() {
        let mut limiter = RateLimiter::with_limits(1, 1000, 4);
        for key in ["a", "b", "c", "d"] {
            assert!(limiter.check(key).is_ok());
        }
        assert!(limiter.check("e").is_ok());
        assert!(limiter.tracked_keys() <= 4);
        assert!(!limiter.windows.contains_key("a"));
        assert_eq!(limiter.check("d"), Err(60));
        assert_eq!(limiter.check("e"), Err(60));
    }

    #[tokio::test]
    async fn run_blocking_returns_value() {
        let value = run_blocking(|| Ok(21 * 2)).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn run_blocking_propagates_error() {
        let err = run_blocking::<(), _>(|| Err(ApiError::Unauthorized))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }
}
