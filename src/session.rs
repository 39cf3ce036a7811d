//! Bearer-token sessions for logged-in staff.
//!
//! Only the SHA-256 hash of each token is kept. Sessions expire after the
//! configured number of hours and are dropped lazily on lookup.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::models::{User, UserRole};

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
    expires_at: Instant,
}

impl Session {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

pub struct SessionStore {
    sessions: HashMap<[u8; 32], Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl,
        }
    }

    pub fn with_hours(hours: u32) -> Self {
        Self::new(Duration::from_secs(u64::from(hours) * 3600))
    }

    /// Start a session for `user` and return the plaintext token.
    pub fn issue(&mut self, user: &User) -> String {
        self.purge_expired();
        let token = generate_token();
        self.sessions.insert(
            hash_token(&token),
            Session {
                user_id: user.id,
                username: user.username.clone(),
                role: user.role,
                expires_at: Instant::now() + self.ttl,
            },
        );
        token
    }

    /// Session for a presented token, if it exists and has not expired.
    pub fn validate(&mut self, token: &str) -> Option<Session> {
        let key = hash_token(token);
        let session = self.sessions.get(&key)?;
        if session.is_expired(Instant::now()) {
            self.sessions.remove(&key);
            return None;
        }
        Some(session.clone())
    }

    pub fn revoke(&mut self, token: &str) -> bool {
        self.revoke_hash(&hash_token(token))
    }

    pub fn revoke_hash(&mut self, token_hash: &[u8; 32]) -> bool {
        self.sessions.remove(token_hash).is_some()
    }

    /// Drop every session of a user (after deactivation, deletion or a
    /// role change). Returns how many were removed.
    pub fn revoke_user(&mut self, user_id: &Uuid) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| &s.user_id != user_id);
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn purge_expired(&mut self) {
        let now = Instant::now();
        self.sessions.retain(|_, s| !s.is_expired(now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::tests::make_user_value;

    #[test]
    fn generate_token_is_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
        assert_eq!(t1.len(), 43);
    }

    #[test]
    fn hash_token_is_deterministic() {
        assert_eq!(hash_token("test"), hash_token("test"));
        assert_ne!(hash_token("token-a"), hash_token("token-b"));
    }

    #[test]
    fn issued_token_validates() {
        let mut store = SessionStore::with_hours(8);
        let user = make_user_value("reception1", UserRole::Receptionist);
        let token = store.issue(&user);

        let session = store.validate(&token).unwrap();
        assert_eq!(session.user_id, user.id);
        assert_eq!(session.role, UserRole::Receptionist);
        assert!(store.validate("not-a-token").is_none());
    }

    #[test]
    fn plaintext_token_is_not_stored() {
        let mut store = SessionStore::with_hours(8);
        let token = store.issue(&make_user_value("admin", UserRole::Admin));
        assert!(store.sessions.contains_key(&hash_token(&token)));
        assert!(store
            .sessions
            .keys()
            .all(|k| k.as_slice() != token.as_bytes()));
    }

    #[test]
    fn expired_session_is_rejected_and_removed() {
        let mut store = SessionStore::new(Duration::ZERO);
        let token = store.issue(&make_user_value("admin", UserRole::Admin));
        assert!(store.validate(&token).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn revoke_and_revoke_user() {
        let mut store = SessionStore::with_hours(1);
        let user = make_user_value("doc", UserRole::Doctor);
        let a = store.issue(&user);
        let _b = store.issue(&user);
        let other = store.issue(&make_user_value("admin", UserRole::Admin));

        assert!(store.revoke(&a));
        assert!(!store.revoke(&a));
        assert_eq!(store.revoke_user(&user.id), 1);
        assert_eq!(store.len(), 1);
        assert!(store.validate(&other).is_some());
    }
}
