//! Request actor identity
//!
//! An actor is whoever fetched a piece of content. For throttling we only
//! need a stable anonymous key per requester; we derive it by hashing the
//! client network address so raw IPs are never persisted in throttle rows.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Truncated hex length of the hashed address. 16 hex chars (64 bits) is
/// plenty for collision resistance at view-counting scale.
const ACTOR_KEY_LEN: usize = 16;

/// Anonymous throttling identity derived from the requester's address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorKey(String);

impl ActorKey {
    /// Wrap an already-derived key (used by tests and fixtures).
    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derive an anonymous actor key from a client address string.
pub fn actor_key_from_ip(ip: &str) -> ActorKey {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(ip.trim().as_bytes());
    let digest = hex::encode(hasher.finalize());
    ActorKey(digest[..ACTOR_KEY_LEN].to_string())
}

/// The requesting actor: always a throttle key, optionally an authenticated
/// user identity (needed for the self-view exclusion).
#[derive(Debug, Clone)]
pub struct Actor {
    pub key: ActorKey,
    pub user_id: Option<Uuid>,
}

impl Actor {
    pub fn anonymous(key: ActorKey) -> Self {
        Self { key, user_id: None }
    }

    pub fn authenticated(key: ActorKey, user_id: Uuid) -> Self {
        Self {
            key,
            user_id: Some(user_id),
        }
    }

    /// True when this actor is the author of the given content item.
    pub fn owns(&self, author_id: Option<Uuid>) -> bool {
        match (self.user_id, author_id) {
            (Some(user), Some(author)) => user == author,
            _ => false,
        }
    }
}
