//! Throttle Store
//!
//! Expiring key-value store used to record "this actor already counted this
//! content item within the active window". The store only needs two
//! operations (`exists` and set-with-TTL), so backends are interchangeable:
//! Postgres for multi-node deployments, an in-process map for tests and
//! single-node setups.

use std::time::Duration;

use crate::domain::{ActorKey, ContentType};
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryThrottleStore;
pub use postgres::PgThrottleStore;

/// Errors from a throttle store backend. Callers are expected to fail open
/// on any of these: view accounting never blocks the read path.
#[derive(Debug, thiserror::Error)]
pub enum ThrottleError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Expiring key-value store with first-write-wins semantics.
///
/// `record` must not move an existing deadline: the throttle window is
/// anchored to the first counted view, so repeated `record` calls within
/// the window are no-ops.
#[allow(async_fn_in_trait)]
pub trait ThrottleStore {
    /// Whether a live (non-expired) entry exists for `key`. No side effect.
    async fn exists(&self, key: &str) -> Result<bool, ThrottleError>;

    /// Insert an entry expiring after `ttl`. Keeps the original deadline if
    /// the key is already present and live.
    async fn record(&self, key: &str, ttl: Duration) -> Result<(), ThrottleError>;
}

/// Build the throttle key for a (content, actor) pair.
///
/// The content type namespaces the key so articles and videos never collide.
pub fn throttle_key(content_type: ContentType, content_id: Uuid, actor: &ActorKey) -> String {
    format!("{}:{}:{}", content_type.as_str(), content_id, actor)
}
