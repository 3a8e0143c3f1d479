//! View Accounting Service
//!
//! Runs as a side effect of every successful content detail read and decides
//! whether the read contributes a view. Accounting is best-effort: after the
//! owner check, no failure may ever propagate to the caller. The read is
//! authoritative; the counter is not.

use std::time::Duration;

use sqlx::PgPool;

use crate::domain::{Actor, ContentRef, ContentType};
use crate::throttle::{throttle_key, ThrottleStore};

/// What happened to a single view attempt. Returned for logging and tests;
/// never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewOutcome {
    /// The counter was incremented and the throttle window opened.
    Counted,
    /// The actor authored the item; excluded entirely, not throttled.
    SelfView,
    /// A live throttle entry exists for this (content, actor) pair.
    Throttled,
    /// The item is no longer published/active; nothing to count.
    Gone,
    /// A storage failure was swallowed; logged, view not counted.
    Skipped,
}

/// Service that intercepts content reads and maintains view counters.
#[derive(Debug, Clone)]
pub struct ViewAccounting<S> {
    pool: PgPool,
    store: S,
    /// Throttle window, anchored to the first counted view.
    window: Duration,
    /// Bound on every throttle-store round trip; past it we fail open.
    store_timeout: Duration,
}

impl<S: ThrottleStore> ViewAccounting<S> {
    pub fn new(pool: PgPool, store: S, window: Duration, store_timeout: Duration) -> Self {
        Self {
            pool,
            store,
            window,
            store_timeout,
        }
    }

    /// Record a view of `item` by `actor`, if eligible.
    ///
    /// Eligibility: the actor is not the author, and no live throttle entry
    /// exists for the pair. The increment itself is a single atomic
    /// `UPDATE ... SET views_count = views_count + 1`, so concurrent views
    /// from distinct actors are never lost.
    pub async fn record_view(&self, item: &ContentRef, actor: &Actor) -> ViewOutcome {
        if actor.owns(item.author_id) {
            tracing::debug!(
                content_type = %item.content_type,
                content_id = %item.id,
                "Self-view excluded"
            );
            return ViewOutcome::SelfView;
        }

        let key = throttle_key(item.content_type, item.id, &actor.key);

        if self.throttled(&key).await {
            return ViewOutcome::Throttled;
        }

        match self.increment(item).await {
            Ok(true) => {}
            Ok(false) => return ViewOutcome::Gone,
            Err(e) => {
                tracing::warn!(
                    content_type = %item.content_type,
                    content_id = %item.id,
                    error = %e,
                    "View count increment failed; view not counted"
                );
                return ViewOutcome::Skipped;
            }
        }

        self.open_window(&key).await;

        tracing::debug!(
            content_type = %item.content_type,
            content_id = %item.id,
            "View counted"
        );
        ViewOutcome::Counted
    }

    /// Throttle lookup with a bounded timeout. Store errors and timeouts
    /// fail open: the read path must never depend on throttle-store health.
    async fn throttled(&self, key: &str) -> bool {
        match tokio::time::timeout(self.store_timeout, self.store.exists(key)).await {
            Ok(Ok(exists)) => exists,
            Ok(Err(e)) => {
                tracing::warn!(key, error = %e, "Throttle store unavailable; failing open");
                false
            }
            Err(_) => {
                tracing::warn!(key, "Throttle store lookup timed out; failing open");
                false
            }
        }
    }

    /// Best-effort throttle record after a counted view.
    async fn open_window(&self, key: &str) {
        match tokio::time::timeout(self.store_timeout, self.store.record(key, self.window)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(key, error = %e, "Failed to record throttle entry");
            }
            Err(_) => {
                tracing::warn!(key, "Throttle store record timed out");
            }
        }
    }

    /// Atomically increment the view counter at the storage layer. Returns
    /// false when the item is no longer published/active.
    async fn increment(&self, item: &ContentRef) -> Result<bool, sqlx::Error> {
        let query = match item.content_type {
            ContentType::Article => {
                r#"
                UPDATE articles
                SET views_count = views_count + 1
                WHERE id = $1 AND status = 'published'
                "#
            }
            ContentType::Video => {
                r#"
                UPDATE videos
                SET views_count = views_count + 1
                WHERE id = $1 AND is_active = true
                "#
            }
        };

        let rows = sqlx::query(query)
            .bind(item.id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows > 0)
    }
}
