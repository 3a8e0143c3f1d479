//! Postgres throttle store
//!
//! Backed by the `view_throttle` table. `record` keeps the first deadline
//! by only overwriting rows that have already expired, and expired rows are
//! removed by the maintenance job rather than on the read path.

use std::time::Duration;

use sqlx::PgPool;

use super::{ThrottleError, ThrottleStore};

/// `ThrottleStore` backend over the `view_throttle` table.
#[derive(Debug, Clone)]
pub struct PgThrottleStore {
    pool: PgPool,
}

impl PgThrottleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete expired throttle rows. Called by the maintenance scheduler.
    pub async fn cleanup_expired(&self) -> Result<u64, ThrottleError> {
        let rows = sqlx::query(
            r#"
            DELETE FROM view_throttle
            WHERE expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows)
    }
}

impl ThrottleStore for PgThrottleStore {
    async fn exists(&self, key: &str) -> Result<bool, ThrottleError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM view_throttle
                WHERE throttle_key = $1 AND expires_at > NOW()
            )
            "#,
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn record(&self, key: &str, ttl: Duration) -> Result<(), ThrottleError> {
        // A dead row with the same key may still be present if the sweep has
        // not run yet; refresh it, but never touch a live row.
        sqlx::query(
            r#"
            INSERT INTO view_throttle (throttle_key, expires_at)
            VALUES ($1, NOW() + $2 * INTERVAL '1 second')
            ON CONFLICT (throttle_key) DO UPDATE
                SET expires_at = EXCLUDED.expires_at
                WHERE view_throttle.expires_at <= NOW()
            "#,
        )
        .bind(key)
        .bind(ttl.as_secs() as i64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
