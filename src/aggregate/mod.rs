//! Aggregate Maintainer
//!
//! Keeps `categories.article_count` equal to the number of published
//! articles referencing each category. Counts are maintained by delta on
//! every content mutation; `recalculate` is the repair path for drift.
//!
//! The delta for a mutation is derived from the previous and new
//! (status, category) pair. Callers must observe the previous pair before
//! the article row is overwritten (row lock in the content repository) and
//! apply the delta inside the same transaction, so a category is never left
//! inconsistent after the triggering operation commits.

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::ContentState;

/// Aggregate maintenance errors.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Category not found: {0}")]
    CategoryNotFound(Uuid),
}

/// Per-category count adjustment produced by a single content mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryDelta {
    pub category_id: Uuid,
    pub delta: i64,
}

/// Compute the category count deltas for a content mutation.
///
/// `prev` is `None` on create, `next` is `None` on delete. Reassigning the
/// category of a published article yields one decrement and one increment in
/// a single result, never two racing operations.
pub fn category_deltas(prev: Option<ContentState>, next: Option<ContentState>) -> Vec<CategoryDelta> {
    let before = prev.and_then(|s| s.counted_category());
    let after = next.and_then(|s| s.counted_category());

    match (before, after) {
        (Some(old), Some(new)) if old == new => vec![],
        (Some(old), Some(new)) => vec![
            CategoryDelta {
                category_id: old,
                delta: -1,
            },
            CategoryDelta {
                category_id: new,
                delta: 1,
            },
        ],
        (Some(old), None) => vec![CategoryDelta {
            category_id: old,
            delta: -1,
        }],
        (None, Some(new)) => vec![CategoryDelta {
            category_id: new,
            delta: 1,
        }],
        (None, None) => vec![],
    }
}

/// A category whose stored count has diverged from the true count.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CountDrift {
    pub category_id: Uuid,
    pub stored_count: i64,
    pub actual_count: i64,
}

/// Service owning `categories.article_count`.
#[derive(Debug, Clone)]
pub struct CategoryCounter {
    pool: PgPool,
}

impl CategoryCounter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the deltas for one content mutation inside the caller's
    /// transaction. A failure here aborts the whole mutation, which is the
    /// retry boundary: the client retries the operation, not the delta.
    pub async fn apply(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        prev: Option<ContentState>,
        next: Option<ContentState>,
    ) -> Result<(), AggregateError> {
        for CategoryDelta { category_id, delta } in category_deltas(prev, next) {
            // Atomic expression with a floor at zero; concurrent publishes
            // in the same category must not lose updates.
            let rows = sqlx::query(
                r#"
                UPDATE categories
                SET article_count = GREATEST(article_count + $2, 0)
                WHERE id = $1
                "#,
            )
            .bind(category_id)
            .bind(delta)
            .execute(&mut **tx)
            .await?
            .rows_affected();

            if rows == 0 {
                return Err(AggregateError::CategoryNotFound(category_id));
            }
        }

        Ok(())
    }

    /// Recompute `article_count` from the articles table. Idempotent; safe
    /// to call at any time. Returns the corrected count.
    pub async fn recalculate(&self, category_id: Uuid) -> Result<i64, AggregateError> {
        let count: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE categories
            SET article_count = (
                SELECT COUNT(*) FROM articles
                WHERE category_id = $1 AND status = 'published'
            )
            WHERE id = $1
            RETURNING article_count
            "#,
        )
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await?;

        count.ok_or(AggregateError::CategoryNotFound(category_id))
    }

    /// Report categories whose stored count diverges from the true count.
    /// Detection only; repair is an explicit `recalculate` call.
    pub async fn audit_counts(&self) -> Result<Vec<CountDrift>, AggregateError> {
        let rows: Vec<(Uuid, i64, i64)> = sqlx::query_as(
            r#"
            SELECT c.id, c.article_count, COALESCE(a.actual, 0) AS actual
            FROM categories c
            LEFT JOIN (
                SELECT category_id, COUNT(*) AS actual
                FROM articles
                WHERE status = 'published' AND category_id IS NOT NULL
                GROUP BY category_id
            ) a ON a.category_id = c.id
            WHERE c.article_count <> COALESCE(a.actual, 0)
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(category_id, stored_count, actual_count)| CountDrift {
                category_id,
                stored_count,
                actual_count,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ContentStatus;

    fn state(status: ContentStatus, category: Option<Uuid>) -> Option<ContentState> {
        Some(ContentState::new(status, category))
    }

    #[test]
    fn test_create_as_published_increments() {
        let cat = Uuid::new_v4();
        let deltas = category_deltas(None, state(ContentStatus::Published, Some(cat)));
        assert_eq!(
            deltas,
            vec![CategoryDelta {
                category_id: cat,
                delta: 1
            }]
        );
    }

    #[test]
    fn test_create_as_draft_is_noop() {
        let cat = Uuid::new_v4();
        assert!(category_deltas(None, state(ContentStatus::Draft, Some(cat))).is_empty());
    }

    #[test]
    fn test_publish_transition_increments() {
        let cat = Uuid::new_v4();
        let deltas = category_deltas(
            state(ContentStatus::Draft, Some(cat)),
            state(ContentStatus::Published, Some(cat)),
        );
        assert_eq!(
            deltas,
            vec![CategoryDelta {
                category_id: cat,
                delta: 1
            }]
        );
    }

    #[test]
    fn test_unpublish_decrements() {
        let cat = Uuid::new_v4();
        let deltas = category_deltas(
            state(ContentStatus::Published, Some(cat)),
            state(ContentStatus::Archived, Some(cat)),
        );
        assert_eq!(
            deltas,
            vec![CategoryDelta {
                category_id: cat,
                delta: -1
            }]
        );
    }

    #[test]
    fn test_delete_published_decrements() {
        let cat = Uuid::new_v4();
        let deltas = category_deltas(state(ContentStatus::Published, Some(cat)), None);
        assert_eq!(
            deltas,
            vec![CategoryDelta {
                category_id: cat,
                delta: -1
            }]
        );
    }

    #[test]
    fn test_delete_draft_is_noop() {
        let cat = Uuid::new_v4();
        assert!(category_deltas(state(ContentStatus::Draft, Some(cat)), None).is_empty());
    }

    #[test]
    fn test_reassignment_is_one_logical_operation() {
        let old = Uuid::new_v4();
        let new = Uuid::new_v4();
        let deltas = category_deltas(
            state(ContentStatus::Published, Some(old)),
            state(ContentStatus::Published, Some(new)),
        );
        assert_eq!(
            deltas,
            vec![
                CategoryDelta {
                    category_id: old,
                    delta: -1
                },
                CategoryDelta {
                    category_id: new,
                    delta: 1
                },
            ]
        );
    }

    #[test]
    fn test_unchanged_published_state_is_noop() {
        let cat = Uuid::new_v4();
        let deltas = category_deltas(
            state(ContentStatus::Published, Some(cat)),
            state(ContentStatus::Published, Some(cat)),
        );
        assert!(deltas.is_empty());
    }

    #[test]
    fn test_uncategorized_never_counts() {
        assert!(category_deltas(None, state(ContentStatus::Published, None)).is_empty());
        assert!(category_deltas(state(ContentStatus::Published, None), None).is_empty());
    }

    #[test]
    fn test_publish_and_reassign_in_one_edit() {
        // Draft in C1 edited to published in C2: only C2 is touched.
        let c1 = Uuid::new_v4();
        let c2 = Uuid::new_v4();
        let deltas = category_deltas(
            state(ContentStatus::Draft, Some(c1)),
            state(ContentStatus::Published, Some(c2)),
        );
        assert_eq!(
            deltas,
            vec![CategoryDelta {
                category_id: c2,
                delta: 1
            }]
        );
    }
}
