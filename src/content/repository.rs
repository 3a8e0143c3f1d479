//! Storage operations for articles, categories, and videos.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::aggregate::{AggregateError, CategoryCounter};
use crate::domain::{ContentState, ContentStatus};

use super::slug::{unique_slug, SlugTable};
use super::{ArticlePatch, CreateArticleCommand};

const ARTICLE_COLUMNS: &str = "id, title, slug, summary, body, status, category_id, author_id, \
     views_count, is_breaking, is_featured, published_at, created_at, updated_at";

/// An article row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub body: String,
    pub status: String,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub views_count: i64,
    pub is_breaking: bool,
    pub is_featured: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    pub fn status(&self) -> ContentStatus {
        // The status column only ever holds values written from ContentStatus
        self.status.parse().unwrap_or(ContentStatus::Draft)
    }

    pub fn state(&self) -> ContentState {
        ContentState::new(self.status(), self.category_id)
    }
}

/// A category row. `article_count` is owned by the Aggregate Maintainer.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub article_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A video row. Videos take part in view accounting only.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub video_url: String,
    pub author_id: Option<Uuid>,
    pub is_active: bool,
    pub views_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Content repository errors.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Article not found: {0}")]
    ArticleNotFound(Uuid),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

/// CRUD storage keeping category aggregates consistent on every mutation.
#[derive(Debug, Clone)]
pub struct ContentRepository {
    pool: PgPool,
    counter: CategoryCounter,
}

impl ContentRepository {
    pub fn new(pool: PgPool) -> Self {
        let counter = CategoryCounter::new(pool.clone());
        Self { pool, counter }
    }

    // =========================================================================
    // Articles
    // =========================================================================

    /// Create an article. When created directly as published with a
    /// category, the category count is incremented in the same transaction.
    pub async fn create_article(
        &self,
        command: CreateArticleCommand,
    ) -> Result<Article, ContentError> {
        let mut tx = self.pool.begin().await?;

        let slug = unique_slug(&mut tx, SlugTable::Articles, &command.title).await?;

        let article: Article = sqlx::query_as(&format!(
            r#"
            INSERT INTO articles
                (id, title, slug, summary, body, status, category_id, author_id,
                 views_count, is_breaking, is_featured, published_at)
            VALUES
                ($1, $2, $3, $4, $5, $6, $7, $8, 0, $9, $10,
                 CASE WHEN $6 = 'published' THEN NOW() ELSE NULL END)
            RETURNING {}
            "#,
            ARTICLE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&command.title)
        .bind(&slug)
        .bind(&command.summary)
        .bind(&command.body)
        .bind(command.status.as_str())
        .bind(command.category_id)
        .bind(command.author_id)
        .bind(command.is_breaking)
        .bind(command.is_featured)
        .fetch_one(&mut *tx)
        .await?;

        self.counter
            .apply(&mut tx, None, Some(article.state()))
            .await?;

        tx.commit().await?;

        tracing::info!(article_id = %article.id, slug = %article.slug, "Article created");
        Ok(article)
    }

    /// Apply a partial update. The previous (status, category) pair is read
    /// under a row lock before the row is overwritten, so category
    /// reassignment of a published article moves exactly one count from the
    /// old category to the new one.
    pub async fn update_article(
        &self,
        article_id: Uuid,
        patch: ArticlePatch,
    ) -> Result<Article, ContentError> {
        let mut tx = self.pool.begin().await?;

        let prev: Option<(String, Option<Uuid>)> = sqlx::query_as(
            r#"
            SELECT status, category_id FROM articles
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(article_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (prev_status, prev_category) =
            prev.ok_or(ContentError::ArticleNotFound(article_id))?;
        let prev_status: ContentStatus = prev_status
            .parse()
            .unwrap_or(ContentStatus::Draft);
        let prev_state = ContentState::new(prev_status, prev_category);

        let next_status = patch.status.unwrap_or(prev_status);
        let next_category = match patch.category_id {
            Some(category) => category,
            None => prev_category,
        };
        let next_state = ContentState::new(next_status, next_category);

        let article: Article = sqlx::query_as(&format!(
            r#"
            UPDATE articles
            SET title = COALESCE($2, title),
                summary = COALESCE($3, summary),
                body = COALESCE($4, body),
                status = $5,
                category_id = $6,
                is_breaking = COALESCE($7, is_breaking),
                is_featured = COALESCE($8, is_featured),
                published_at = CASE
                    WHEN $5 = 'published' AND published_at IS NULL THEN NOW()
                    ELSE published_at
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ARTICLE_COLUMNS
        ))
        .bind(article_id)
        .bind(patch.title)
        .bind(patch.summary)
        .bind(patch.body)
        .bind(next_status.as_str())
        .bind(next_category)
        .bind(patch.is_breaking)
        .bind(patch.is_featured)
        .fetch_one(&mut *tx)
        .await?;

        self.counter
            .apply(&mut tx, Some(prev_state), Some(next_state))
            .await?;

        tx.commit().await?;

        Ok(article)
    }

    /// Delete an article. A published article decrements its category.
    pub async fn delete_article(&self, article_id: Uuid) -> Result<(), ContentError> {
        let mut tx = self.pool.begin().await?;

        let prev: Option<(String, Option<Uuid>)> = sqlx::query_as(
            r#"
            SELECT status, category_id FROM articles
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(article_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (prev_status, prev_category) =
            prev.ok_or(ContentError::ArticleNotFound(article_id))?;
        let prev_status: ContentStatus = prev_status
            .parse()
            .unwrap_or(ContentStatus::Draft);
        let prev_state = ContentState::new(prev_status, prev_category);

        sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(article_id)
            .execute(&mut *tx)
            .await?;

        self.counter.apply(&mut tx, Some(prev_state), None).await?;

        tx.commit().await?;

        tracing::info!(article_id = %article_id, "Article deleted");
        Ok(())
    }

    pub async fn get_article(&self, article_id: Uuid) -> Result<Option<Article>, ContentError> {
        let article = sqlx::query_as(&format!(
            "SELECT {} FROM articles WHERE id = $1",
            ARTICLE_COLUMNS
        ))
        .bind(article_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(article)
    }

    /// Detail read for the public article endpoint. Published only.
    pub async fn get_published_article(&self, slug: &str) -> Result<Option<Article>, ContentError> {
        let article = sqlx::query_as(&format!(
            "SELECT {} FROM articles WHERE slug = $1 AND status = 'published'",
            ARTICLE_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(article)
    }

    // =========================================================================
    // Categories
    // =========================================================================

    pub async fn create_category(&self, name: &str) -> Result<Category, ContentError> {
        let mut tx = self.pool.begin().await?;

        let slug = unique_slug(&mut tx, SlugTable::Categories, name).await?;

        let category: Category = sqlx::query_as(
            r#"
            INSERT INTO categories (id, name, slug, article_count)
            VALUES ($1, $2, $3, 0)
            RETURNING id, name, slug, article_count, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(&slug)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
        Ok(category)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, ContentError> {
        let categories = sqlx::query_as(
            r#"
            SELECT id, name, slug, article_count, created_at
            FROM categories
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn get_category(&self, category_id: Uuid) -> Result<Option<Category>, ContentError> {
        let category = sqlx::query_as(
            r#"
            SELECT id, name, slug, article_count, created_at
            FROM categories
            WHERE id = $1
            "#,
        )
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn get_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Category>, ContentError> {
        let category = sqlx::query_as(
            r#"
            SELECT id, name, slug, article_count, created_at
            FROM categories
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    // =========================================================================
    // Videos
    // =========================================================================

    /// Detail read for the public video endpoint. Active only.
    pub async fn get_active_video(&self, slug: &str) -> Result<Option<Video>, ContentError> {
        let video = sqlx::query_as(
            r#"
            SELECT id, title, slug, video_url, author_id, is_active, views_count, created_at
            FROM videos
            WHERE slug = $1 AND is_active = true
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }
}
