//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::aggregate::CountDrift;
use crate::content::{Article, ArticlePatch, Category, CreateArticleCommand, Video};
use crate::domain::{Actor, ContentRef, ContentStatus};
use crate::error::AppError;

use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateArticleRequest {
    pub title: String,
    pub summary: String,
    pub body: String,
    #[serde(default)]
    pub status: Option<ContentStatus>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub author_id: Option<Uuid>,
    #[serde(default)]
    pub is_breaking: bool,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateArticleRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub status: Option<ContentStatus>,
    /// Absent: leave unchanged. `null`: clear. Value: reassign.
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub is_breaking: Option<bool>,
    #[serde(default)]
    pub is_featured: Option<bool>,
}

/// Distinguish a missing field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
pub struct ArticleResponse {
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

impl From<Article> for ArticleResponse {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            title: article.title,
            slug: article.slug,
            summary: article.summary,
            body: article.body,
            status: article.status,
            category_id: article.category_id,
            author_id: article.author_id,
            views_count: article.views_count,
            is_breaking: article.is_breaking,
            is_featured: article.is_featured,
            published_at: article.published_at,
            created_at: article.created_at,
            updated_at: article.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub article_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
            article_count: category.article_count,
            created_at: category.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VideoResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub video_url: String,
    pub author_id: Option<Uuid>,
    pub views_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Video> for VideoResponse {
    fn from(video: Video) -> Self {
        Self {
            id: video.id,
            title: video.title,
            slug: video.slug,
            video_url: video.video_url,
            author_id: video.author_id,
            views_count: video.views_count,
            created_at: video.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecalculateResponse {
    pub category_id: Uuid,
    pub article_count: i64,
}

#[derive(Debug, Serialize)]
pub struct DriftResponse {
    pub drift: Vec<CountDrift>,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        // Public content reads (view accounting side effect)
        .route("/articles/:slug", get(get_article))
        .route("/videos/:slug", get(get_video))
        // Content writes (aggregate maintenance side effect)
        .route("/articles", post(create_article))
        .route("/articles/:article_id", patch(update_article))
        .route("/articles/:article_id", delete(delete_article))
        // Categories
        .route("/categories", post(create_category))
        .route("/categories", get(list_categories))
        .route("/categories/:slug", get(get_category))
        // Repair/ops tooling
        .route(
            "/admin/categories/:category_id/recalculate",
            post(recalculate_category),
        )
        .route("/admin/categories/drift", get(category_drift))
}

// =========================================================================
// GET /articles/:slug
// =========================================================================

/// Article detail read. A successful fetch feeds the view accounting
/// service; the response never depends on the accounting outcome.
async fn get_article(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
) -> Result<Json<ArticleResponse>, AppError> {
    let article = state
        .content
        .get_published_article(&slug)
        .await?
        .ok_or_else(|| AppError::ArticleNotFound(slug))?;

    let item = ContentRef::article(article.id, article.author_id);
    state.views.record_view(&item, &actor).await;

    Ok(Json(article.into()))
}

// =========================================================================
// GET /videos/:slug
// =========================================================================

/// Video detail read with the same accounting side effect.
async fn get_video(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
) -> Result<Json<VideoResponse>, AppError> {
    let video = state
        .content
        .get_active_video(&slug)
        .await?
        .ok_or_else(|| AppError::VideoNotFound(slug))?;

    let item = ContentRef::video(video.id, video.author_id);
    state.views.record_view(&item, &actor).await;

    Ok(Json(video.into()))
}

// =========================================================================
// POST /articles
// =========================================================================

/// Create an article
async fn create_article(
    State(state): State<AppState>,
    Json(request): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<ArticleResponse>), AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::InvalidRequest("title must not be empty".to_string()));
    }

    let mut command =
        CreateArticleCommand::new(request.title, request.summary, request.body)
            .with_status(request.status.unwrap_or(ContentStatus::Draft));
    command.category_id = request.category_id;
    command.author_id = request.author_id;
    command.is_breaking = request.is_breaking;
    command.is_featured = request.is_featured;

    let article = state.content.create_article(command).await?;

    Ok((StatusCode::CREATED, Json(article.into())))
}

// =========================================================================
// PATCH /articles/:article_id
// =========================================================================

/// Update an article
async fn update_article(
    State(state): State<AppState>,
    Path(article_id): Path<Uuid>,
    Json(request): Json<UpdateArticleRequest>,
) -> Result<Json<ArticleResponse>, AppError> {
    let patch = ArticlePatch {
        title: request.title,
        summary: request.summary,
        body: request.body,
        status: request.status,
        category_id: request.category_id,
        is_breaking: request.is_breaking,
        is_featured: request.is_featured,
    };

    let article = state.content.update_article(article_id, patch).await?;

    Ok(Json(article.into()))
}

// =========================================================================
// DELETE /articles/:article_id
// =========================================================================

/// Delete an article
async fn delete_article(
    State(state): State<AppState>,
    Path(article_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.content.delete_article(article_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// POST /categories
// =========================================================================

/// Create a category
async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::InvalidRequest("name must not be empty".to_string()));
    }

    let category = state.content.create_category(&request.name).await?;

    Ok((StatusCode::CREATED, Json(category.into())))
}

// =========================================================================
// GET /categories
// =========================================================================

/// List categories
async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = state.content.list_categories().await?;

    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

// =========================================================================
// GET /categories/:slug
// =========================================================================

/// Get category by slug
async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryResponse>, AppError> {
    let category = state
        .content
        .get_category_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::CategoryNotFound(slug))?;

    Ok(Json(category.into()))
}

// =========================================================================
// POST /admin/categories/:category_id/recalculate
// =========================================================================

/// Recompute a category's article count from the articles table. The repair
/// path for aggregate drift; idempotent.
async fn recalculate_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> Result<Json<RecalculateResponse>, AppError> {
    let article_count = state.counter.recalculate(category_id).await?;

    tracing::info!(
        category_id = %category_id,
        article_count,
        "Category count recalculated"
    );

    Ok(Json(RecalculateResponse {
        category_id,
        article_count,
    }))
}

// =========================================================================
// GET /admin/categories/drift
// =========================================================================

/// Report categories whose stored count diverges from the true count.
async fn category_drift(
    State(state): State<AppState>,
) -> Result<Json<DriftResponse>, AppError> {
    let drift = state.counter.audit_counts().await?;

    if !drift.is_empty() {
        tracing::warn!(categories = drift.len(), "Category count drift detected");
    }

    Ok(Json(DriftResponse { drift }))
}
