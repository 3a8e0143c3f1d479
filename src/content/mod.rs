//! Content Repository
//!
//! CRUD storage for articles, categories, and videos. Every article
//! mutation observes the previous (status, category) pair under a row lock
//! and drives the Aggregate Maintainer in the same transaction, replacing
//! the implicit save-signal plumbing of a typical CMS with explicit calls.

mod repository;
mod slug;

pub use repository::{Article, Category, ContentError, ContentRepository, Video};
pub use slug::{slugify, unique_slug, SlugTable};

use uuid::Uuid;

use crate::domain::ContentStatus;

/// Command to create a new article.
#[derive(Debug, Clone)]
pub struct CreateArticleCommand {
    pub title: String,
    pub summary: String,
    pub body: String,
    pub status: ContentStatus,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub is_breaking: bool,
    pub is_featured: bool,
}

impl CreateArticleCommand {
    pub fn new(title: String, summary: String, body: String) -> Self {
        Self {
            title,
            summary,
            body,
            status: ContentStatus::Draft,
            category_id: None,
            author_id: None,
            is_breaking: false,
            is_featured: false,
        }
    }

    pub fn with_status(mut self, status: ContentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_author(mut self, author_id: Uuid) -> Self {
        self.author_id = Some(author_id);
        self
    }
}

/// Partial update for an article. `category_id` distinguishes "leave as is"
/// (`None`) from "set or clear" (`Some(..)`).
#[derive(Debug, Clone, Default)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub body: Option<String>,
    pub status: Option<ContentStatus>,
    pub category_id: Option<Option<Uuid>>,
    pub is_breaking: Option<bool>,
    pub is_featured: Option<bool>,
}

impl ArticlePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.summary.is_none()
            && self.body.is_none()
            && self.status.is_none()
            && self.category_id.is_none()
            && self.is_breaking.is_none()
            && self.is_featured.is_none()
    }
}
