//! Content item types
//!
//! A content item is anything with a view counter: articles and videos.
//! Articles additionally participate in category accounting.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of content being viewed. Namespaces throttle keys so an article
/// and a video with colliding IDs never share a throttle entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Article,
    Video,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Video => "video",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Publication status of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    Published,
    Archived,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
            ContentStatus::Archived => "archived",
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, ContentStatus::Published)
    }
}

impl std::str::FromStr for ContentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ContentStatus::Draft),
            "published" => Ok(ContentStatus::Published),
            "archived" => Ok(ContentStatus::Archived),
            other => Err(format!("unknown content status: {}", other)),
        }
    }
}

impl std::fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The (status, category) pair the Aggregate Maintainer cares about.
///
/// `category_id` is `None` for uncategorized content; such items are never
/// counted toward any category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentState {
    pub status: ContentStatus,
    pub category_id: Option<Uuid>,
}

impl ContentState {
    pub fn new(status: ContentStatus, category_id: Option<Uuid>) -> Self {
        Self {
            status,
            category_id,
        }
    }

    /// The category this state contributes a count to, if any.
    pub fn counted_category(&self) -> Option<Uuid> {
        if self.status.is_published() {
            self.category_id
        } else {
            None
        }
    }
}

/// Minimal handle to a content item, enough for view accounting.
#[derive(Debug, Clone)]
pub struct ContentRef {
    pub id: Uuid,
    pub content_type: ContentType,
    /// Author of the item; self-views are excluded entirely.
    pub author_id: Option<Uuid>,
}

impl ContentRef {
    pub fn article(id: Uuid, author_id: Option<Uuid>) -> Self {
        Self {
            id,
            content_type: ContentType::Article,
            author_id,
        }
    }

    pub fn video(id: Uuid, author_id: Option<Uuid>) -> Self {
        Self {
            id,
            content_type: ContentType::Video,
            author_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_status_roundtrip() {
        for status in [
            ContentStatus::Draft,
            ContentStatus::Published,
            ContentStatus::Archived,
        ] {
            let parsed: ContentStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("deleted".parse::<ContentStatus>().is_err());
    }

    #[test]
    fn test_counted_category() {
        let cat = Uuid::new_v4();

        let published = ContentState::new(ContentStatus::Published, Some(cat));
        assert_eq!(published.counted_category(), Some(cat));

        let draft = ContentState::new(ContentStatus::Draft, Some(cat));
        assert_eq!(draft.counted_category(), None);

        let uncategorized = ContentState::new(ContentStatus::Published, None);
        assert_eq!(uncategorized.counted_category(), None);
    }

    #[test]
    fn test_content_type_str() {
        assert_eq!(ContentType::Article.as_str(), "article");
        assert_eq!(ContentType::Video.to_string(), "video");
    }
}
