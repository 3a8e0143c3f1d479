//! Slug generation
//!
//! URL-friendly identifiers derived from titles. Uniqueness is enforced by
//! probing the target table and appending `-2`, `-3`, ... until a free slug
//! is found; the unique index on the slug column is the final arbiter.

use sqlx::{Postgres, Transaction};

/// Tables carrying a unique `slug` column.
#[derive(Debug, Clone, Copy)]
pub enum SlugTable {
    Articles,
    Categories,
}

/// Lowercase the text and collapse every non-alphanumeric run into a single
/// hyphen.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        // Titles made entirely of punctuation still need a slug
        "item".to_string()
    } else {
        slug
    }
}

/// Generate a slug unique within `table`, inside the caller's transaction.
pub async fn unique_slug(
    tx: &mut Transaction<'_, Postgres>,
    table: SlugTable,
    text: &str,
) -> Result<String, sqlx::Error> {
    let base = slugify(text);
    let mut candidate = base.clone();
    let mut counter = 2;

    while slug_exists(tx, table, &candidate).await? {
        candidate = format!("{}-{}", base, counter);
        counter += 1;
    }

    Ok(candidate)
}

async fn slug_exists(
    tx: &mut Transaction<'_, Postgres>,
    table: SlugTable,
    slug: &str,
) -> Result<bool, sqlx::Error> {
    let query = match table {
        SlugTable::Articles => "SELECT EXISTS (SELECT 1 FROM articles WHERE slug = $1)",
        SlugTable::Categories => "SELECT EXISTS (SELECT 1 FROM categories WHERE slug = $1)",
    };

    sqlx::query_scalar(query).bind(slug).fetch_one(&mut **tx).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Breaking News"), "breaking-news");
        assert_eq!(slugify("Technology"), "technology");
    }

    #[test]
    fn test_slugify_collapses_punctuation() {
        assert_eq!(slugify("Rust 1.80: What's New?"), "rust-1-80-what-s-new");
        assert_eq!(slugify("  spaced   out  "), "spaced-out");
    }

    #[test]
    fn test_slugify_no_edge_hyphens() {
        assert_eq!(slugify("...leading and trailing!!!"), "leading-and-trailing");
    }

    #[test]
    fn test_slugify_empty_fallback() {
        assert_eq!(slugify("!!!"), "item");
        assert_eq!(slugify(""), "item");
    }

    #[test]
    fn test_slugify_unicode_lowercase() {
        assert_eq!(slugify("Café Économie"), "café-économie");
    }
}
