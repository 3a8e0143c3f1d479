//! Common test utilities

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE,
        article_count BIGINT NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE,
        summary TEXT NOT NULL DEFAULT '',
        body TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'draft',
        category_id UUID REFERENCES categories(id) ON DELETE SET NULL,
        author_id UUID,
        views_count BIGINT NOT NULL DEFAULT 0,
        is_breaking BOOLEAN NOT NULL DEFAULT FALSE,
        is_featured BOOLEAN NOT NULL DEFAULT FALSE,
        published_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS videos (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE,
        video_url TEXT NOT NULL DEFAULT '',
        author_id UUID,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        views_count BIGINT NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS view_throttle (
        throttle_key TEXT PRIMARY KEY,
        expires_at TIMESTAMPTZ NOT NULL
    )
    "#,
];

/// Connect to the test database and ensure the schema exists.
///
/// Returns `None` when `DATABASE_URL` is not configured so DB-backed tests
/// can skip instead of failing on machines without Postgres. Tests create
/// their own uniquely-named rows and never assert on global table state, so
/// suites can run concurrently against one database.
pub async fn setup_test_db() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL not set; skipping DB-backed test");
            return None;
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    for statement in SCHEMA {
        // Parallel test binaries may race on table creation; one retry after
        // a short pause clears the transient conflict.
        if sqlx::query(statement).execute(&pool).await.is_err() {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            sqlx::query(statement)
                .execute(&pool)
                .await
                .expect("Failed to create test schema");
        }
    }

    Some(pool)
}

/// Unique per-test suffix so slugs and names never collide across tests.
pub fn unique(tag: &str) -> String {
    format!("{} {}", tag, Uuid::new_v4().simple())
}

/// Current view count for an article.
#[allow(dead_code)]
pub async fn article_views(pool: &PgPool, article_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT views_count FROM articles WHERE id = $1")
        .bind(article_id)
        .fetch_one(pool)
        .await
        .expect("article missing")
}

/// Current stored article count for a category.
#[allow(dead_code)]
pub async fn category_count(pool: &PgPool, category_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT article_count FROM categories WHERE id = $1")
        .bind(category_id)
        .fetch_one(pool)
        .await
        .expect("category missing")
}

/// Insert an active video row directly.
#[allow(dead_code)]
pub async fn seed_video(pool: &PgPool, author_id: Option<Uuid>) -> (Uuid, String) {
    let id = Uuid::new_v4();
    let slug = format!("video-{}", id.simple());
    sqlx::query(
        r#"
        INSERT INTO videos (id, title, slug, video_url, author_id, is_active, views_count)
        VALUES ($1, $2, $3, 'https://videos.example/clip', $4, true, 0)
        "#,
    )
    .bind(id)
    .bind(unique("Video"))
    .bind(&slug)
    .bind(author_id)
    .execute(pool)
    .await
    .expect("Failed to seed video");

    (id, slug)
}
