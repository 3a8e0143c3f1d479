//! View accounting integration tests
//!
//! Requires a Postgres instance via DATABASE_URL; tests skip when unset.

use std::time::Duration;

use sqlx::PgPool;
use uuid::Uuid;

use newshub::content::{Article, ContentRepository, CreateArticleCommand};
use newshub::domain::{actor_key_from_ip, Actor, ContentRef, ContentStatus};
use newshub::throttle::{MemoryThrottleStore, PgThrottleStore, ThrottleStore};
use newshub::views::{ViewAccounting, ViewOutcome};

mod common;

const WINDOW: Duration = Duration::from_secs(3600);
const STORE_TIMEOUT: Duration = Duration::from_millis(250);

fn accounting(pool: &PgPool) -> ViewAccounting<MemoryThrottleStore> {
    ViewAccounting::new(
        pool.clone(),
        MemoryThrottleStore::new(),
        WINDOW,
        STORE_TIMEOUT,
    )
}

async fn publish_article(pool: &PgPool, author_id: Option<Uuid>) -> Article {
    let repo = ContentRepository::new(pool.clone());
    let mut command = CreateArticleCommand::new(
        common::unique("Article"),
        "summary".to_string(),
        "body".to_string(),
    )
    .with_status(ContentStatus::Published);
    command.author_id = author_id;

    repo.create_article(command).await.expect("create article")
}

#[tokio::test]
async fn test_first_view_counts_then_throttles() {
    let Some(pool) = common::setup_test_db().await else {
        return;
    };
    let views = accounting(&pool);
    let article = publish_article(&pool, None).await;
    let item = ContentRef::article(article.id, None);
    let actor = Actor::anonymous(actor_key_from_ip("203.0.113.10"));

    assert_eq!(views.record_view(&item, &actor).await, ViewOutcome::Counted);
    assert_eq!(common::article_views(&pool, article.id).await, 1);

    // Same actor within the window: no further increments
    assert_eq!(views.record_view(&item, &actor).await, ViewOutcome::Throttled);
    assert_eq!(views.record_view(&item, &actor).await, ViewOutcome::Throttled);
    assert_eq!(common::article_views(&pool, article.id).await, 1);
}

#[tokio::test]
async fn test_self_view_never_counts() {
    let Some(pool) = common::setup_test_db().await else {
        return;
    };
    let views = accounting(&pool);
    let author_id = Uuid::new_v4();
    let article = publish_article(&pool, Some(author_id)).await;
    let item = ContentRef::article(article.id, Some(author_id));
    let owner = Actor::authenticated(actor_key_from_ip("203.0.113.11"), author_id);

    for _ in 0..10 {
        assert_eq!(views.record_view(&item, &owner).await, ViewOutcome::SelfView);
    }
    assert_eq!(common::article_views(&pool, article.id).await, 0);
}

#[tokio::test]
async fn test_concurrent_distinct_actors_all_count() {
    let Some(pool) = common::setup_test_db().await else {
        return;
    };
    let views = accounting(&pool);
    let article = publish_article(&pool, None).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let views = views.clone();
        let item = ContentRef::article(article.id, None);
        let actor = Actor::anonymous(actor_key_from_ip(&format!("198.51.100.{}", i)));
        handles.push(tokio::spawn(async move {
            views.record_view(&item, &actor).await
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), ViewOutcome::Counted);
    }

    // No lost updates: 8 distinct actors, 8 increments
    assert_eq!(common::article_views(&pool, article.id).await, 8);
}

#[tokio::test]
async fn test_owner_then_anonymous_scenario() {
    let Some(pool) = common::setup_test_db().await else {
        return;
    };
    let views = accounting(&pool);
    let author_id = Uuid::new_v4();
    let article = publish_article(&pool, Some(author_id)).await;
    let item = ContentRef::article(article.id, Some(author_id));

    // Author refreshes their own article ten times
    let owner = Actor::authenticated(actor_key_from_ip("203.0.113.12"), author_id);
    for _ in 0..10 {
        views.record_view(&item, &owner).await;
    }
    assert_eq!(common::article_views(&pool, article.id).await, 0);

    // An anonymous reader fetches three times within the hour: one count
    let reader = Actor::anonymous(actor_key_from_ip("203.0.113.13"));
    for _ in 0..3 {
        views.record_view(&item, &reader).await;
    }
    assert_eq!(common::article_views(&pool, article.id).await, 1);
}

#[tokio::test]
async fn test_unpublished_article_not_counted() {
    let Some(pool) = common::setup_test_db().await else {
        return;
    };
    let views = accounting(&pool);
    let repo = ContentRepository::new(pool.clone());
    let draft = repo
        .create_article(CreateArticleCommand::new(
            common::unique("Draft"),
            "summary".to_string(),
            "body".to_string(),
        ))
        .await
        .expect("create draft");

    let item = ContentRef::article(draft.id, None);
    let actor = Actor::anonymous(actor_key_from_ip("203.0.113.14"));

    assert_eq!(views.record_view(&item, &actor).await, ViewOutcome::Gone);
    assert_eq!(common::article_views(&pool, draft.id).await, 0);
}

#[tokio::test]
async fn test_video_views_use_their_own_namespace() {
    let Some(pool) = common::setup_test_db().await else {
        return;
    };
    let views = accounting(&pool);
    let (video_id, _slug) = common::seed_video(&pool, None).await;
    let item = ContentRef::video(video_id, None);
    let actor = Actor::anonymous(actor_key_from_ip("203.0.113.15"));

    assert_eq!(views.record_view(&item, &actor).await, ViewOutcome::Counted);
    assert_eq!(views.record_view(&item, &actor).await, ViewOutcome::Throttled);

    let count: i64 = sqlx::query_scalar("SELECT views_count FROM videos WHERE id = $1")
        .bind(video_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_pg_throttle_store_first_write_wins() {
    let Some(pool) = common::setup_test_db().await else {
        return;
    };
    let store = PgThrottleStore::new(pool.clone());
    let key = format!("article:{}:testactor", Uuid::new_v4());

    store.record(&key, Duration::from_secs(3600)).await.unwrap();
    assert!(store.exists(&key).await.unwrap());

    let first_deadline: chrono::DateTime<chrono::Utc> =
        sqlx::query_scalar("SELECT expires_at FROM view_throttle WHERE throttle_key = $1")
            .bind(&key)
            .fetch_one(&pool)
            .await
            .unwrap();

    // Re-recording must not move the live deadline
    store.record(&key, Duration::from_secs(7200)).await.unwrap();
    let second_deadline: chrono::DateTime<chrono::Utc> =
        sqlx::query_scalar("SELECT expires_at FROM view_throttle WHERE throttle_key = $1")
            .bind(&key)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(first_deadline, second_deadline);
}

#[tokio::test]
async fn test_pg_throttle_store_expiry_and_sweep() {
    let Some(pool) = common::setup_test_db().await else {
        return;
    };
    let store = PgThrottleStore::new(pool.clone());
    let key = format!("article:{}:expired", Uuid::new_v4());

    // Seed an already-expired row
    sqlx::query(
        "INSERT INTO view_throttle (throttle_key, expires_at) VALUES ($1, NOW() - INTERVAL '1 minute')",
    )
    .bind(&key)
    .execute(&pool)
    .await
    .unwrap();

    assert!(!store.exists(&key).await.unwrap());

    // A new record over a dead row starts a fresh window
    store.record(&key, Duration::from_secs(3600)).await.unwrap();
    assert!(store.exists(&key).await.unwrap());

    // The sweep never removes live rows
    store.cleanup_expired().await.unwrap();
    assert!(store.exists(&key).await.unwrap());
}

#[tokio::test]
async fn test_fail_open_when_throttle_store_unavailable() {
    let Some(pool) = common::setup_test_db().await else {
        return;
    };

    // Store backed by its own, already-closed pool: every call errors
    let url = std::env::var("DATABASE_URL").unwrap();
    let dead_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .unwrap();
    dead_pool.close().await;

    let store = PgThrottleStore::new(dead_pool);
    let views = ViewAccounting::new(pool.clone(), store, WINDOW, STORE_TIMEOUT);

    let article = publish_article(&pool, None).await;
    let item = ContentRef::article(article.id, None);
    let actor = Actor::anonymous(actor_key_from_ip("203.0.113.16"));

    // Throttle store down: the view still counts (fail open)
    assert_eq!(views.record_view(&item, &actor).await, ViewOutcome::Counted);
    assert_eq!(common::article_views(&pool, article.id).await, 1);
}
