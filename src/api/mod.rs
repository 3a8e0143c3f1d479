//! HTTP API
//!
//! Thin axum glue over the content repository, view accounting service, and
//! aggregate maintainer.

pub mod middleware;
pub mod routes;

use std::time::Duration;

use sqlx::PgPool;

use crate::aggregate::CategoryCounter;
use crate::content::ContentRepository;
use crate::throttle::PgThrottleStore;
use crate::views::ViewAccounting;

pub use routes::create_router;

/// Shared application state for the router.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub content: ContentRepository,
    pub counter: CategoryCounter,
    pub views: ViewAccounting<PgThrottleStore>,
}

impl AppState {
    pub fn new(pool: PgPool, throttle_window: Duration, throttle_timeout: Duration) -> Self {
        let store = PgThrottleStore::new(pool.clone());
        Self {
            content: ContentRepository::new(pool.clone()),
            counter: CategoryCounter::new(pool.clone()),
            views: ViewAccounting::new(pool.clone(), store, throttle_window, throttle_timeout),
            pool,
        }
    }
}
