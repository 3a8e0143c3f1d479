//! NewsHub Library
//!
//! Re-exports modules for integration testing and external use.

pub mod aggregate;
pub mod api;
pub mod content;
pub mod domain;
pub mod jobs;
pub mod throttle;
pub mod views;

pub mod config;
pub mod db;
mod error;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use domain::{Actor, ActorKey, ContentRef, ContentState, ContentStatus, ContentType};
pub use views::ViewOutcome;
