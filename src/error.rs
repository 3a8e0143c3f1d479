//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Article not found: {0}")]
    ArticleNotFound(String),

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    // Subsystem errors
    #[error(transparent)]
    Content(#[from] crate::content::ContentError),

    #[error(transparent)]
    Aggregate(#[from] crate::aggregate::AggregateError),

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            // 404 Not Found
            AppError::ArticleNotFound(slug) => {
                (StatusCode::NOT_FOUND, "article_not_found", Some(slug.clone()))
            }
            AppError::VideoNotFound(slug) => {
                (StatusCode::NOT_FOUND, "video_not_found", Some(slug.clone()))
            }
            AppError::CategoryNotFound(id) => {
                (StatusCode::NOT_FOUND, "category_not_found", Some(id.clone()))
            }

            // Content repository errors - map to appropriate HTTP status
            AppError::Content(ref content_err) => {
                use crate::content::ContentError;
                match content_err {
                    ContentError::ArticleNotFound(id) => {
                        (StatusCode::NOT_FOUND, "article_not_found", Some(id.to_string()))
                    }
                    ContentError::Aggregate(crate::aggregate::AggregateError::CategoryNotFound(id)) => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "category_not_found", Some(id.to_string()))
                    }
                    ContentError::Database(e) => {
                        tracing::error!("Database error: {:?}", e);
                        (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
                    }
                    ContentError::Aggregate(crate::aggregate::AggregateError::Database(e)) => {
                        tracing::error!("Database error: {:?}", e);
                        (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
                    }
                }
            }

            AppError::Aggregate(ref agg_err) => {
                use crate::aggregate::AggregateError;
                match agg_err {
                    AggregateError::CategoryNotFound(id) => {
                        (StatusCode::NOT_FOUND, "category_not_found", Some(id.to_string()))
                    }
                    AggregateError::Database(e) => {
                        tracing::error!("Database error: {:?}", e);
                        (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
                    }
                }
            }

            // 500 Internal Server Error
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
