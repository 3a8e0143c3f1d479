//! API Middleware
//!
//! Actor resolution and request logging.

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::domain::{actor_key_from_ip, Actor};

// =========================================================================
// Actor Resolution Middleware
// =========================================================================

/// Resolve the requesting actor and store it in request extensions.
///
/// The throttle key is derived from the client network address
/// (`X-Forwarded-For` first hop, then `X-Real-IP`). The optional `X-User-Id`
/// header carries the authenticated user identity set by the auth layer in
/// front of this service; it is only used for the self-view exclusion.
pub async fn actor_middleware(
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let ip = client_ip(&headers);
    let key = actor_key_from_ip(&ip);

    let actor = match headers.get("X-User-Id").and_then(|v| v.to_str().ok()) {
        Some(user_id_str) => match Uuid::parse_str(user_id_str) {
            Ok(user_id) => Actor::authenticated(key, user_id),
            Err(_) => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "Invalid X-User-Id header format",
                        "error_code": "invalid_user_id"
                    })),
                )
                    .into_response());
            }
        },
        None => Actor::anonymous(key),
    };

    request.extensions_mut().insert(actor);

    Ok(next.run(request).await)
}

/// Extract the client address from proxy headers.
fn client_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("X-Forwarded-For").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("X-Real-IP").and_then(|v| v.to_str().ok()) {
        return real_ip.trim().to_string();
    }

    "unknown".to_string()
}

// =========================================================================
// Header masking for logs
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "set-cookie",
];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request Logging Middleware
// =========================================================================

/// Request logging middleware
pub async fn logging_middleware(
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let version = request.version();

    // Mask sensitive headers
    let headers = mask_headers_for_logging(request.headers());

    // Actor key if the actor middleware already ran
    let actor_key = request
        .extensions()
        .get::<Actor>()
        .map(|actor| actor.key.to_string());

    let start = std::time::Instant::now();

    // Log request
    tracing::info!(
        method = %method,
        uri = %uri,
        version = ?version,
        actor_key = ?actor_key,
        headers = ?headers,
        "Incoming request"
    );

    // Process request
    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    // Log response
    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        actor_key = ?actor_key,
        "Request completed"
    );

    response
}
