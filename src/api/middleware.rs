use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::AppState;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Gate for the collector-facing routes (audits, tab header capture, console
/// events). `/health` is mounted outside it. A browser collector sends the
/// shared key in `X-API-Key`; when no key is configured captures are accepted
/// from anyone, which is meant for a collector on localhost.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected_key) = &state.config.api_key else {
        return Ok(next.run(request).await);
    };

    let provided_key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided_key {
        Some(key) if keys_match(key, expected_key) => Ok(next.run(request).await),
        Some(_) => {
            warn!("Rejected request with invalid API key");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            warn!("Rejected request without {} header", API_KEY_HEADER);
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Length-checked comparison that does not stop at the first differing byte
fn keys_match(provided: &str, expected: &str) -> bool {
    provided.len() == expected.len()
        && provided
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
