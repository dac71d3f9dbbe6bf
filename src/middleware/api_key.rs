use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use sha2::{Digest, Sha256};

use crate::error::ApiError;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Gate for the admin routes: `x-api-key` must equal the configured key.
/// With no key configured the routes are closed.
pub async fn require_api_key(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let expected = state.config.security.admin_api_key.as_deref();
    let provided = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());

    match (expected, provided) {
        (Some(expected), Some(provided)) if !expected.is_empty() && keys_match(expected, provided) => {
            Ok(next.run(request).await)
        }
        _ => {
            tracing::warn!("Rejected admin request to {}", request.uri().path());
            Err(ApiError::forbidden("Invalid API key"))
        }
    }
}

/// Compare fixed-length digests without short-circuiting on the first
/// differing byte
fn keys_match(expected: &str, provided: &str) -> bool {
    let expected = Sha256::digest(expected.as_bytes());
    let provided = Sha256::digest(provided.as_bytes());
    expected
        .iter()
        .zip(provided.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_match_only_on_exact_value() {
        assert!(keys_match("dev-admin-key", "dev-admin-key"));
        assert!(!keys_match("dev-admin-key", "dev-admin-kez"));
        assert!(!keys_match("dev-admin-key", "dev-admin-key "));
        assert!(!keys_match("dev-admin-key", ""));
    }
}
