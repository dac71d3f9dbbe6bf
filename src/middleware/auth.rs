use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::auth::{cookies::ACCESS_COOKIE, verify_token, TokenKind};
use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user loaded from the store
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }

    /// `:userId` routes only act on the caller's own account
    pub fn ensure_self(&self, user_id: Uuid) -> Result<(), ApiError> {
        if self.id() != user_id {
            tracing::warn!("User {} attempted to act on account {}", self.id(), user_id);
            return Err(ApiError::forbidden("You can only modify your own account"));
        }
        Ok(())
    }
}

/// Validates the access token and injects `AuthUser` into the request.
/// The token comes from the `accessToken` cookie or an `Authorization: Bearer` header.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_access_token(&jar, &headers)
        .ok_or_else(|| ApiError::unauthorized("Unauthorized request"))?;

    let claims = verify_token(&state.config.security, &token, TokenKind::Access).map_err(|e| {
        tracing::debug!("Rejected access token: {}", e);
        ApiError::unauthorized("Invalid access token")
    })?;

    let user = state
        .store
        .find_user_by_id(claims.sub)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Access token for missing user {}", claims.sub);
            ApiError::unauthorized("Invalid access token")
        })?;

    request.extensions_mut().insert(AuthUser(user));
    Ok(next.run(request).await)
}

fn extract_access_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(ACCESS_COOKIE).filter(|c| !c.value().is_empty()) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
