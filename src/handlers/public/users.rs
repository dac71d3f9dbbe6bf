// handlers/public/users.rs - register, login, logout and token refresh
use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api::{required, required_secret, JsonBody};
use crate::auth::{self, cookies, password, TokenKind, TokenPair};
use crate::database::models::{user::normalize_identity, NewUser, User};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginData {
    pub user: User,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// POST /api/v1/users/register - Create an account
///
/// Expected Input:
/// ```json
/// { "username": "ada", "email": "ada@example.com", "password": "secret" }
/// ```
///
/// Responds 201 with the user (no password). A taken email is 409.
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> ApiResult<User> {
    let username = normalize_identity(&required(payload.username, "username")?);
    let email = normalize_identity(&required(payload.email, "email")?);
    let plain = required_secret(payload.password, "password")?;

    if !validator::validate_email(email.as_str()) {
        return Err(ApiError::invalid_field("email", "Invalid email"));
    }

    let password_hash = password::hash_password(&plain, state.config.security.bcrypt_cost).await?;
    let user = state
        .store
        .create_user(NewUser {
            username,
            email,
            password_hash,
        })
        .await?;

    info!("Registered user {}", user.id);
    Ok(ApiResponse::created(user, "User registered"))
}

/// POST /api/v1/users/login - Exchange credentials for a token pair
///
/// Both tokens are returned in the body and set as HTTP-only cookies.
/// Unknown email and wrong password get the same 401.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<LoginData>), ApiError> {
    let email = normalize_identity(&required(payload.email, "email")?);
    let plain = required_secret(payload.password, "password")?;

    let Some(user) = state.store.find_user_by_email(&email).await? else {
        warn!("Login attempt for unknown email");
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    if !password::verify_password(&plain, &user.password).await? {
        warn!("Failed login for user {}", user.id);
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let tokens = auth::issue_pair(&state.config.security, user.id)?;
    state
        .store
        .set_refresh_token_hash(user.id, Some(&auth::fingerprint(&tokens.refresh_token)))
        .await?;

    info!("User {} logged in", user.id);
    let jar = cookies::set_tokens(jar, &tokens, &state.config.security);
    Ok((jar, ApiResponse::success(LoginData { user, tokens }, "Logged in")))
}

/// POST /api/v1/users/logout - Clear the token cookies
///
/// The stored refresh token is revoked only when the presented one is the
/// current token; a rotated token just clears the caller's cookies.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<(CookieJar, ApiResponse<Value>), ApiError> {
    if let Some(cookie) = jar.get(cookies::REFRESH_COOKIE) {
        if let Ok(claims) = auth::verify_token(&state.config.security, cookie.value(), TokenKind::Refresh) {
            if let Some(user) = state.store.find_user_by_id(claims.sub).await? {
                if user.refresh_token_hash.as_deref() == Some(auth::fingerprint(cookie.value()).as_str()) {
                    state.store.set_refresh_token_hash(user.id, None).await?;
                } else {
                    warn!("Logout with stale refresh token for user {}", user.id);
                }
            }
        }
    }

    Ok((cookies::clear_tokens(jar), ApiResponse::success(json!({}), "Logged out")))
}

/// POST /api/v1/users/refresh - Rotate the token pair
///
/// The refresh token is read from the `refreshToken` cookie, or from
/// `{ "refreshToken": "..." }` in the body. It must match the one issued
/// last; a previously rotated token is rejected.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<(CookieJar, ApiResponse<TokenPair>), ApiError> {
    let presented = jar
        .get(cookies::REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| body.and_then(|Json(b)| b.refresh_token))
        .ok_or_else(|| ApiError::unauthorized("Unauthorized request"))?;

    let claims = auth::verify_token(&state.config.security, &presented, TokenKind::Refresh)
        .map_err(|_| ApiError::unauthorized("Invalid refresh token"))?;

    let user = state
        .store
        .find_user_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid refresh token"))?;

    if user.refresh_token_hash.as_deref() != Some(auth::fingerprint(&presented).as_str()) {
        warn!("Stale refresh token presented for user {}", user.id);
        return Err(ApiError::unauthorized("Refresh token is expired or used"));
    }

    let tokens = auth::issue_pair(&state.config.security, user.id)?;
    state
        .store
        .set_refresh_token_hash(user.id, Some(&auth::fingerprint(&tokens.refresh_token)))
        .await?;

    let jar = cookies::set_tokens(jar, &tokens, &state.config.security);
    Ok((jar, ApiResponse::success(tokens, "Tokens refreshed")))
}
