pub mod cookies;
pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;

/// Access tokens authorize requests; refresh tokens only mint new pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub kind: TokenKind,
    pub jti: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, kind: TokenKind, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            kind,
            jti: Uuid::new_v4(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token secret is not configured")]
    MissingSecret,

    #[error("token encoding failed: {0}")]
    Encode(jsonwebtoken::errors::Error),

    #[error("invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),

    #[error("token kind does not match")]
    WrongKind,
}

/// Freshly minted access/refresh pair
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn secret_for(security: &SecurityConfig, kind: TokenKind) -> Result<&str, TokenError> {
    let secret = match kind {
        TokenKind::Access => security.access_token_secret.as_str(),
        TokenKind::Refresh => security.refresh_token_secret.as_str(),
    };

    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }
    Ok(secret)
}

fn ttl_for(security: &SecurityConfig, kind: TokenKind) -> Duration {
    match kind {
        TokenKind::Access => Duration::minutes(security.access_token_ttl_minutes),
        TokenKind::Refresh => Duration::days(security.refresh_token_ttl_days),
    }
}

pub fn issue_token(security: &SecurityConfig, user_id: Uuid, kind: TokenKind) -> Result<String, TokenError> {
    let secret = secret_for(security, kind)?;
    let claims = Claims::new(user_id, kind, ttl_for(security, kind));

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(TokenError::Encode)
}

/// Checks signature, expiry and that the token is of the expected kind
pub fn verify_token(security: &SecurityConfig, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
    let secret = secret_for(security, kind)?;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(TokenError::Invalid)?
    .claims;

    if claims.kind != kind {
        return Err(TokenError::WrongKind);
    }
    Ok(claims)
}

pub fn issue_pair(security: &SecurityConfig, user_id: Uuid) -> Result<TokenPair, TokenError> {
    Ok(TokenPair {
        access_token: issue_token(security, user_id, TokenKind::Access)?,
        refresh_token: issue_token(security, user_id, TokenKind::Refresh)?,
    })
}

/// Stored in place of the refresh token itself
pub fn fingerprint(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
