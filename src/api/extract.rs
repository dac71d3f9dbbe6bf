use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ApiError;

/// `Json<T>` whose rejection is reported through the error envelope
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError::invalid_json(rejection.body_text())),
        }
    }
}

/// Parse a path segment as an id, naming the resource in the error
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("Invalid {} id", what)))
}

/// Required, non-blank text field
pub fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::invalid_field(field, format!("{} is required", field))),
    }
}

/// Required field kept verbatim; only an all-whitespace value is missing
pub fn required_secret(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::invalid_field(field, format!("{} is required", field))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_id_is_a_bad_request() {
        let err = parse_id("not-a-uuid", "course").unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Invalid course id");
    }

    #[test]
    fn blank_required_field_is_rejected() {
        assert!(required(Some("   ".into()), "title").is_err());
        assert!(required(None, "title").is_err());
        assert_eq!(required(Some(" Rust ".into()), "title").unwrap(), "Rust");
    }

    #[test]
    fn secrets_keep_surrounding_whitespace() {
        assert_eq!(required_secret(Some("  secret  ".into()), "password").unwrap(), "  secret  ");
        assert!(required_secret(Some("   ".into()), "password").is_err());
        assert!(required_secret(None, "password").is_err());
    }
}
