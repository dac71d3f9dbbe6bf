use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Account row. Credentials never leave the process: both secret columns are
/// skipped on serialization.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub fullname: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub cover_image: Option<String>,
    #[serde(skip_serializing, default)]
    pub password: String,
    #[serde(skip_serializing, default)]
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Which of the two profile pictures an upload replaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserImage {
    Profile,
    Cover,
}

impl UserImage {
    pub fn column(&self) -> &'static str {
        match self {
            UserImage::Profile => "profile_image",
            UserImage::Cover => "cover_image",
        }
    }

    pub fn current<'a>(&self, user: &'a User) -> Option<&'a str> {
        match self {
            UserImage::Profile => user.profile_image.as_deref(),
            UserImage::Cover => user.cover_image.as_deref(),
        }
    }
}

/// Educator display fields joined into course listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EducatorSummary {
    pub id: Uuid,
    pub username: String,
    pub profile_image: Option<String>,
}

impl From<&User> for EducatorSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            profile_image: user.profile_image.clone(),
        }
    }
}

/// Usernames are stored lowercased and trimmed, emails too
pub fn normalize_identity(value: &str) -> String {
    value.trim().to_lowercase()
}
