// handlers/protected/users.rs - account self-service
use axum::extract::{Extension, Multipart, Path, State};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::{parse_id, required, required_secret, JsonBody, MultipartForm};
use crate::auth::{cookies, password};
use crate::database::models::{User, UserImage};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::storage::{self, MediaKind};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub fullname: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

/// GET /api/v1/users/current
pub async fn current(Extension(auth): Extension<AuthUser>) -> ApiResult<User> {
    Ok(ApiResponse::success(auth.0, "Current user fetched"))
}

async fn replace_image(
    state: &AppState,
    auth: &AuthUser,
    raw_id: &str,
    multipart: Multipart,
    image: UserImage,
) -> Result<User, ApiError> {
    let user_id = parse_id(raw_id, "user")?;
    auth.ensure_self(user_id)?;

    let mut form = MultipartForm::read(multipart, state.config.api.max_upload_bytes).await?;
    let file = form
        .take_file("image")
        .ok_or_else(|| ApiError::invalid_field("image", "Image file is required"))?;

    let bucket = match image {
        UserImage::Profile => &state.config.storage.profile_image_bucket,
        UserImage::Cover => &state.config.storage.cover_image_bucket,
    };
    let url = storage::store_upload(state.storage.as_ref(), bucket, file, MediaKind::Image).await?;

    let previous = image.current(&auth.0).map(str::to_string);
    let user = match state.store.set_user_image(user_id, image, &url).await {
        Ok(user) => user,
        Err(e) => {
            storage::discard(state.storage.as_ref(), &url).await;
            return Err(e.into());
        }
    };

    if let Some(previous) = previous {
        storage::discard(state.storage.as_ref(), &previous).await;
    }
    Ok(user)
}

/// POST /api/v1/users/:userId/profile/image - multipart field `image`
pub async fn upload_profile_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
    multipart: Multipart,
) -> ApiResult<User> {
    let user = replace_image(&state, &auth, &user_id, multipart, UserImage::Profile).await?;
    Ok(ApiResponse::success(user, "Profile image updated"))
}

/// POST /api/v1/users/:userId/cover/image - multipart field `image`
pub async fn upload_cover_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
    multipart: Multipart,
) -> ApiResult<User> {
    let user = replace_image(&state, &auth, &user_id, multipart, UserImage::Cover).await?;
    Ok(ApiResponse::success(user, "Cover image uploaded"))
}

/// PUT /api/v1/users/:userId/updateprofile - `{ "fullname": "...", "bio": "..." }`
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
    JsonBody(payload): JsonBody<UpdateProfileRequest>,
) -> ApiResult<User> {
    let user_id = parse_id(&user_id, "user")?;
    auth.ensure_self(user_id)?;

    let fullname = required(payload.fullname, "fullname")?;
    let bio = required(payload.bio, "bio")?;

    let user = state.store.update_profile(user_id, &fullname, &bio).await?;
    Ok(ApiResponse::success(user, "Profile updated"))
}

/// PUT /api/v1/users/:userId/changepassword
///
/// Expected Input:
/// ```json
/// { "oldPassword": "current", "newPassword": "replacement" }
/// ```
///
/// Outstanding refresh tokens stop working; the caller logs in again to get
/// a new one.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
    JsonBody(payload): JsonBody<ChangePasswordRequest>,
) -> ApiResult<Value> {
    let user_id = parse_id(&user_id, "user")?;
    auth.ensure_self(user_id)?;

    let old_password = required_secret(payload.old_password, "oldPassword")?;
    let new_password = required_secret(payload.new_password, "newPassword")?;

    if old_password == new_password {
        return Err(ApiError::invalid_field(
            "newPassword",
            "New password must differ from the old password",
        ));
    }
    if !password::verify_password(&old_password, &auth.0.password).await? {
        return Err(ApiError::invalid_field("oldPassword", "Incorrect old password"));
    }

    let hash = password::hash_password(&new_password, state.config.security.bcrypt_cost).await?;
    state.store.update_password(user_id, &hash).await?;

    info!("User {} changed password", user_id);
    Ok(ApiResponse::success(json!({}), "Password changed"))
}

/// DELETE /api/v1/users/:userId/delete
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<Value>), ApiError> {
    let user_id = parse_id(&user_id, "user")?;
    auth.ensure_self(user_id)?;

    state.store.delete_user(user_id).await?;

    for url in [&auth.0.profile_image, &auth.0.cover_image].into_iter().flatten() {
        storage::discard(state.storage.as_ref(), url).await;
    }

    info!("User {} deleted their account", user_id);
    Ok((cookies::clear_tokens(jar), ApiResponse::success(json!({}), "Account deleted")))
}
