// handlers/protected/likes.rs - GET|POST /api/v1/likes/:courseId/toggleLike
use axum::extract::{Extension, Path, State};
use serde_json::{json, Value};

use crate::api::parse_id;
use crate::database::models::Relation;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

pub async fn toggle(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(course_id): Path<String>,
) -> ApiResult<Value> {
    let course_id = parse_id(&course_id, "course")?;
    if state.store.find_course(course_id).await?.is_none() {
        return Err(ApiError::not_found("Course not found"));
    }

    let outcome = state.store.toggle_relation(Relation::Like, course_id, auth.id()).await?;
    let message = if outcome.is_on() {
        "Liked successfully"
    } else {
        "Unliked successfully"
    };
    Ok(ApiResponse::success(json!({ "liked": outcome.is_on() }), message))
}
