// handlers/protected/enrollments.rs - GET|POST /api/v1/enrollments/:courseId
use axum::extract::{Extension, Path, State};
use serde_json::{json, Value};
use tracing::debug;

use crate::api::parse_id;
use crate::database::models::Relation;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// Enroll when not enrolled, unenroll otherwise.
/// Data is `{ "enrolled": bool }` with the state after the call.
pub async fn toggle(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(course_id): Path<String>,
) -> ApiResult<Value> {
    let course_id = parse_id(&course_id, "course")?;
    if state.store.find_course(course_id).await?.is_none() {
        return Err(ApiError::not_found("Course not found"));
    }

    let outcome = state
        .store
        .toggle_relation(Relation::Enrollment, course_id, auth.id())
        .await?;
    debug!("Enrollment of {} in {} is now {:?}", auth.id(), course_id, outcome);

    let message = if outcome.is_on() {
        "Successfully enrolled"
    } else {
        "Unenrolled successfully"
    };
    Ok(ApiResponse::success(json!({ "enrolled": outcome.is_on() }), message))
}
