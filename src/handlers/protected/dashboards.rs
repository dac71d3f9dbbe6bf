// handlers/protected/dashboards.rs - student and educator overviews
use axum::extract::{Extension, State};

use crate::database::models::{EducatorDashboard, StudentDashboard};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /api/v1/dashboards - profile plus enrolled courses, newest enrollment first
pub async fn student(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<StudentDashboard> {
    let courses = state.store.enrolled_courses(auth.id()).await?;
    let message = if courses.is_empty() {
        "You have not enrolled in any courses"
    } else {
        "Dashboard fetched"
    };

    Ok(ApiResponse::success(
        StudentDashboard {
            user: auth.0,
            courses,
        },
        message,
    ))
}

/// GET /api/v1/dashboards/educator - owned courses with summed counters
pub async fn educator(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<EducatorDashboard> {
    let courses = state.store.courses_by_educator(auth.id()).await?;
    Ok(ApiResponse::success(
        EducatorDashboard::from_courses(courses),
        "Educator dashboard fetched",
    ))
}
