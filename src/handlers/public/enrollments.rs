// handlers/public/enrollments.rs - GET /api/v1/enrollments/popularCourses
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::config::ApiConfig;
use crate::database::models::PopularCourse;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    pub limit: Option<String>,
}

/// Default when absent, clamped to the configured ceiling
fn resolve_limit(raw: Option<&str>, api: &ApiConfig) -> Result<i64, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(api.popular_default_limit);
    };

    match raw.parse::<i64>() {
        Ok(limit) if limit > 0 => Ok(limit.min(api.popular_max_limit)),
        _ => Err(ApiError::invalid_field("limit", "limit must be a positive integer")),
    }
}

/// GET /api/v1/enrollments/popularCourses?limit=10
///
/// Courses ranked by enrollment count, highest first. Ties go to the
/// course created earlier.
///
/// Expected Output (Success):
/// ```json
/// {
///   "status": 200,
///   "success": true,
///   "data": [
///     {
///       "courseId": "…",
///       "courseName": "rust-101",
///       "totalEnrollments": 42,
///       "educator": { "id": "…", "username": "ada", "profileImage": null }
///     }
///   ],
///   "message": "Popular courses fetched successfully"
/// }
/// ```
pub async fn popular(
    State(state): State<AppState>,
    Query(query): Query<PopularQuery>,
) -> ApiResult<Vec<PopularCourse>> {
    let limit = resolve_limit(query.limit.as_deref(), &state.config.api)?;
    let courses = state.store.popular_courses(limit).await?;

    if courses.is_empty() {
        return Err(ApiError::not_found("No popular courses found"));
    }
    Ok(ApiResponse::success(courses, "Popular courses fetched successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn limit_defaults_and_clamps() {
        let api = AppConfig::development().api;
        assert_eq!(resolve_limit(None, &api).unwrap(), 20);
        assert_eq!(resolve_limit(Some(""), &api).unwrap(), 20);
        assert_eq!(resolve_limit(Some("5"), &api).unwrap(), 5);
        assert_eq!(resolve_limit(Some("5000"), &api).unwrap(), 100);
    }

    #[test]
    fn limit_must_be_positive_integer() {
        let api = AppConfig::development().api;
        for bad in ["0", "-3", "ten", "2.5"] {
            assert_eq!(resolve_limit(Some(bad), &api).unwrap_err().status_code(), 400);
        }
    }
}
