// handlers/public/courses.rs - read-only course catalog
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{parse_id, required};
use crate::database::models::{
    course::{normalize_category, CATEGORIES},
    CourseDetail, CourseFilter, CourseWithEducator,
};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

/// GET /api/v1/courses?category=web%20development
pub async fn by_category(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<Vec<CourseWithEducator>> {
    let category = required(query.category, "category")?;
    let courses = state
        .store
        .list_courses(CourseFilter::Category(normalize_category(&category)))
        .await?;

    Ok(ApiResponse::success(courses, format!("{} courses fetched", category)))
}

/// GET /api/v1/courses/listCategory
pub async fn list_categories() -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({ "categories": CATEGORIES }), "Course categories"))
}

/// GET /api/v1/courses/getFree
pub async fn free(State(state): State<AppState>) -> ApiResult<Vec<CourseWithEducator>> {
    let courses = state.store.list_courses(CourseFilter::Free).await?;
    Ok(ApiResponse::success(courses, "Free courses"))
}

/// GET /api/v1/courses/allCourses
pub async fn all(State(state): State<AppState>) -> ApiResult<Vec<CourseWithEducator>> {
    let courses = state.store.list_courses(CourseFilter::All).await?;
    Ok(ApiResponse::success(courses, "Fetched all courses"))
}

/// GET /api/v1/courses/:courseId - Course with educator and ordered lessons
pub async fn detail(State(state): State<AppState>, Path(course_id): Path<String>) -> ApiResult<CourseDetail> {
    let course_id = parse_id(&course_id, "course")?;
    let course = state
        .store
        .course_detail(course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    Ok(ApiResponse::success(course, "Course details retrieved"))
}
