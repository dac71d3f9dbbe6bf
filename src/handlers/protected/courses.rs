// handlers/protected/courses.rs - educator course management
use axum::extract::{Extension, Multipart, Path, State};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::api::{parse_id, JsonBody, MultipartForm};
use crate::database::models::{
    course::{normalize_category, normalize_tags},
    Course, CourseUpdate, NewCourse,
};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::storage::{self, MediaKind};
use crate::state::AppState;

/// Load a course and require the caller to be its educator
pub async fn owned_course(state: &AppState, course_id: Uuid, auth: &AuthUser) -> Result<Course, ApiError> {
    let course = state
        .store
        .find_course(course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    if !course.is_owned_by(auth.id()) {
        warn!("User {} is not the educator of course {}", auth.id(), course_id);
        return Err(ApiError::forbidden("You are not the course owner"));
    }
    Ok(course)
}

/// Fields shared by create and update that carry numeric or size limits
#[derive(Debug, Validate)]
struct CourseLimits {
    #[validate(range(min = 0.0, message = "Price must be a non-negative number"))]
    price: f64,
    #[validate(length(max = 10, message = "At most 10 tags are allowed"))]
    tags: Vec<String>,
}

fn parse_price(raw: &str) -> Result<f64, ApiError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .ok_or_else(|| ApiError::invalid_field("price", "Price must be a non-negative number"))
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn form_required(form: &MultipartForm, field: &str) -> Result<String, ApiError> {
    form.text(field)
        .ok_or_else(|| ApiError::invalid_field(field, format!("{} is required", field)))
}

fn course_from_form(form: &MultipartForm, educator_id: Uuid) -> Result<NewCourse, ApiError> {
    let course_name = form_required(form, "courseName")?;
    let description = form_required(form, "description")?;
    let price = parse_price(&form_required(form, "price")?)?;
    let duration = form_required(form, "duration")?;
    let category = form_required(form, "category")?;
    let tags = normalize_tags(form.all("tags"));

    CourseLimits {
        price,
        tags: tags.clone(),
    }
    .validate()?;

    Ok(NewCourse {
        title: form.text("title").unwrap_or_else(|| course_name.clone()),
        course_name,
        description,
        duration: Some(duration),
        price,
        category: normalize_category(&category),
        tags,
        thumbnail: None,
        educator_id,
    })
}

/// POST /api/v1/courses/createCourse - multipart
///
/// Text fields: `courseName`, `title` (optional, defaults to the name),
/// `description`, `price`, `duration`, `category`, `tags` (repeated or
/// comma-separated, at most 10). File field: `thumbnail` (required image).
///
/// Responds 201 with the stored course.
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<Course> {
    let mut form = MultipartForm::read(multipart, state.config.api.max_upload_bytes).await?;
    let mut new_course = course_from_form(&form, auth.id())?;

    let thumbnail = form
        .take_file("thumbnail")
        .ok_or_else(|| ApiError::invalid_field("thumbnail", "Thumbnail image is required"))?;
    let url = storage::store_upload(
        state.storage.as_ref(),
        &state.config.storage.thumbnail_bucket,
        thumbnail,
        MediaKind::Image,
    )
    .await?;
    new_course.thumbnail = Some(url.clone());

    match state.store.create_course(new_course).await {
        Ok(course) => {
            info!("User {} created course {}", auth.id(), course.id);
            Ok(ApiResponse::created(course, "Course created successfully"))
        }
        Err(e) => {
            storage::discard(state.storage.as_ref(), &url).await;
            Err(e.into())
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    pub course_name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl UpdateCourseRequest {
    fn into_update(self) -> Result<CourseUpdate, ApiError> {
        let tags = self.tags.map(normalize_tags);
        CourseLimits {
            price: self.price.unwrap_or_default(),
            tags: tags.clone().unwrap_or_default(),
        }
        .validate()?;

        Ok(CourseUpdate {
            course_name: blank_to_none(self.course_name),
            title: blank_to_none(self.title),
            description: blank_to_none(self.description),
            duration: blank_to_none(self.duration),
            price: self.price,
            category: blank_to_none(self.category).map(|c| normalize_category(&c)),
            tags,
        })
    }
}

/// POST /api/v1/courses/:courseId/updateCourse - partial JSON update, owner only
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(course_id): Path<String>,
    JsonBody(payload): JsonBody<UpdateCourseRequest>,
) -> ApiResult<Course> {
    let course_id = parse_id(&course_id, "course")?;
    let update = payload.into_update()?;
    if update.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    owned_course(&state, course_id, &auth).await?;
    let course = state.store.update_course(course_id, update).await?;
    Ok(ApiResponse::success(course, "Course updated successfully"))
}

/// POST /api/v1/courses/:courseId/updateThumbnail - multipart `thumbnail`, owner only
pub async fn update_thumbnail(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(course_id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Course> {
    let course_id = parse_id(&course_id, "course")?;
    let existing = owned_course(&state, course_id, &auth).await?;

    let mut form = MultipartForm::read(multipart, state.config.api.max_upload_bytes).await?;
    let thumbnail = form
        .take_file("thumbnail")
        .ok_or_else(|| ApiError::invalid_field("thumbnail", "Thumbnail image is required"))?;

    let url = storage::store_upload(
        state.storage.as_ref(),
        &state.config.storage.thumbnail_bucket,
        thumbnail,
        MediaKind::Image,
    )
    .await?;

    let course = match state.store.set_course_thumbnail(course_id, &url).await {
        Ok(course) => course,
        Err(e) => {
            storage::discard(state.storage.as_ref(), &url).await;
            return Err(e.into());
        }
    };

    if let Some(previous) = existing.thumbnail {
        storage::discard(state.storage.as_ref(), &previous).await;
    }
    Ok(ApiResponse::success(course, "Thumbnail updated"))
}
