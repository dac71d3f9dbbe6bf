// handlers/protected/lessons.rs - lessons and their videos
use axum::extract::{Extension, Multipart, Path, State};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::courses::owned_course;
use crate::api::{parse_id, JsonBody, MultipartForm};
use crate::database::models::{Lesson, LessonUpdate, LessonWithVideos, NewLesson, NewVideo, Video};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::storage::{self, MediaKind};
use crate::state::AppState;

fn form_required(form: &MultipartForm, field: &str) -> Result<String, ApiError> {
    form.text(field)
        .ok_or_else(|| ApiError::invalid_field(field, format!("{} is required", field)))
}

async fn upload_video(state: &AppState, form: &mut MultipartForm) -> Result<String, ApiError> {
    let video = form
        .take_file("video")
        .ok_or_else(|| ApiError::invalid_field("video", "Video file is required"))?;

    Ok(storage::store_upload(
        state.storage.as_ref(),
        &state.config.storage.video_bucket,
        video,
        MediaKind::Video,
    )
    .await?)
}

async fn owned_lesson(
    state: &AppState,
    auth: &AuthUser,
    course_id: &str,
    lesson_id: &str,
) -> Result<(Uuid, LessonWithVideos), ApiError> {
    let course_id = parse_id(course_id, "course")?;
    let lesson_id = parse_id(lesson_id, "lesson")?;
    owned_course(state, course_id, auth).await?;

    let lesson = state
        .store
        .find_lesson(course_id, lesson_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lesson not found"))?;
    Ok((course_id, lesson))
}

/// POST /api/v1/lessons/:courseId - multipart
///
/// Text fields: `lessonTitle`, `details` (optional), `videoTitle`.
/// File field: `video`. The lesson is appended after the existing ones.
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(course_id): Path<String>,
    multipart: Multipart,
) -> ApiResult<LessonWithVideos> {
    let course_id = parse_id(&course_id, "course")?;
    owned_course(&state, course_id, &auth).await?;

    let mut form = MultipartForm::read(multipart, state.config.api.max_upload_bytes).await?;
    let title = form_required(&form, "lessonTitle")?;
    let video_title = form_required(&form, "videoTitle")?;
    let details = form.text("details").unwrap_or_default();
    let url = upload_video(&state, &mut form).await?;

    let created = state
        .store
        .create_lesson(
            NewLesson {
                course_id,
                title,
                details,
            },
            NewVideo {
                title: video_title,
                url: url.clone(),
            },
        )
        .await;

    match created {
        Ok(lesson) => {
            info!("Lesson {} added to course {}", lesson.lesson.id, course_id);
            Ok(ApiResponse::created(lesson, "Lesson created successfully"))
        }
        Err(e) => {
            storage::discard(state.storage.as_ref(), &url).await;
            Err(e.into())
        }
    }
}

/// GET /api/v1/lessons/:courseId
pub async fn list(State(state): State<AppState>, Path(course_id): Path<String>) -> ApiResult<Vec<LessonWithVideos>> {
    let course_id = parse_id(&course_id, "course")?;
    if state.store.find_course(course_id).await?.is_none() {
        return Err(ApiError::not_found("Course not found"));
    }

    let lessons = state.store.list_lessons(course_id).await?;
    Ok(ApiResponse::success(lessons, "Lessons fetched"))
}

/// POST /api/v1/lessons/:courseId/:lessonId - multipart `videoTitle` + `video`
pub async fn add_video(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((course_id, lesson_id)): Path<(String, String)>,
    multipart: Multipart,
) -> ApiResult<Video> {
    let (_, lesson) = owned_lesson(&state, &auth, &course_id, &lesson_id).await?;

    let mut form = MultipartForm::read(multipart, state.config.api.max_upload_bytes).await?;
    let title = form_required(&form, "videoTitle")?;
    let url = upload_video(&state, &mut form).await?;

    match state
        .store
        .add_video(lesson.lesson.id, NewVideo { title, url: url.clone() })
        .await
    {
        Ok(video) => Ok(ApiResponse::created(video, "Video added")),
        Err(e) => {
            storage::discard(state.storage.as_ref(), &url).await;
            Err(e.into())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateLessonRequest {
    pub title: Option<String>,
    pub details: Option<String>,
}

/// PUT /api/v1/lessons/:courseId/:lessonId - `{ "title"?: "...", "details"?: "..." }`
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((course_id, lesson_id)): Path<(String, String)>,
    JsonBody(payload): JsonBody<UpdateLessonRequest>,
) -> ApiResult<Lesson> {
    let update = LessonUpdate {
        title: payload.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
        details: payload.details.map(|d| d.trim().to_string()),
    };
    if update.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let (_, lesson) = owned_lesson(&state, &auth, &course_id, &lesson_id).await?;
    let lesson = state.store.update_lesson(lesson.lesson.id, update).await?;
    Ok(ApiResponse::success(lesson, "Lesson updated"))
}

/// DELETE /api/v1/lessons/:courseId/:lessonId - also removes the stored videos
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((course_id, lesson_id)): Path<(String, String)>,
) -> ApiResult<Value> {
    let (course_id, lesson) = owned_lesson(&state, &auth, &course_id, &lesson_id).await?;

    state.store.delete_lesson(lesson.lesson.id).await?;
    for video in &lesson.videos {
        storage::discard(state.storage.as_ref(), &video.url).await;
    }

    info!("Lesson {} removed from course {}", lesson.lesson.id, course_id);
    Ok(ApiResponse::success(json!({ "id": lesson.lesson.id }), "Lesson deleted"))
}

/// DELETE /api/v1/lessons/:courseId/:lessonId/:videoId
pub async fn delete_video(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((course_id, lesson_id, video_id)): Path<(String, String, String)>,
) -> ApiResult<Video> {
    let video_id = parse_id(&video_id, "video")?;
    let (_, lesson) = owned_lesson(&state, &auth, &course_id, &lesson_id).await?;

    let video = state.store.delete_video(lesson.lesson.id, video_id).await?;
    storage::discard(state.storage.as_ref(), &video.url).await;
    Ok(ApiResponse::success(video, "Video deleted"))
}
