use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub details: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub title: String,
    pub url: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonWithVideos {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub videos: Vec<Video>,
}

#[derive(Debug, Clone)]
pub struct NewLesson {
    pub course_id: Uuid,
    pub title: String,
    pub details: String,
}

#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default)]
pub struct LessonUpdate {
    pub title: Option<String>,
    pub details: Option<String>,
}

impl LessonUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.details.is_none()
    }
}
