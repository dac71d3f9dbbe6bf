use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::lesson::LessonWithVideos;
use super::user::EducatorSummary;

/// Upper bound on tags per course, also enforced by a CHECK constraint
pub const MAX_TAGS: usize = 10;

/// Categories offered by the catalog UI
pub const CATEGORIES: &[&str] = &[
    "Artificial Intelligence",
    "Web Development",
    "App Development",
    "Software Development",
    "Language",
    "Game Development",
    "Programming Languages",
    "Graphic Design",
    "UI/UX Design",
    "Video Editing",
    "Cybersecurity",
    "Cloud Computing",
    "Data Science",
    "DevOps",
    "Digital Marketing",
    "Blockchain Technology",
];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub course_name: String,
    pub title: String,
    pub description: String,
    pub duration: Option<String>,
    pub price: f64,
    pub thumbnail: Option<String>,
    pub category: String,
    pub educator_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub likes: i64,
    pub enrollments: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.educator_id == Some(user_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub course_name: String,
    pub title: String,
    pub description: String,
    pub duration: Option<String>,
    pub price: f64,
    pub category: String,
    pub tags: Vec<String>,
    pub thumbnail: Option<String>,
    pub educator_id: Uuid,
}

/// Partial update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct CourseUpdate {
    pub course_name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl CourseUpdate {
    pub fn is_empty(&self) -> bool {
        self.course_name.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.duration.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.tags.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseFilter {
    All,
    Category(String),
    Free,
}

impl CourseFilter {
    pub fn matches(&self, course: &Course) -> bool {
        match self {
            CourseFilter::All => true,
            CourseFilter::Category(category) => &course.category == category,
            CourseFilter::Free => course.price == 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseWithEducator {
    #[serde(flatten)]
    pub course: Course,
    pub educator: Option<EducatorSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub educator: Option<EducatorSummary>,
    pub lessons: Vec<LessonWithVideos>,
}

/// One row of the enrollment ranking
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularCourse {
    pub course_id: Uuid,
    pub course_name: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub thumbnail: Option<String>,
    pub category: String,
    pub total_enrollments: i64,
    pub educator: EducatorSummary,
}

/// Categories are matched case-insensitively by storing them lowercased
pub fn normalize_category(category: &str) -> String {
    category.trim().to_lowercase()
}

pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
