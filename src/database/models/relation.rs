use serde::Serialize;

use super::course::Course;
use super::user::User;

/// Result of a toggle: whether the relation exists after the call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        matches!(self, Toggle::On)
    }
}

/// Course↔user relations that are flipped by toggling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Enrollment,
    Like,
}

impl Relation {
    pub fn table(&self) -> &'static str {
        match self {
            Relation::Enrollment => "enrollments",
            Relation::Like => "likes",
        }
    }

    pub fn user_column(&self) -> &'static str {
        match self {
            Relation::Enrollment => "student_id",
            Relation::Like => "user_id",
        }
    }

    /// Denormalized counter column on `courses`
    pub fn counter_column(&self) -> &'static str {
        match self {
            Relation::Enrollment => "enrollments",
            Relation::Like => "likes",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDashboard {
    #[serde(flatten)]
    pub user: User,
    pub courses: Vec<Course>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EducatorDashboard {
    pub total_courses: usize,
    pub total_enrollments: i64,
    pub total_likes: i64,
    pub courses: Vec<Course>,
}

impl EducatorDashboard {
    pub fn from_courses(courses: Vec<Course>) -> Self {
        Self {
            total_courses: courses.len(),
            total_enrollments: courses.iter().map(|c| c.enrollments).sum(),
            total_likes: courses.iter().map(|c| c.likes).sum(),
            courses,
        }
    }
}
