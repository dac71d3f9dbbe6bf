use async_trait::async_trait;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::*;

/// Data access seam used by every handler.
///
/// Integrity rules (unique email, unique course name, one enrollment and one
/// like per user and course, cascading deletes) belong to the implementation;
/// handlers only validate input and check ownership.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    // ---- users -------------------------------------------------------------

    /// Fails with `Conflict` when the email is taken
    async fn create_user(&self, new: NewUser) -> Result<User, DatabaseError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;

    async fn update_profile(&self, id: Uuid, fullname: &str, bio: &str) -> Result<User, DatabaseError>;

    async fn set_user_image(&self, id: Uuid, image: UserImage, url: &str) -> Result<User, DatabaseError>;

    /// Replaces the password hash and drops the stored refresh-token reference
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), DatabaseError>;

    async fn set_refresh_token_hash(&self, id: Uuid, hash: Option<&str>) -> Result<(), DatabaseError>;

    /// Removes the account along with its enrollments and likes, keeping the
    /// course counters consistent. Owned courses lose their educator.
    async fn delete_user(&self, id: Uuid) -> Result<(), DatabaseError>;

    // ---- courses -----------------------------------------------------------

    /// Fails with `Conflict` when the course name is taken
    async fn create_course(&self, new: NewCourse) -> Result<Course, DatabaseError>;

    async fn find_course(&self, id: Uuid) -> Result<Option<Course>, DatabaseError>;

    async fn update_course(&self, id: Uuid, update: CourseUpdate) -> Result<Course, DatabaseError>;

    async fn set_course_thumbnail(&self, id: Uuid, url: &str) -> Result<Course, DatabaseError>;

    /// Newest first
    async fn list_courses(&self, filter: CourseFilter) -> Result<Vec<CourseWithEducator>, DatabaseError>;

    async fn course_detail(&self, id: Uuid) -> Result<Option<CourseDetail>, DatabaseError>;

    async fn courses_by_educator(&self, educator_id: Uuid) -> Result<Vec<Course>, DatabaseError>;

    // ---- lessons and videos ------------------------------------------------

    /// Appends a lesson to the course with its first video
    async fn create_lesson(&self, new: NewLesson, video: NewVideo) -> Result<LessonWithVideos, DatabaseError>;

    /// Lessons in course order, each with its videos in order
    async fn list_lessons(&self, course_id: Uuid) -> Result<Vec<LessonWithVideos>, DatabaseError>;

    /// `None` unless the lesson exists and belongs to `course_id`
    async fn find_lesson(&self, course_id: Uuid, lesson_id: Uuid) -> Result<Option<LessonWithVideos>, DatabaseError>;

    async fn add_video(&self, lesson_id: Uuid, video: NewVideo) -> Result<Video, DatabaseError>;

    async fn update_lesson(&self, lesson_id: Uuid, update: LessonUpdate) -> Result<Lesson, DatabaseError>;

    async fn delete_lesson(&self, lesson_id: Uuid) -> Result<(), DatabaseError>;

    /// Returns the removed video; `NotFound` unless it belongs to `lesson_id`
    async fn delete_video(&self, lesson_id: Uuid, video_id: Uuid) -> Result<Video, DatabaseError>;

    // ---- enrollments, likes, dashboards -----------------------------------

    /// Deletes the relation when present, inserts it otherwise, and moves the
    /// course counter accordingly. No application lock is taken: two
    /// concurrent toggles by the same user resolve however the store
    /// serializes them.
    async fn toggle_relation(&self, relation: Relation, course_id: Uuid, user_id: Uuid) -> Result<Toggle, DatabaseError>;

    async fn enrolled_courses(&self, student_id: Uuid) -> Result<Vec<Course>, DatabaseError>;

    /// Courses ranked by enrollment count, descending; ties go to the
    /// earlier-created course. Courses without an educator are skipped.
    async fn popular_courses(&self, limit: i64) -> Result<Vec<PopularCourse>, DatabaseError>;
}
