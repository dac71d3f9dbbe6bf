pub mod course;
pub mod lesson;
pub mod relation;
pub mod user;

pub use course::{
    Course, CourseDetail, CourseFilter, CourseUpdate, CourseWithEducator, NewCourse, PopularCourse, MAX_TAGS,
};
pub use lesson::{Lesson, LessonUpdate, LessonWithVideos, NewLesson, NewVideo, Video};
pub use relation::{EducatorDashboard, Relation, StudentDashboard, Toggle};
pub use user::{EducatorSummary, NewUser, User, UserImage};
