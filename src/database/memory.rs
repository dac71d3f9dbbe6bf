use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::*;
use super::store::Store;

#[derive(Debug, Clone)]
struct Membership {
    course_id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    courses: Vec<Course>,
    lessons: Vec<Lesson>,
    videos: Vec<Video>,
    enrollments: Vec<Membership>,
    likes: Vec<Membership>,
}

impl Tables {
    fn relation(&mut self, relation: Relation) -> &mut Vec<Membership> {
        match relation {
            Relation::Enrollment => &mut self.enrollments,
            Relation::Like => &mut self.likes,
        }
    }

    fn user_mut(&mut self, id: Uuid) -> Result<&mut User, DatabaseError> {
        self.users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))
    }

    fn course_mut(&mut self, id: Uuid) -> Result<&mut Course, DatabaseError> {
        self.courses
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DatabaseError::NotFound("Course not found".to_string()))
    }

    fn educator(&self, id: Option<Uuid>) -> Option<EducatorSummary> {
        let id = id?;
        self.users.iter().find(|u| u.id == id).map(EducatorSummary::from)
    }

    fn lessons_of(&self, course_id: Uuid) -> Vec<LessonWithVideos> {
        let mut lessons: Vec<&Lesson> = self.lessons.iter().filter(|l| l.course_id == course_id).collect();
        lessons.sort_by_key(|l| (l.position, l.created_at));
        lessons.into_iter().map(|l| self.with_videos(l)).collect()
    }

    fn with_videos(&self, lesson: &Lesson) -> LessonWithVideos {
        let mut videos: Vec<Video> = self.videos.iter().filter(|v| v.lesson_id == lesson.id).cloned().collect();
        videos.sort_by_key(|v| (v.position, v.created_at));
        LessonWithVideos {
            lesson: lesson.clone(),
            videos,
        }
    }

    fn course_name_taken(&self, name: &str, except: Option<Uuid>) -> bool {
        self.courses
            .iter()
            .any(|c| c.course_name == name && Some(c.id) != except)
    }

    fn shift_counter(&mut self, relation: Relation, course_id: Uuid, delta: i64) {
        if let Some(course) = self.courses.iter_mut().find(|c| c.id == course_id) {
            let counter = match relation {
                Relation::Enrollment => &mut course.enrollments,
                Relation::Like => &mut course.likes,
            };
            *counter = (*counter + delta).max(0);
        }
    }
}

fn check_course_fields(price: f64, tags: &[String]) -> Result<(), DatabaseError> {
    if price < 0.0 {
        return Err(DatabaseError::ConstraintViolation("price must not be negative".to_string()));
    }
    if tags.len() > MAX_TAGS {
        return Err(DatabaseError::ConstraintViolation(format!("at most {MAX_TAGS} tags are allowed")));
    }
    Ok(())
}

/// Process-local store for development and tests. Enforces the same
/// uniqueness, cascade and counter rules as the PostgreSQL schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn create_user(&self, new: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == new.email) {
            return Err(DatabaseError::Conflict("User with this email already exists".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            fullname: None,
            bio: None,
            profile_image: None,
            cover_image: None,
            password: new.password_hash,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.clone())
    }

    async fn update_profile(&self, id: Uuid, fullname: &str, bio: &str) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        let user = tables.user_mut(id)?;
        user.fullname = Some(fullname.to_string());
        user.bio = Some(bio.to_string());
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_user_image(&self, id: Uuid, image: UserImage, url: &str) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        let user = tables.user_mut(id)?;
        match image {
            UserImage::Profile => user.profile_image = Some(url.to_string()),
            UserImage::Cover => user.cover_image = Some(url.to_string()),
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        let user = tables.user_mut(id)?;
        user.password = password_hash.to_string();
        user.refresh_token_hash = None;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn set_refresh_token_hash(&self, id: Uuid, hash: Option<&str>) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if let Ok(user) = tables.user_mut(id) {
            user.refresh_token_hash = hash.map(str::to_string);
        }
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(index) = tables.users.iter().position(|u| u.id == id) else {
            return Err(DatabaseError::NotFound("User not found".to_string()));
        };
        tables.users.remove(index);

        for relation in [Relation::Enrollment, Relation::Like] {
            let (dropped, kept): (Vec<Membership>, Vec<Membership>) =
                tables.relation(relation).drain(..).partition(|m| m.user_id == id);
            *tables.relation(relation) = kept;
            for membership in dropped {
                tables.shift_counter(relation, membership.course_id, -1);
            }
        }

        for course in tables.courses.iter_mut().filter(|c| c.educator_id == Some(id)) {
            course.educator_id = None;
        }
        Ok(())
    }

    async fn create_course(&self, new: NewCourse) -> Result<Course, DatabaseError> {
        let mut tables = self.tables.write().await;
        check_course_fields(new.price, &new.tags)?;
        if tables.course_name_taken(&new.course_name, None) {
            return Err(DatabaseError::Conflict("A course with this name already exists".to_string()));
        }
        if !tables.users.iter().any(|u| u.id == new.educator_id) {
            return Err(DatabaseError::NotFound("Referenced record not found".to_string()));
        }

        let now = Utc::now();
        let course = Course {
            id: Uuid::new_v4(),
            course_name: new.course_name,
            title: new.title,
            description: new.description,
            duration: new.duration,
            price: new.price,
            thumbnail: new.thumbnail,
            category: new.category,
            educator_id: Some(new.educator_id),
            tags: new.tags,
            likes: 0,
            enrollments: 0,
            created_at: now,
            updated_at: now,
        };
        tables.courses.push(course.clone());
        Ok(course)
    }

    async fn find_course(&self, id: Uuid) -> Result<Option<Course>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.courses.iter().find(|c| c.id == id).cloned())
    }

    async fn update_course(&self, id: Uuid, update: CourseUpdate) -> Result<Course, DatabaseError> {
        let mut tables = self.tables.write().await;
        if let Some(name) = &update.course_name {
            if tables.course_name_taken(name, Some(id)) {
                return Err(DatabaseError::Conflict("A course with this name already exists".to_string()));
            }
        }

        let course = tables.course_mut(id)?;
        check_course_fields(
            update.price.unwrap_or(course.price),
            update.tags.as_deref().unwrap_or(&course.tags[..]),
        )?;

        if let Some(v) = update.course_name {
            course.course_name = v;
        }
        if let Some(v) = update.title {
            course.title = v;
        }
        if let Some(v) = update.description {
            course.description = v;
        }
        if let Some(v) = update.duration {
            course.duration = Some(v);
        }
        if let Some(v) = update.price {
            course.price = v;
        }
        if let Some(v) = update.category {
            course.category = v;
        }
        if let Some(v) = update.tags {
            course.tags = v;
        }
        course.updated_at = Utc::now();
        Ok(course.clone())
    }

    async fn set_course_thumbnail(&self, id: Uuid, url: &str) -> Result<Course, DatabaseError> {
        let mut tables = self.tables.write().await;
        let course = tables.course_mut(id)?;
        course.thumbnail = Some(url.to_string());
        course.updated_at = Utc::now();
        Ok(course.clone())
    }

    async fn list_courses(&self, filter: CourseFilter) -> Result<Vec<CourseWithEducator>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut courses: Vec<&Course> = tables.courses.iter().filter(|c| filter.matches(c)).collect();
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(courses
            .into_iter()
            .map(|course| CourseWithEducator {
                educator: tables.educator(course.educator_id),
                course: course.clone(),
            })
            .collect())
    }

    async fn course_detail(&self, id: Uuid) -> Result<Option<CourseDetail>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.courses.iter().find(|c| c.id == id).map(|course| CourseDetail {
            educator: tables.educator(course.educator_id),
            lessons: tables.lessons_of(course.id),
            course: course.clone(),
        }))
    }

    async fn courses_by_educator(&self, educator_id: Uuid) -> Result<Vec<Course>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut courses: Vec<Course> = tables
            .courses
            .iter()
            .filter(|c| c.educator_id == Some(educator_id))
            .cloned()
            .collect();
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(courses)
    }

    async fn create_lesson(&self, new: NewLesson, video: NewVideo) -> Result<LessonWithVideos, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.courses.iter().any(|c| c.id == new.course_id) {
            return Err(DatabaseError::NotFound("Referenced record not found".to_string()));
        }

        let position = tables
            .lessons
            .iter()
            .filter(|l| l.course_id == new.course_id)
            .map(|l| l.position + 1)
            .max()
            .unwrap_or(0);

        let now = Utc::now();
        let lesson = Lesson {
            id: Uuid::new_v4(),
            course_id: new.course_id,
            title: new.title,
            details: new.details,
            position,
            created_at: now,
            updated_at: now,
        };
        let video = Video {
            id: Uuid::new_v4(),
            lesson_id: lesson.id,
            title: video.title,
            url: video.url,
            position: 0,
            created_at: now,
        };

        tables.lessons.push(lesson.clone());
        tables.videos.push(video.clone());
        Ok(LessonWithVideos {
            lesson,
            videos: vec![video],
        })
    }

    async fn list_lessons(&self, course_id: Uuid) -> Result<Vec<LessonWithVideos>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.lessons_of(course_id))
    }

    async fn find_lesson(&self, course_id: Uuid, lesson_id: Uuid) -> Result<Option<LessonWithVideos>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .lessons
            .iter()
            .find(|l| l.id == lesson_id && l.course_id == course_id)
            .map(|l| tables.with_videos(l)))
    }

    async fn add_video(&self, lesson_id: Uuid, video: NewVideo) -> Result<Video, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.lessons.iter().any(|l| l.id == lesson_id) {
            return Err(DatabaseError::NotFound("Referenced record not found".to_string()));
        }

        let position = tables
            .videos
            .iter()
            .filter(|v| v.lesson_id == lesson_id)
            .map(|v| v.position + 1)
            .max()
            .unwrap_or(0);

        let video = Video {
            id: Uuid::new_v4(),
            lesson_id,
            title: video.title,
            url: video.url,
            position,
            created_at: Utc::now(),
        };
        tables.videos.push(video.clone());
        Ok(video)
    }

    async fn update_lesson(&self, lesson_id: Uuid, update: LessonUpdate) -> Result<Lesson, DatabaseError> {
        let mut tables = self.tables.write().await;
        let lesson = tables
            .lessons
            .iter_mut()
            .find(|l| l.id == lesson_id)
            .ok_or_else(|| DatabaseError::NotFound("Lesson not found".to_string()))?;

        if let Some(title) = update.title {
            lesson.title = title;
        }
        if let Some(details) = update.details {
            lesson.details = details;
        }
        lesson.updated_at = Utc::now();
        Ok(lesson.clone())
    }

    async fn delete_lesson(&self, lesson_id: Uuid) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        let before = tables.lessons.len();
        tables.lessons.retain(|l| l.id != lesson_id);
        if tables.lessons.len() == before {
            return Err(DatabaseError::NotFound("Lesson not found".to_string()));
        }
        tables.videos.retain(|v| v.lesson_id != lesson_id);
        Ok(())
    }

    async fn delete_video(&self, lesson_id: Uuid, video_id: Uuid) -> Result<Video, DatabaseError> {
        let mut tables = self.tables.write().await;
        let index = tables
            .videos
            .iter()
            .position(|v| v.id == video_id && v.lesson_id == lesson_id)
            .ok_or_else(|| DatabaseError::NotFound("Video not found".to_string()))?;
        Ok(tables.videos.remove(index))
    }

    async fn toggle_relation(&self, relation: Relation, course_id: Uuid, user_id: Uuid) -> Result<Toggle, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.courses.iter().any(|c| c.id == course_id) {
            return Err(DatabaseError::NotFound("Referenced record not found".to_string()));
        }

        let rows = tables.relation(relation);
        let outcome = match rows.iter().position(|m| m.course_id == course_id && m.user_id == user_id) {
            Some(index) => {
                rows.remove(index);
                Toggle::Off
            }
            None => {
                rows.push(Membership {
                    course_id,
                    user_id,
                    created_at: Utc::now(),
                });
                Toggle::On
            }
        };

        let delta = if outcome.is_on() { 1 } else { -1 };
        tables.shift_counter(relation, course_id, delta);
        Ok(outcome)
    }

    async fn enrolled_courses(&self, student_id: Uuid) -> Result<Vec<Course>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut memberships: Vec<&Membership> = tables
            .enrollments
            .iter()
            .filter(|m| m.user_id == student_id)
            .collect();
        memberships.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(memberships
            .into_iter()
            .filter_map(|m| tables.courses.iter().find(|c| c.id == m.course_id).cloned())
            .collect())
    }

    async fn popular_courses(&self, limit: i64) -> Result<Vec<PopularCourse>, DatabaseError> {
        let tables = self.tables.read().await;

        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for membership in &tables.enrollments {
            *counts.entry(membership.course_id).or_default() += 1;
        }

        let mut ranked: Vec<(&Course, EducatorSummary, i64)> = tables
            .courses
            .iter()
            .filter_map(|course| {
                let total = *counts.get(&course.id)?;
                let educator = tables.educator(course.educator_id)?;
                Some((course, educator, total))
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.2.cmp(&a.2)
                .then_with(|| a.0.created_at.cmp(&b.0.created_at))
                .then_with(|| a.0.id.cmp(&b.0.id))
        });

        Ok(ranked
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|(course, educator, total)| PopularCourse {
                course_id: course.id,
                course_name: course.course_name.clone(),
                title: course.title.clone(),
                description: course.description.clone(),
                price: course.price,
                thumbnail: course.thumbnail.clone(),
                category: course.category.clone(),
                total_enrollments: total,
                educator,
            })
            .collect())
    }
}
