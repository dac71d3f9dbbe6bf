use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::*;
use super::store::Store;

const USER_COLUMNS: &str = "id, username, email, fullname, bio, profile_image, cover_image, \
     password, refresh_token_hash, created_at, updated_at";

const COURSE_COLUMNS: &str = "id, course_name, title, description, duration, price, thumbnail, \
     category, educator_id, tags, likes, enrollments, created_at, updated_at";

const LESSON_COLUMNS: &str = "id, course_id, title, details, position, created_at, updated_at";

const VIDEO_COLUMNS: &str = "id, lesson_id, title, url, position, created_at";

/// PostgreSQL-backed store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn educators_by_id(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, EducatorSummary>, DatabaseError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, EducatorSummary>(
            "SELECT id, username, profile_image FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|e| (e.id, e)).collect())
    }

    async fn videos_for(&self, lesson_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Video>>, DatabaseError> {
        let mut grouped: HashMap<Uuid, Vec<Video>> = HashMap::new();
        if lesson_ids.is_empty() {
            return Ok(grouped);
        }

        let videos = sqlx::query_as::<_, Video>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE lesson_id = ANY($1) ORDER BY position, created_at"
        ))
        .bind(lesson_ids)
        .fetch_all(&self.pool)
        .await?;

        for video in videos {
            grouped.entry(video.lesson_id).or_default().push(video);
        }
        Ok(grouped)
    }

    async fn attach_videos(&self, lessons: Vec<Lesson>) -> Result<Vec<LessonWithVideos>, DatabaseError> {
        let ids: Vec<Uuid> = lessons.iter().map(|l| l.id).collect();
        let mut videos = self.videos_for(&ids).await?;

        Ok(lessons
            .into_iter()
            .map(|lesson| LessonWithVideos {
                videos: videos.remove(&lesson.id).unwrap_or_default(),
                lesson,
            })
            .collect())
    }
}

#[derive(FromRow)]
struct PopularRow {
    course_id: Uuid,
    course_name: String,
    title: String,
    description: String,
    price: f64,
    thumbnail: Option<String>,
    category: String,
    total_enrollments: i64,
    educator_id: Uuid,
    educator_username: String,
    educator_profile_image: Option<String>,
}

impl From<PopularRow> for PopularCourse {
    fn from(row: PopularRow) -> Self {
        Self {
            course_id: row.course_id,
            course_name: row.course_name,
            title: row.title,
            description: row.description,
            price: row.price,
            thumbnail: row.thumbnail,
            category: row.category,
            total_enrollments: row.total_enrollments,
            educator: EducatorSummary {
                id: row.educator_id,
                username: row.educator_username,
                profile_image: row.educator_profile_image,
            },
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn create_user(&self, new: NewUser) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, username, email, password) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "User with this email already exists"))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let users = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at"))
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn update_profile(&self, id: Uuid, fullname: &str, bio: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET fullname = $2, bio = $3, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(fullname)
        .bind(bio)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))
    }

    async fn set_user_image(&self, id: Uuid, image: UserImage, url: &str) -> Result<User, DatabaseError> {
        // column name comes from a closed enum, never from input
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET {} = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}",
            image.column()
        ))
        .bind(id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE users SET password = $2, refresh_token_hash = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    async fn set_refresh_token_hash(&self, id: Uuid, hash: Option<&str>) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET refresh_token_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        for relation in [Relation::Enrollment, Relation::Like] {
            sqlx::query(&format!(
                "UPDATE courses SET {counter} = GREATEST({counter} - 1, 0) \
                 WHERE id IN (SELECT course_id FROM {table} WHERE {user} = $1)",
                counter = relation.counter_column(),
                table = relation.table(),
                user = relation.user_column(),
            ))
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("User not found".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn create_course(&self, new: NewCourse) -> Result<Course, DatabaseError> {
        sqlx::query_as::<_, Course>(&format!(
            "INSERT INTO courses (id, course_name, title, description, duration, price, category, tags, thumbnail, educator_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {COURSE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new.course_name)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.duration)
        .bind(new.price)
        .bind(&new.category)
        .bind(&new.tags)
        .bind(&new.thumbnail)
        .bind(new.educator_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "A course with this name already exists"))
    }

    async fn find_course(&self, id: Uuid) -> Result<Option<Course>, DatabaseError> {
        let course = sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(course)
    }

    async fn update_course(&self, id: Uuid, update: CourseUpdate) -> Result<Course, DatabaseError> {
        sqlx::query_as::<_, Course>(&format!(
            "UPDATE courses SET \
                course_name = COALESCE($2, course_name), \
                title = COALESCE($3, title), \
                description = COALESCE($4, description), \
                duration = COALESCE($5, duration), \
                price = COALESCE($6, price), \
                category = COALESCE($7, category), \
                tags = COALESCE($8, tags), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {COURSE_COLUMNS}"
        ))
        .bind(id)
        .bind(&update.course_name)
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.duration)
        .bind(update.price)
        .bind(&update.category)
        .bind(&update.tags)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "A course with this name already exists"))?
        .ok_or_else(|| DatabaseError::NotFound("Course not found".to_string()))
    }

    async fn set_course_thumbnail(&self, id: Uuid, url: &str) -> Result<Course, DatabaseError> {
        sqlx::query_as::<_, Course>(&format!(
            "UPDATE courses SET thumbnail = $2, updated_at = NOW() WHERE id = $1 RETURNING {COURSE_COLUMNS}"
        ))
        .bind(id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Course not found".to_string()))
    }

    async fn list_courses(&self, filter: CourseFilter) -> Result<Vec<CourseWithEducator>, DatabaseError> {
        let courses = match &filter {
            CourseFilter::All => {
                sqlx::query_as::<_, Course>(&format!(
                    "SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at DESC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
            CourseFilter::Category(category) => {
                sqlx::query_as::<_, Course>(&format!(
                    "SELECT {COURSE_COLUMNS} FROM courses WHERE category = $1 ORDER BY created_at DESC"
                ))
                .bind(category)
                .fetch_all(&self.pool)
                .await?
            }
            CourseFilter::Free => {
                sqlx::query_as::<_, Course>(&format!(
                    "SELECT {COURSE_COLUMNS} FROM courses WHERE price = 0 ORDER BY created_at DESC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        let educator_ids: Vec<Uuid> = courses.iter().filter_map(|c| c.educator_id).collect();
        let educators = self.educators_by_id(&educator_ids).await?;

        Ok(courses
            .into_iter()
            .map(|course| CourseWithEducator {
                educator: course.educator_id.and_then(|id| educators.get(&id).cloned()),
                course,
            })
            .collect())
    }

    async fn course_detail(&self, id: Uuid) -> Result<Option<CourseDetail>, DatabaseError> {
        let Some(course) = self.find_course(id).await? else {
            return Ok(None);
        };

        let educator = match course.educator_id {
            Some(educator_id) => self.educators_by_id(&[educator_id]).await?.remove(&educator_id),
            None => None,
        };
        let lessons = self.list_lessons(course.id).await?;

        Ok(Some(CourseDetail {
            course,
            educator,
            lessons,
        }))
    }

    async fn courses_by_educator(&self, educator_id: Uuid) -> Result<Vec<Course>, DatabaseError> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE educator_id = $1 ORDER BY created_at DESC"
        ))
        .bind(educator_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(courses)
    }

    async fn create_lesson(&self, new: NewLesson, video: NewVideo) -> Result<LessonWithVideos, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let lesson = sqlx::query_as::<_, Lesson>(&format!(
            "INSERT INTO lessons (id, course_id, title, details, position) \
             VALUES ($1, $2, $3, $4, (SELECT COALESCE(MAX(position), -1) + 1 FROM lessons WHERE course_id = $2)) \
             RETURNING {LESSON_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.course_id)
        .bind(&new.title)
        .bind(&new.details)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_write(e, "Lesson already exists"))?;

        let video = sqlx::query_as::<_, Video>(&format!(
            "INSERT INTO videos (id, lesson_id, title, url, position) VALUES ($1, $2, $3, $4, 0) RETURNING {VIDEO_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(lesson.id)
        .bind(&video.title)
        .bind(&video.url)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(LessonWithVideos {
            lesson,
            videos: vec![video],
        })
    }

    async fn list_lessons(&self, course_id: Uuid) -> Result<Vec<LessonWithVideos>, DatabaseError> {
        let lessons = sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE course_id = $1 ORDER BY position, created_at"
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        self.attach_videos(lessons).await
    }

    async fn find_lesson(&self, course_id: Uuid, lesson_id: Uuid) -> Result<Option<LessonWithVideos>, DatabaseError> {
        let lesson = sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE id = $1 AND course_id = $2"
        ))
        .bind(lesson_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        match lesson {
            Some(lesson) => Ok(self.attach_videos(vec![lesson]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn add_video(&self, lesson_id: Uuid, video: NewVideo) -> Result<Video, DatabaseError> {
        sqlx::query_as::<_, Video>(&format!(
            "INSERT INTO videos (id, lesson_id, title, url, position) \
             VALUES ($1, $2, $3, $4, (SELECT COALESCE(MAX(position), -1) + 1 FROM videos WHERE lesson_id = $2)) \
             RETURNING {VIDEO_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(lesson_id)
        .bind(&video.title)
        .bind(&video.url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "Video already exists"))
    }

    async fn update_lesson(&self, lesson_id: Uuid, update: LessonUpdate) -> Result<Lesson, DatabaseError> {
        sqlx::query_as::<_, Lesson>(&format!(
            "UPDATE lessons SET title = COALESCE($2, title), details = COALESCE($3, details), updated_at = NOW() \
             WHERE id = $1 RETURNING {LESSON_COLUMNS}"
        ))
        .bind(lesson_id)
        .bind(&update.title)
        .bind(&update.details)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Lesson not found".to_string()))
    }

    async fn delete_lesson(&self, lesson_id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(lesson_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Lesson not found".to_string()));
        }
        Ok(())
    }

    async fn delete_video(&self, lesson_id: Uuid, video_id: Uuid) -> Result<Video, DatabaseError> {
        sqlx::query_as::<_, Video>(&format!(
            "DELETE FROM videos WHERE id = $1 AND lesson_id = $2 RETURNING {VIDEO_COLUMNS}"
        ))
        .bind(video_id)
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Video not found".to_string()))
    }

    async fn toggle_relation(&self, relation: Relation, course_id: Uuid, user_id: Uuid) -> Result<Toggle, DatabaseError> {
        let table = relation.table();
        let user_column = relation.user_column();
        let counter = relation.counter_column();

        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(&format!(
            "DELETE FROM {table} WHERE course_id = $1 AND {user_column} = $2"
        ))
        .bind(course_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let outcome = if removed > 0 {
            sqlx::query(&format!(
                "UPDATE courses SET {counter} = GREATEST({counter} - 1, 0) WHERE id = $1"
            ))
            .bind(course_id)
            .execute(&mut *tx)
            .await?;
            Toggle::Off
        } else {
            let inserted = sqlx::query(&format!(
                "INSERT INTO {table} (id, course_id, {user_column}) VALUES ($1, $2, $3) \
                 ON CONFLICT (course_id, {user_column}) DO NOTHING"
            ))
            .bind(Uuid::new_v4())
            .bind(course_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::from_write(e, "Relation already exists"))?
            .rows_affected();

            if inserted > 0 {
                sqlx::query(&format!("UPDATE courses SET {counter} = {counter} + 1 WHERE id = $1"))
                    .bind(course_id)
                    .execute(&mut *tx)
                    .await?;
            }
            Toggle::On
        };

        tx.commit().await?;
        Ok(outcome)
    }

    async fn enrolled_courses(&self, student_id: Uuid) -> Result<Vec<Course>, DatabaseError> {
        let courses = sqlx::query_as::<_, Course>(
            "SELECT c.id, c.course_name, c.title, c.description, c.duration, c.price, c.thumbnail, \
                    c.category, c.educator_id, c.tags, c.likes, c.enrollments, c.created_at, c.updated_at \
             FROM enrollments e JOIN courses c ON c.id = e.course_id \
             WHERE e.student_id = $1 ORDER BY e.created_at DESC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(courses)
    }

    async fn popular_courses(&self, limit: i64) -> Result<Vec<PopularCourse>, DatabaseError> {
        let rows = sqlx::query_as::<_, PopularRow>(
            "SELECT c.id AS course_id, c.course_name, c.title, c.description, c.price, c.thumbnail, c.category, \
                    COUNT(e.id) AS total_enrollments, \
                    u.id AS educator_id, u.username AS educator_username, u.profile_image AS educator_profile_image \
             FROM enrollments e \
             JOIN courses c ON c.id = e.course_id \
             JOIN users u ON u.id = c.educator_id \
             GROUP BY c.id, u.id \
             ORDER BY total_enrollments DESC, c.created_at ASC, c.id ASC \
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PopularCourse::from).collect())
    }
}
