use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::classes::model::{
    Class, ClassFilterParams, CreateClassDto, PaginatedClassesResponse, UpdateClassDto,
};
use crate::modules::users::model::UserRole;
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;

const COLUMNS: &str = "id, subject_id, teacher_id, name, capacity, created_at, updated_at";

pub struct ClassService;

impl ClassService {
    /// The teacher of record must actually hold the teacher role; the
    /// foreign key alone only guarantees the user exists.
    async fn assert_is_teacher(db: &PgPool, user_id: Uuid) -> Result<(), AppError> {
        let is_teacher = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND role = $2)",
        )
        .bind(user_id)
        .bind(UserRole::Teacher)
        .fetch_one(db)
        .await?;

        if !is_teacher {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "teacher_id does not reference a teacher"
            )));
        }

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn create(db: &PgPool, dto: CreateClassDto) -> Result<Class, AppError> {
        Self::assert_is_teacher(db, dto.teacher_id).await?;

        let class = sqlx::query_as::<_, Class>(&format!(
            r#"INSERT INTO classes (subject_id, teacher_id, name, capacity)
               VALUES ($1, $2, $3, $4)
               RETURNING {COLUMNS}"#,
        ))
        .bind(dto.subject_id)
        .bind(dto.teacher_id)
        .bind(&dto.name)
        .bind(dto.capacity.unwrap_or(30))
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_foreign_key_violation()
            {
                return AppError::bad_request(anyhow::anyhow!("Subject does not exist"));
            }
            AppError::from(e)
        })?;

        Ok(class)
    }

    #[instrument(skip(db))]
    pub async fn list(
        db: &PgPool,
        filters: ClassFilterParams,
    ) -> Result<PaginatedClassesResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let total = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM classes
               WHERE ($1::uuid IS NULL OR subject_id = $1)
                 AND ($2::uuid IS NULL OR teacher_id = $2)"#,
        )
        .bind(filters.subject_id)
        .bind(filters.teacher_id)
        .fetch_one(db)
        .await?;

        let classes = sqlx::query_as::<_, Class>(&format!(
            r#"SELECT {COLUMNS} FROM classes
               WHERE ($1::uuid IS NULL OR subject_id = $1)
                 AND ($2::uuid IS NULL OR teacher_id = $2)
               ORDER BY name
               LIMIT $3 OFFSET $4"#,
        ))
        .bind(filters.subject_id)
        .bind(filters.teacher_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;

        Ok(PaginatedClassesResponse {
            data: classes,
            meta: PaginationMeta {
                total,
                limit,
                offset,
                has_more: offset + limit < total,
            },
        })
    }

    #[instrument(skip(db))]
    pub async fn get(db: &PgPool, id: Uuid) -> Result<Class, AppError> {
        sqlx::query_as::<_, Class>(&format!("SELECT {COLUMNS} FROM classes WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Class not found")))
    }

    #[instrument(skip(db))]
    pub async fn update(db: &PgPool, id: Uuid, dto: UpdateClassDto) -> Result<Class, AppError> {
        let existing = Self::get(db, id).await?;

        if let Some(teacher_id) = dto.teacher_id
            && teacher_id != existing.teacher_id
        {
            Self::assert_is_teacher(db, teacher_id).await?;
        }

        let teacher_id = dto.teacher_id.unwrap_or(existing.teacher_id);
        let name = dto.name.unwrap_or(existing.name);
        let capacity = dto.capacity.unwrap_or(existing.capacity);

        let class = sqlx::query_as::<_, Class>(&format!(
            r#"UPDATE classes
               SET teacher_id = $1, name = $2, capacity = $3, updated_at = NOW()
               WHERE id = $4
               RETURNING {COLUMNS}"#,
        ))
        .bind(teacher_id)
        .bind(&name)
        .bind(capacity)
        .bind(id)
        .fetch_one(db)
        .await?;

        Ok(class)
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Class not found")));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::departments::model::CreateDepartmentDto;
    use crate::modules::departments::service::DepartmentService;
    use crate::modules::subjects::model::CreateSubjectDto;
    use crate::modules::subjects::service::SubjectService;
    use axum::http::StatusCode;

    async fn seed_subject(pool: &PgPool) -> Uuid {
        let department = DepartmentService::create(
            pool,
            CreateDepartmentDto {
                code: format!("DEP-{}", &Uuid::new_v4().to_string()[..8]),
                name: "Sciences".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();

        SubjectService::create(
            pool,
            CreateSubjectDto {
                department_id: department.id,
                code: format!("SUB-{}", &Uuid::new_v4().to_string()[..8]),
                name: "Physics".to_string(),
                description: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    async fn seed_user(pool: &PgPool, role: UserRole) -> Uuid {
        sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO users (first_name, last_name, email, password, role)
               VALUES ('Test', 'User', $1, 'hashed', $2) RETURNING id"#,
        )
        .bind(format!("user-{}@test.com", Uuid::new_v4()))
        .bind(role)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_class(pool: PgPool) {
        let subject_id = seed_subject(&pool).await;
        let teacher_id = seed_user(&pool, UserRole::Teacher).await;

        let class = ClassService::create(
            &pool,
            CreateClassDto {
                subject_id,
                teacher_id,
                name: "Physics 101".to_string(),
                capacity: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(class.capacity, 30);
        assert_eq!(class.teacher_id, teacher_id);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_class_rejects_non_teacher(pool: PgPool) {
        let subject_id = seed_subject(&pool).await;
        let student_id = seed_user(&pool, UserRole::Student).await;

        let err = ClassService::create(
            &pool,
            CreateClassDto {
                subject_id,
                teacher_id: student_id,
                name: "Physics 101".to_string(),
                capacity: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_list_by_teacher(pool: PgPool) {
        let subject_id = seed_subject(&pool).await;
        let teacher_a = seed_user(&pool, UserRole::Teacher).await;
        let teacher_b = seed_user(&pool, UserRole::Teacher).await;

        for (teacher_id, name) in [(teacher_a, "Morning"), (teacher_b, "Afternoon")] {
            ClassService::create(
                &pool,
                CreateClassDto {
                    subject_id,
                    teacher_id,
                    name: name.to_string(),
                    capacity: Some(25),
                },
            )
            .await
            .unwrap();
        }

        let response = ClassService::list(
            &pool,
            ClassFilterParams {
                subject_id: None,
                teacher_id: Some(teacher_a),
                pagination: Default::default(),
            },
        )
        .await
        .unwrap();

        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].name, "Morning");
    }
}
