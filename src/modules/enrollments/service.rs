use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::enrollments::model::{Enrollment, RosterEntry, StudentEnrollment};
use crate::modules::users::model::UserRole;
use crate::utils::errors::AppError;

pub struct EnrollmentService;

impl EnrollmentService {
    #[instrument(skip(db))]
    pub async fn enroll(
        db: &PgPool,
        class_id: Uuid,
        student_id: Uuid,
    ) -> Result<Enrollment, AppError> {
        let is_student = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND role = $2)",
        )
        .bind(student_id)
        .bind(UserRole::Student)
        .fetch_one(db)
        .await?;

        if !is_student {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Only students can be enrolled in a class"
            )));
        }

        // Lock the class row so concurrent enrollments can't both pass the
        // capacity check.
        let mut tx = db.begin().await?;

        let capacity = sqlx::query_scalar::<_, i32>(
            "SELECT capacity FROM classes WHERE id = $1 FOR UPDATE",
        )
        .bind(class_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Class not found")))?;

        let enrolled = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM enrollments WHERE class_id = $1",
        )
        .bind(class_id)
        .fetch_one(&mut *tx)
        .await?;

        if enrolled >= capacity as i64 {
            return Err(AppError::conflict(anyhow::anyhow!("Class is full")));
        }

        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"INSERT INTO enrollments (class_id, student_id)
               VALUES ($1, $2)
               RETURNING id, class_id, student_id, enrolled_at"#,
        )
        .bind(class_id)
        .bind(student_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::conflict(anyhow::anyhow!(
                    "Student is already enrolled in this class"
                ));
            }
            AppError::from(e)
        })?;

        tx.commit().await?;

        Ok(enrollment)
    }

    #[instrument(skip(db))]
    pub async fn get(db: &PgPool, id: Uuid) -> Result<Enrollment, AppError> {
        sqlx::query_as::<_, Enrollment>(
            "SELECT id, class_id, student_id, enrolled_at FROM enrollments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Enrollment not found")))
    }

    #[instrument(skip(db))]
    pub async fn drop(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM enrollments WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Enrollment not found")));
        }

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn roster(db: &PgPool, class_id: Uuid) -> Result<Vec<RosterEntry>, AppError> {
        let class_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM classes WHERE id = $1)")
                .bind(class_id)
                .fetch_one(db)
                .await?;

        if !class_exists {
            return Err(AppError::not_found(anyhow::anyhow!("Class not found")));
        }

        let roster = sqlx::query_as::<_, RosterEntry>(
            r#"SELECT e.id, e.student_id, u.first_name, u.last_name, u.email, e.enrolled_at
               FROM enrollments e
               INNER JOIN users u ON u.id = e.student_id
               WHERE e.class_id = $1
               ORDER BY u.last_name, u.first_name"#,
        )
        .bind(class_id)
        .fetch_all(db)
        .await?;

        Ok(roster)
    }

    #[instrument(skip(db))]
    pub async fn for_student(
        db: &PgPool,
        student_id: Uuid,
    ) -> Result<Vec<StudentEnrollment>, AppError> {
        let enrollments = sqlx::query_as::<_, StudentEnrollment>(
            r#"SELECT e.id, e.class_id, c.name AS class_name, e.enrolled_at
               FROM enrollments e
               INNER JOIN classes c ON c.id = e.class_id
               WHERE e.student_id = $1
               ORDER BY e.enrolled_at DESC"#,
        )
        .bind(student_id)
        .fetch_all(db)
        .await?;

        Ok(enrollments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::classes::model::CreateClassDto;
    use crate::modules::classes::service::ClassService;
    use crate::modules::departments::model::CreateDepartmentDto;
    use crate::modules::departments::service::DepartmentService;
    use crate::modules::subjects::model::CreateSubjectDto;
    use crate::modules::subjects::service::SubjectService;
    use axum::http::StatusCode;

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

    async fn seed_class(pool: &PgPool, capacity: i32) -> Uuid {
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

        let subject = SubjectService::create(
            pool,
            CreateSubjectDto {
                department_id: department.id,
                code: format!("SUB-{}", &Uuid::new_v4().to_string()[..8]),
                name: "Chemistry".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();

        let teacher_id = seed_user(pool, UserRole::Teacher).await;

        ClassService::create(
            pool,
            CreateClassDto {
                subject_id: subject.id,
                teacher_id,
                name: "Chemistry 101".to_string(),
                capacity: Some(capacity),
            },
        )
        .await
        .unwrap()
        .id
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_enroll_and_roster(pool: PgPool) {
        let class_id = seed_class(&pool, 10).await;
        let student_id = seed_user(&pool, UserRole::Student).await;

        let enrollment = EnrollmentService::enroll(&pool, class_id, student_id)
            .await
            .unwrap();
        assert_eq!(enrollment.class_id, class_id);

        let roster = EnrollmentService::roster(&pool, class_id).await.unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].student_id, student_id);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_double_enrollment_conflicts(pool: PgPool) {
        let class_id = seed_class(&pool, 10).await;
        let student_id = seed_user(&pool, UserRole::Student).await;

        EnrollmentService::enroll(&pool, class_id, student_id)
            .await
            .unwrap();
        let err = EnrollmentService::enroll(&pool, class_id, student_id)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_capacity_enforced(pool: PgPool) {
        let class_id = seed_class(&pool, 1).await;
        let first = seed_user(&pool, UserRole::Student).await;
        let second = seed_user(&pool, UserRole::Student).await;

        EnrollmentService::enroll(&pool, class_id, first).await.unwrap();
        let err = EnrollmentService::enroll(&pool, class_id, second)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_teacher_cannot_be_enrolled(pool: PgPool) {
        let class_id = seed_class(&pool, 10).await;
        let teacher_id = seed_user(&pool, UserRole::Teacher).await;

        let err = EnrollmentService::enroll(&pool, class_id, teacher_id)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_drop_enrollment(pool: PgPool) {
        let class_id = seed_class(&pool, 10).await;
        let student_id = seed_user(&pool, UserRole::Student).await;

        let enrollment = EnrollmentService::enroll(&pool, class_id, student_id)
            .await
            .unwrap();
        EnrollmentService::drop(&pool, enrollment.id).await.unwrap();

        let enrollments = EnrollmentService::for_student(&pool, student_id)
            .await
            .unwrap();
        assert!(enrollments.is_empty());
    }
}
