use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::subjects::model::{
    CreateSubjectDto, PaginatedSubjectsResponse, Subject, SubjectFilterParams, UpdateSubjectDto,
};
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;

const COLUMNS: &str = "id, department_id, code, name, description, created_at, updated_at";

fn map_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::conflict(anyhow::anyhow!("A subject with this code already exists"));
        }
        if db_err.is_foreign_key_violation() {
            return AppError::bad_request(anyhow::anyhow!("Department does not exist"));
        }
    }
    AppError::from(e)
}

pub struct SubjectService;

impl SubjectService {
    #[instrument(skip(db))]
    pub async fn create(db: &PgPool, dto: CreateSubjectDto) -> Result<Subject, AppError> {
        let subject = sqlx::query_as::<_, Subject>(&format!(
            r#"INSERT INTO subjects (department_id, code, name, description)
               VALUES ($1, $2, $3, $4)
               RETURNING {COLUMNS}"#,
        ))
        .bind(dto.department_id)
        .bind(&dto.code)
        .bind(&dto.name)
        .bind(&dto.description)
        .fetch_one(db)
        .await
        .map_err(map_write_error)?;

        Ok(subject)
    }

    #[instrument(skip(db))]
    pub async fn list(
        db: &PgPool,
        filters: SubjectFilterParams,
    ) -> Result<PaginatedSubjectsResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();
        let name_pattern = filters.name.map(|n| format!("%{n}%"));

        let total = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM subjects
               WHERE ($1::uuid IS NULL OR department_id = $1)
                 AND ($2::text IS NULL OR name ILIKE $2)"#,
        )
        .bind(filters.department_id)
        .bind(&name_pattern)
        .fetch_one(db)
        .await?;

        let subjects = sqlx::query_as::<_, Subject>(&format!(
            r#"SELECT {COLUMNS} FROM subjects
               WHERE ($1::uuid IS NULL OR department_id = $1)
                 AND ($2::text IS NULL OR name ILIKE $2)
               ORDER BY code
               LIMIT $3 OFFSET $4"#,
        ))
        .bind(filters.department_id)
        .bind(&name_pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;

        Ok(PaginatedSubjectsResponse {
            data: subjects,
            meta: PaginationMeta {
                total,
                limit,
                offset,
                has_more: offset + limit < total,
            },
        })
    }

    #[instrument(skip(db))]
    pub async fn get(db: &PgPool, id: Uuid) -> Result<Subject, AppError> {
        sqlx::query_as::<_, Subject>(&format!("SELECT {COLUMNS} FROM subjects WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Subject not found")))
    }

    #[instrument(skip(db))]
    pub async fn update(db: &PgPool, id: Uuid, dto: UpdateSubjectDto) -> Result<Subject, AppError> {
        let existing = Self::get(db, id).await?;

        let department_id = dto.department_id.unwrap_or(existing.department_id);
        let code = dto.code.unwrap_or(existing.code);
        let name = dto.name.unwrap_or(existing.name);
        let description = dto.description.or(existing.description);

        let subject = sqlx::query_as::<_, Subject>(&format!(
            r#"UPDATE subjects
               SET department_id = $1, code = $2, name = $3, description = $4, updated_at = NOW()
               WHERE id = $5
               RETURNING {COLUMNS}"#,
        ))
        .bind(department_id)
        .bind(&code)
        .bind(&name)
        .bind(&description)
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(map_write_error)?;

        Ok(subject)
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e
                    && db_err.is_foreign_key_violation()
                {
                    return AppError::conflict(anyhow::anyhow!(
                        "Subject still has classes and cannot be deleted"
                    ));
                }
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Subject not found")));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::departments::model::CreateDepartmentDto;
    use crate::modules::departments::service::DepartmentService;
    use axum::http::StatusCode;

    async fn create_department(pool: &PgPool) -> Uuid {
        DepartmentService::create(
            pool,
            CreateDepartmentDto {
                code: format!("DEP-{}", &Uuid::new_v4().to_string()[..8]),
                name: "Test Department".to_string(),
                description: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    fn dto(department_id: Uuid, code: &str) -> CreateSubjectDto {
        CreateSubjectDto {
            department_id,
            code: code.to_string(),
            name: format!("Subject {code}"),
            description: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_and_list_by_department(pool: PgPool) {
        let department_id = create_department(&pool).await;
        let other_department_id = create_department(&pool).await;

        let code = format!("SUB-{}", &Uuid::new_v4().to_string()[..8]);
        SubjectService::create(&pool, dto(department_id, &code))
            .await
            .unwrap();
        SubjectService::create(
            &pool,
            dto(
                other_department_id,
                &format!("SUB-{}", &Uuid::new_v4().to_string()[..8]),
            ),
        )
        .await
        .unwrap();

        let filters = SubjectFilterParams {
            department_id: Some(department_id),
            name: None,
            pagination: Default::default(),
        };
        let response = SubjectService::list(&pool, filters).await.unwrap();
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].code, code);
        assert_eq!(response.meta.total, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_with_unknown_department_rejected(pool: PgPool) {
        let err = SubjectService::create(&pool, dto(Uuid::new_v4(), "GHOST-101"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_code_conflicts(pool: PgPool) {
        let department_id = create_department(&pool).await;
        let code = format!("SUB-{}", &Uuid::new_v4().to_string()[..8]);

        SubjectService::create(&pool, dto(department_id, &code))
            .await
            .unwrap();
        let err = SubjectService::create(&pool, dto(department_id, &code))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_pagination_has_more(pool: PgPool) {
        let department_id = create_department(&pool).await;
        for i in 0..5 {
            SubjectService::create(
                &pool,
                dto(
                    department_id,
                    &format!("PAG-{i}-{}", &Uuid::new_v4().to_string()[..8]),
                ),
            )
            .await
            .unwrap();
        }

        let filters = SubjectFilterParams {
            department_id: Some(department_id),
            name: None,
            pagination: crate::utils::pagination::PaginationParams {
                limit: Some(2),
                offset: Some(0),
            },
        };
        let response = SubjectService::list(&pool, filters).await.unwrap();
        assert_eq!(response.data.len(), 2);
        assert_eq!(response.meta.total, 5);
        assert!(response.meta.has_more);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_department_delete_restricted_by_subject(pool: PgPool) {
        let department_id = create_department(&pool).await;
        SubjectService::create(
            &pool,
            dto(
                department_id,
                &format!("KEEP-{}", &Uuid::new_v4().to_string()[..8]),
            ),
        )
        .await
        .unwrap();

        let err = DepartmentService::delete(&pool, department_id)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }
}
