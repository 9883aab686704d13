use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::departments::model::{
    CreateDepartmentDto, Department, DepartmentFilterParams, PaginatedDepartmentsResponse,
    UpdateDepartmentDto,
};
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;

const COLUMNS: &str = "id, code, name, description, created_at, updated_at";

pub struct DepartmentService;

impl DepartmentService {
    #[instrument(skip(db))]
    pub async fn create(db: &PgPool, dto: CreateDepartmentDto) -> Result<Department, AppError> {
        let department = sqlx::query_as::<_, Department>(&format!(
            r#"INSERT INTO departments (code, name, description)
               VALUES ($1, $2, $3)
               RETURNING {COLUMNS}"#,
        ))
        .bind(&dto.code)
        .bind(&dto.name)
        .bind(&dto.description)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::conflict(anyhow::anyhow!(
                    "A department with this code already exists"
                ));
            }
            AppError::from(e)
        })?;

        Ok(department)
    }

    #[instrument(skip(db))]
    pub async fn list(
        db: &PgPool,
        filters: DepartmentFilterParams,
    ) -> Result<PaginatedDepartmentsResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();
        let name_pattern = filters.name.map(|n| format!("%{n}%"));

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM departments WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(&name_pattern)
        .fetch_one(db)
        .await?;

        let departments = sqlx::query_as::<_, Department>(&format!(
            r#"SELECT {COLUMNS} FROM departments
               WHERE ($1::text IS NULL OR name ILIKE $1)
               ORDER BY code
               LIMIT $2 OFFSET $3"#,
        ))
        .bind(&name_pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;

        Ok(PaginatedDepartmentsResponse {
            data: departments,
            meta: PaginationMeta {
                total,
                limit,
                offset,
                has_more: offset + limit < total,
            },
        })
    }

    #[instrument(skip(db))]
    pub async fn get(db: &PgPool, id: Uuid) -> Result<Department, AppError> {
        sqlx::query_as::<_, Department>(&format!(
            "SELECT {COLUMNS} FROM departments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Department not found")))
    }

    #[instrument(skip(db))]
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        dto: UpdateDepartmentDto,
    ) -> Result<Department, AppError> {
        let existing = Self::get(db, id).await?;

        let code = dto.code.unwrap_or(existing.code);
        let name = dto.name.unwrap_or(existing.name);
        let description = dto.description.or(existing.description);

        let department = sqlx::query_as::<_, Department>(&format!(
            r#"UPDATE departments
               SET code = $1, name = $2, description = $3, updated_at = NOW()
               WHERE id = $4
               RETURNING {COLUMNS}"#,
        ))
        .bind(&code)
        .bind(&name)
        .bind(&description)
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::conflict(anyhow::anyhow!(
                    "A department with this code already exists"
                ));
            }
            AppError::from(e)
        })?;

        Ok(department)
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e
                    && db_err.is_foreign_key_violation()
                {
                    return AppError::conflict(anyhow::anyhow!(
                        "Department still has subjects and cannot be deleted"
                    ));
                }
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Department not found")));
        }

        Ok(())
    }
}
