use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::config::jwt::JwtConfig;
use crate::modules::auth::model::{LoginDto, LoginResponse, RegisterDto, UserCredentials};
use crate::modules::users::model::{User, UserRole};
use crate::utils::errors::AppError;
use crate::utils::jwt::create_access_token;
use crate::utils::password::{hash_password, verify_password};

const USER_COLUMNS: &str = "id, first_name, last_name, email, role, created_at, updated_at";

pub struct AuthService;

impl AuthService {
    /// Self-registration always creates a student account; other roles are
    /// provisioned by admins through the users module.
    #[instrument(skip(db, dto), fields(email = %dto.email))]
    pub async fn register(db: &PgPool, dto: RegisterDto) -> Result<User, AppError> {
        let hashed = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users (first_name, last_name, email, password, role)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {USER_COLUMNS}"#,
        ))
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(&dto.email)
        .bind(&hashed)
        .bind(UserRole::Student)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::conflict(anyhow::anyhow!(
                    "An account with this email already exists"
                ));
            }
            AppError::from(e)
        })?;

        Ok(user)
    }

    #[instrument(skip(db, jwt_config, dto), fields(email = %dto.email))]
    pub async fn login(
        db: &PgPool,
        jwt_config: &JwtConfig,
        dto: LoginDto,
    ) -> Result<LoginResponse, AppError> {
        let credentials =
            sqlx::query_as::<_, UserCredentials>("SELECT id, password, role FROM users WHERE email = $1")
                .bind(&dto.email)
                .fetch_optional(db)
                .await?
                .ok_or_else(|| AppError::unauthorized(anyhow::anyhow!("Invalid credentials")))?;

        if !verify_password(&dto.password, &credentials.password)? {
            return Err(AppError::unauthorized(anyhow::anyhow!("Invalid credentials")));
        }

        let user = Self::get_user(db, credentials.id).await?;
        let access_token = create_access_token(&user, jwt_config)?;

        Ok(LoginResponse { access_token, user })
    }

    #[instrument(skip(db))]
    pub async fn get_user(db: &PgPool, id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }
}
