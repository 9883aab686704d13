use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::modules::classes::service::ClassService;
use crate::modules::enrollments::model::{
    CreateEnrollmentDto, Enrollment, RosterEntry, StudentEnrollment,
};
use crate::modules::enrollments::service::EnrollmentService;
use crate::modules::users::model::UserRole;
use crate::state::AppState;
use crate::utils::errors::AppError;

#[utoipa::path(
    post,
    path = "/api/enrollments",
    request_body = CreateEnrollmentDto,
    responses(
        (status = 201, description = "Enrolled", body = Enrollment),
        (status = 400, description = "Target is not a student"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Students can only enroll themselves"),
        (status = 404, description = "Class not found"),
        (status = 409, description = "Class full or already enrolled")
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn enroll(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(dto): Json<CreateEnrollmentDto>,
) -> Result<(StatusCode, Json<Enrollment>), AppError> {
    let caller_id = auth_user.user_id()?;

    let student_id = match auth_user.role() {
        Some(UserRole::Student) => {
            if dto.student_id.is_some_and(|id| id != caller_id) {
                return Err(AppError::forbidden(anyhow::anyhow!(
                    "Students can only enroll themselves"
                )));
            }
            caller_id
        }
        Some(UserRole::Teacher) | Some(UserRole::Admin) => dto.student_id.ok_or_else(|| {
            AppError::bad_request(anyhow::anyhow!("student_id is required"))
        })?,
        None => {
            return Err(AppError::forbidden(anyhow::anyhow!(
                "Access denied. Unrecognized role."
            )));
        }
    };

    let enrollment = EnrollmentService::enroll(&state.db, dto.class_id, student_id).await?;

    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[utoipa::path(
    delete,
    path = "/api/enrollments/{id}",
    params(("id" = Uuid, Path, description = "Enrollment ID")),
    responses(
        (status = 204, description = "Enrollment dropped"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not allowed to drop this enrollment"),
        (status = 404, description = "Enrollment not found")
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn drop_enrollment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let enrollment = EnrollmentService::get(&state.db, id).await?;
    let caller_id = auth_user.user_id()?;

    let allowed = match auth_user.role() {
        Some(UserRole::Admin) => true,
        Some(UserRole::Student) => enrollment.student_id == caller_id,
        Some(UserRole::Teacher) => {
            let class = ClassService::get(&state.db, enrollment.class_id).await?;
            class.teacher_id == caller_id
        }
        None => false,
    };

    if !allowed {
        return Err(AppError::forbidden(anyhow::anyhow!(
            "Not allowed to drop this enrollment"
        )));
    }

    EnrollmentService::drop(&state.db, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/enrollments/class/{class_id}",
    params(("class_id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class roster", body = Vec<RosterEntry>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the teacher of record"),
        (status = 404, description = "Class not found")
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_class_roster(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(class_id): Path<Uuid>,
) -> Result<Json<Vec<RosterEntry>>, AppError> {
    let allowed = match auth_user.role() {
        Some(UserRole::Admin) => true,
        Some(UserRole::Teacher) => {
            let class = ClassService::get(&state.db, class_id).await?;
            class.teacher_id == auth_user.user_id()?
        }
        _ => false,
    };

    if !allowed {
        return Err(AppError::forbidden(anyhow::anyhow!(
            "Only the teacher of record or an admin can view the roster"
        )));
    }

    let roster = EnrollmentService::roster(&state.db, class_id).await?;

    Ok(Json(roster))
}

#[utoipa::path(
    get,
    path = "/api/enrollments/me",
    responses(
        (status = 200, description = "The caller's enrollments", body = Vec<StudentEnrollment>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_my_enrollments(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<StudentEnrollment>>, AppError> {
    let enrollments = EnrollmentService::for_student(&state.db, auth_user.user_id()?).await?;

    Ok(Json(enrollments))
}
