use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Enrollment {
    pub id: Uuid,
    pub class_id: Uuid,
    pub student_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEnrollmentDto {
    pub class_id: Uuid,
    /// Defaults to the caller for students; teachers and admins can enroll
    /// any student.
    pub student_id: Option<Uuid>,
}

/// Roster line: an enrollment joined with the student's public fields.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct RosterEntry {
    pub id: Uuid,
    pub student_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub enrolled_at: DateTime<Utc>,
}

/// An enrollment joined with its class name, for the student's own view.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct StudentEnrollment {
    pub id: Uuid,
    pub class_id: Uuid,
    pub class_name: String,
    pub enrolled_at: DateTime<Utc>,
}
