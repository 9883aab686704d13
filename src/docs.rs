use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::auth::model::{Claims, LoginDto, LoginResponse, RegisterDto};
use crate::modules::classes::model::{
    Class, CreateClassDto, PaginatedClassesResponse, UpdateClassDto,
};
use crate::modules::departments::model::{
    CreateDepartmentDto, Department, PaginatedDepartmentsResponse, UpdateDepartmentDto,
};
use crate::modules::enrollments::model::{
    CreateEnrollmentDto, Enrollment, RosterEntry, StudentEnrollment,
};
use crate::modules::subjects::model::{
    CreateSubjectDto, PaginatedSubjectsResponse, Subject, UpdateSubjectDto,
};
use crate::modules::users::model::{
    CreateUserDto, PaginatedUsersResponse, UpdateProfileDto, User, UserRole,
};
use crate::utils::pagination::{PaginationMeta, PaginationParams};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::me,
        crate::modules::departments::controller::create_department,
        crate::modules::departments::controller::get_departments,
        crate::modules::departments::controller::get_department_by_id,
        crate::modules::departments::controller::update_department,
        crate::modules::departments::controller::delete_department,
        crate::modules::subjects::controller::create_subject,
        crate::modules::subjects::controller::get_subjects,
        crate::modules::subjects::controller::get_subject_by_id,
        crate::modules::subjects::controller::update_subject,
        crate::modules::subjects::controller::delete_subject,
        crate::modules::classes::controller::create_class,
        crate::modules::classes::controller::get_classes,
        crate::modules::classes::controller::get_class_by_id,
        crate::modules::classes::controller::update_class,
        crate::modules::classes::controller::delete_class,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_user_by_id,
        crate::modules::users::controller::update_profile,
        crate::modules::users::controller::delete_user,
        crate::modules::enrollments::controller::enroll,
        crate::modules::enrollments::controller::drop_enrollment,
        crate::modules::enrollments::controller::get_class_roster,
        crate::modules::enrollments::controller::get_my_enrollments,
    ),
    components(schemas(
        Claims,
        LoginDto,
        LoginResponse,
        RegisterDto,
        Class,
        CreateClassDto,
        PaginatedClassesResponse,
        UpdateClassDto,
        CreateDepartmentDto,
        Department,
        PaginatedDepartmentsResponse,
        UpdateDepartmentDto,
        CreateEnrollmentDto,
        Enrollment,
        RosterEntry,
        StudentEnrollment,
        CreateSubjectDto,
        PaginatedSubjectsResponse,
        Subject,
        UpdateSubjectDto,
        CreateUserDto,
        PaginatedUsersResponse,
        UpdateProfileDto,
        User,
        UserRole,
        PaginationMeta,
        PaginationParams,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and authentication"),
        (name = "Departments", description = "Department management"),
        (name = "Subjects", description = "Subject catalog"),
        (name = "Classes", description = "Class management"),
        (name = "Users", description = "User administration"),
        (name = "Enrollments", description = "Class enrollment")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
