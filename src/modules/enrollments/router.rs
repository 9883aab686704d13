use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

use super::controller::{drop_enrollment, enroll, get_class_roster, get_my_enrollments};

pub fn init_enrollments_router() -> Router<AppState> {
    Router::new()
        .route("/", post(enroll))
        .route("/me", get(get_my_enrollments))
        .route("/class/{class_id}", get(get_class_roster))
        .route("/{id}", delete(drop_enrollment))
}
