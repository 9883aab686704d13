use axum::{
    Router,
    routing::{get, patch},
};

use crate::state::AppState;

use super::controller::{
    create_user, delete_user, get_user_by_id, get_users, update_profile,
};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_users).post(create_user))
        .route("/me", patch(update_profile))
        .route("/{id}", get(get_user_by_id).delete(delete_user))
}
