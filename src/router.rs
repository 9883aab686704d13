use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::middleware::admission::admission_middleware;
use crate::middleware::identity::resolve_identity;
use crate::modules::auth::router::init_auth_router;
use crate::modules::classes::router::init_classes_router;
use crate::modules::departments::router::init_departments_router;
use crate::modules::enrollments::router::init_enrollments_router;
use crate::modules::subjects::router::init_subjects_router;
use crate::modules::users::router::init_users_router;
use crate::state::AppState;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router, middleware};
use serde_json::json;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Classroom backend is up and running!" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .route("/", get(root))
        .route("/health", get(health))
        .nest(
            "/api",
            Router::new()
                .nest("/auth", init_auth_router())
                .nest("/departments", init_departments_router())
                .nest("/subjects", init_subjects_router())
                .nest("/classes", init_classes_router())
                .nest("/users", init_users_router())
                .nest("/enrollments", init_enrollments_router()),
        )
        .with_state(state.clone())
        // Innermost first: admission runs after identity has resolved.
        .layer(middleware::from_fn_with_state(
            state.guard.clone(),
            admission_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.jwt_config.clone(),
            resolve_identity,
        ))
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_credentials(true)
        })
        .layer(middleware::from_fn(logging_middleware))
}
