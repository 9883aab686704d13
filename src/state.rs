use std::sync::Arc;

use sqlx::PgPool;

use crate::config::cors::CorsConfig;
use crate::config::database::init_db_pool;
use crate::config::jwt::JwtConfig;
use crate::config::security::SecurityConfig;
use crate::guard::client::HttpDecisionService;
use crate::middleware::admission::GuardState;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub guard: GuardState,
}

pub async fn init_app_state() -> AppState {
    let security_config = SecurityConfig::from_env();
    let decision = Arc::new(HttpDecisionService::new(&security_config));

    AppState {
        db: init_db_pool().await,
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        guard: GuardState::new(security_config, decision),
    }
}
