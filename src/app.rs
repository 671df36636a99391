use std::sync::Arc;

use axum::http::Method;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::middleware::authorize;
use crate::authz::{AuthorizationEngine, PolicyRegistry, SqliteRoleDirectory};
use crate::config::AuthzConfig;
use crate::errors::AppError;
use crate::policies;
use crate::routes::{account, health, roles};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub directory: Arc<SqliteRoleDirectory>,
    pub engine: Arc<AuthorizationEngine>,
    pub config: Arc<AuthzConfig>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AuthzConfig, registry: PolicyRegistry) -> Self {
        let directory = Arc::new(SqliteRoleDirectory::new(pool.clone()));
        let engine = AuthorizationEngine::new(
            Arc::new(registry),
            directory.clone(),
            config.super_admins.clone(),
            config.directory_timeout,
        );

        Self {
            pool,
            directory,
            engine: Arc::new(engine),
            config: Arc::new(config),
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let config = AuthzConfig::from_env()?;
    if config.super_admins.is_empty() {
        tracing::info!("no super-admin roster configured");
    } else {
        tracing::info!(entries = config.super_admins.entries().len(), "super-admin roster loaded");
    }

    let registry = policies::default_registry(&config);
    Ok(create_app_with(pool, config, registry))
}

/// Landing pages are mounted at the configured paths; `registry` must mark
/// them anonymous (see [`policies::default_registry`]).
pub fn create_app_with(pool: SqlitePool, config: AuthzConfig, registry: PolicyRegistry) -> Router {
    let login_path = config.login_path.clone();
    let access_denied_path = config.access_denied_path.clone();
    let state = AppState::new(pool, config, registry);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health::health))
        .route(&login_path, get(account::login))
        .route(&access_denied_path, get(account::access_denied))
        .route("/me/authz", get(roles::my_authorization))
        .route("/roles", get(roles::list_roles))
        .route("/roles/:role/holders", get(roles::role_holders))
        // route_layer: runs after routing so the matched template is known
        .route_layer(middleware::from_fn_with_state(state.clone(), authorize))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
