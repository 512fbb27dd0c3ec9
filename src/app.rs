use std::time::Duration;

use axum::{
    extract::Request,
    middleware::{self, Next},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::{AuthError, EmailPolicy, TokenIssuer};
use crate::config::{ApiConfig, AppConfig};
use crate::database::Database;
use crate::handlers;
use crate::middleware::{jwt_auth_middleware, require_roles};
use crate::services::{AssetService, UserService};
use crate::types::Role;

const USER_MANAGERS: &[Role] = &[Role::Admin, Role::EmployeeManager];
const TIMELINE_VIEWERS: &[Role] = &[Role::Admin, Role::EmployeeManager, Role::AssetManager];
const ASSET_MANAGERS: &[Role] = &[Role::Admin, Role::AssetManager];

/// Shared handles cloned into every request
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Database,
    pub assets: AssetService,
    pub users: UserService,
    pub tokens: TokenIssuer,
    pub api: ApiConfig,
}

impl AppState {
    pub fn new(db: Database, config: &AppConfig) -> Result<Self, AuthError> {
        let tokens = TokenIssuer::from_config(&config.security)?;
        let emails = EmailPolicy::new(&config.security.email_domain)?;
        Ok(Self {
            assets: AssetService::new(db.clone()),
            users: UserService::new(db.clone(), tokens.clone(), emails),
            tokens,
            api: config.api.clone(),
            db,
        })
    }
}

pub fn router(state: AppState, enable_cors: bool) -> Router {
    let timeout = Duration::from_secs(state.api.request_timeout_secs);

    let authenticated = Router::new()
        .merge(user_routes())
        .merge(asset_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware));

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .nest("/api", authenticated)
        .with_state(state)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

fn user_routes() -> Router<AppState> {
    use handlers::users;

    let managed = Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/:id", get(users::get).patch(users::update).delete(users::delete))
        .route_layer(middleware::from_fn(|req: Request, next: Next| require_roles(USER_MANAGERS, req, next)));

    let timeline = Router::new()
        .route("/users/:id/timeline", get(users::timeline))
        .route_layer(middleware::from_fn(|req: Request, next: Next| require_roles(TIMELINE_VIEWERS, req, next)));

    managed.merge(timeline)
}

fn asset_routes() -> Router<AppState> {
    use handlers::assets;

    Router::new()
        .route("/assets", get(assets::list).post(assets::create))
        .route("/assets/assign", post(assets::assign))
        .route("/assets/:id", get(assets::get).patch(assets::update).delete(assets::archive))
        .route("/assets/:id/retrieve", post(assets::retrieve))
        .route("/assets/:id/timeline", get(assets::timeline))
        .route_layer(middleware::from_fn(|req: Request, next: Next| require_roles(ASSET_MANAGERS, req, next)))
}
