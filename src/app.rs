use std::sync::Arc;

use axum::http::Method;
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::events::{self, EventBus};
use crate::jwt::JwtConfig;
use crate::routes::{auth, company, health, nav, public, seeker};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub event_bus: EventBus,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, event_bus: EventBus) -> Self {
        Self {
            pool,
            jwt: Arc::new(jwt),
            event_bus,
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let (event_bus, event_rx) = events::init_event_bus();
    let state = AppState::new(pool.clone(), jwt_config, event_bus);

    tokio::spawn(events::start_activity_listener(event_rx, pool));

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout));

    let public_routes = Router::new()
        .route("/", get(public::list_jobs))
        .route("/:id", get(public::get_job));

    let company_routes = Router::new()
        .route("/", get(company::list_jobs))
        .route("/", post(company::create_job))
        .route("/:id", get(company::get_job))
        .route("/:id", patch(company::update_job))
        .route("/:id", delete(company::delete_job));

    let seeker_routes = Router::new()
        .route("/jobs", get(seeker::browse_jobs))
        .route("/jobs/:id", get(seeker::get_job))
        .route("/applications", get(seeker::list_applications))
        .route("/applications", post(seeker::create_application))
        .route("/profile", get(seeker::get_profile))
        .route("/profile", put(seeker::update_profile));

    let router = Router::new()
        .route("/api/health", get(health::health))
        .nest("/auth", auth_routes)
        .nest("/jobs", public_routes)
        .nest("/company/jobs", company_routes)
        .nest("/seeker", seeker_routes)
        .fallback(not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            nav::navigation_guard,
        ))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}

async fn not_found() -> AppError {
    AppError::not_found("route not found")
}
