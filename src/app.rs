use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method},
};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    config::AppConfig,
    database,
    error::{AppError, Result},
    routes,
    services::{notification_service::Notifier, upload_service::UploadStore},
    utils::extractors::LEGACY_TOKEN_HEADER,
};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub uploads: UploadStore,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(db: PgPool, config: AppConfig) -> Self {
        Self {
            db,
            uploads: UploadStore::new(config.uploads.dir.clone()),
            notifier: Notifier::new(config.notifications.channel_capacity),
            config: Arc::new(config),
        }
    }
}

pub async fn build(config: &AppConfig) -> Result<Router> {
    let pool = database::create_pool(&config.database).await?;
    database::seed_admin(&pool, &config.auth).await?;

    let state = AppState::new(pool, config.clone());
    state.uploads.ensure_root().await?;

    router(state)
}

/// Wires routes, static uploads and the HTTP layers around `state`.
pub fn router(state: AppState) -> Result<Router> {
    let config = state.config.clone();

    let allowed_origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| AppError::ConfigError(format!("Invalid CORS origin: {}", origin)))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            http::header::CONTENT_TYPE,
            http::header::AUTHORIZATION,
            HeaderName::from_static(LEGACY_TOKEN_HEADER),
        ])
        .expose_headers([http::header::CONTENT_DISPOSITION])
        .allow_origin(allowed_origins);

    let app = routes::create_router(state.clone())
        .nest_service("/uploads", ServeDir::new(state.uploads.root()))
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}
