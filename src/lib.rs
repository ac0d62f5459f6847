//! Portfolio CMS - library for app logic and testing

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod icons;
pub mod logging;
pub mod notify;
pub mod ordering;
pub mod routes;
pub mod state;

#[cfg(test)]
mod test_support;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    services::ServeDir, trace::TraceLayer,
};

use crate::config::Config;
use crate::db::{MemoryStore, PgStore, Store};
use crate::error::StartupError;
use crate::state::AppState;

/// Global request body cap; the upload route has its own.
const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Configure CORS from the configured origins.
/// Falls back to the local frontend dev server when none are set.
pub fn configure_cors(config: &Config) -> CorsLayer {
    let mut origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        origins = vec![
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ];
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::COOKIE])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors(&state.config);
    let max_upload_bytes = state.config.max_upload_bytes;
    let projects_dir = state.config.projects_dir();

    let api = Router::new()
        // Public site
        .route("/api/experience", get(routes::experience::list_public))
        .route("/api/education", get(routes::education::list_public))
        .route("/api/skills", get(routes::skills::list_public))
        .route("/api/projects", get(routes::projects::list_public))
        .route("/api/icons", get(routes::icons::list_icons))
        .route("/api/contact", post(routes::contacts::submit))
        // Admin session
        .route("/api/admin/login", post(routes::auth::login))
        .route("/api/admin/logout", post(routes::auth::logout))
        .route("/api/admin/session", get(routes::auth::session))
        // Admin content
        .route(
            "/api/admin/experience",
            get(routes::experience::list)
                .post(routes::experience::create)
                .put(routes::experience::update)
                .delete(routes::experience::delete),
        )
        .route(
            "/api/admin/experience/reorder",
            post(routes::experience::reorder),
        )
        .route(
            "/api/admin/education",
            get(routes::education::list)
                .post(routes::education::create)
                .put(routes::education::update)
                .delete(routes::education::delete),
        )
        .route(
            "/api/admin/education/reorder",
            post(routes::education::reorder),
        )
        .route(
            "/api/admin/skills",
            get(routes::skills::list)
                .post(routes::skills::create)
                .put(routes::skills::update)
                .delete(routes::skills::delete),
        )
        .route("/api/admin/skills/reorder", post(routes::skills::reorder))
        .route(
            "/api/admin/projects",
            get(routes::projects::list)
                .post(routes::projects::create)
                .put(routes::projects::update)
                .delete(routes::projects::delete),
        )
        .route(
            "/api/admin/projects/reorder",
            post(routes::projects::reorder),
        )
        .route(
            "/api/admin/contacts",
            get(routes::contacts::list)
                .put(routes::contacts::mark_read)
                .delete(routes::contacts::delete),
        )
        .route(
            "/api/admin/delete-image",
            delete(routes::upload::delete_image),
        )
        .route("/api/admin/check-env", get(routes::env_check::check_env))
        .route("/health", get(routes::health::health_ping))
        .route("/health/detailed", get(routes::health::health_detailed))
        .route("/health/ready", get(routes::health::health_ready))
        .layer(RequestBodyLimitLayer::new(DEFAULT_BODY_LIMIT));

    let uploads = Router::new()
        .route("/api/admin/upload", post(routes::upload::upload_images))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes));

    Router::new()
        .merge(api)
        .merge(uploads)
        .nest_service("/projects", ServeDir::new(projects_dir))
        .with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        // Compress responses with gzip/br/zstd automatically
        .layer(CompressionLayer::new())
        .layer(cors)
}

/// Builds the shared state: Postgres when a database URL is configured,
/// otherwise the in-memory store seeded with the configured admin.
pub async fn build_state(config: Config) -> Result<AppState, StartupError> {
    let store: Arc<dyn Store> = match &config.database {
        Some(settings) => {
            let pool = db::init_pool(settings).await?;
            db::run_migrations(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("No database URL set. Using the in-memory store; data is lost on restart.");
            let mut store = MemoryStore::new();
            match &config.seed_admin {
                Some(admin) => {
                    store = store.with_admin(&admin.email, None, &admin.password_hash);
                    tracing::info!("Seeded in-memory admin {}", admin.email);
                }
                None => tracing::warn!(
                    "ADMIN_EMAIL with ADMIN_HASH_PASSWORD or ADMIN_PASSWORD not set; admin login is unavailable"
                ),
            }
            Arc::new(store)
        }
    };

    let notifier = notify::notifier_from_settings(&config.email);
    Ok(AppState::new(config, store, notifier))
}

/// Run the server (used by main).
pub async fn run() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Held for the process lifetime; dropping them loses buffered log lines.
    let _log_guards = logging::init(&config.log);

    routes::health::init_start_time();

    if config.has_default_secret() {
        if config.is_production() {
            return Err(StartupError::InsecureSecret);
        }
        tracing::warn!(
            "SECURITY: SESSION_SECRET is not set; using the development default. \
             Set SESSION_SECRET before deploying."
        );
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|_| StartupError::BindAddress(format!("{}:{}", config.host, config.port)))?;

    let state = build_state(config).await?;
    let app = create_app(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
