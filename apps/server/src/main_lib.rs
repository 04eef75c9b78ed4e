//! Application state construction and router assembly.

use std::sync::Arc;
use std::time::Duration;

use axum::middleware;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use atelier_core::mappings::MappingRepositoryTrait;
use atelier_core::projects::ProjectRepositoryTrait;
use atelier_core::sync::{SyncJobRepositoryTrait, SyncLogRepositoryTrait};
use atelier_miro::RateLimiter;
use atelier_storage_sqlite::db;
use atelier_storage_sqlite::mappings::MappingRepository;
use atelier_storage_sqlite::projects::ProjectRepository;
use atelier_storage_sqlite::sync_jobs::SyncJobRepository;
use atelier_storage_sqlite::sync_logs::SyncLogRepository;
use atelier_sync::{
    InMemoryLockStore, MiroBoardClientFactory, SessionLockService, SyncService, SyncWorker,
    SyncWorkerDeps,
};

use crate::api;
use crate::auth::require_admin;
use crate::config::Config;

pub struct AppState {
    pub project_repository: Arc<dyn ProjectRepositoryTrait>,
    pub job_repository: Arc<dyn SyncJobRepositoryTrait>,
    pub log_repository: Arc<dyn SyncLogRepositoryTrait>,
    pub mapping_repository: Arc<dyn MappingRepositoryTrait>,
    pub sync_service: Arc<SyncService>,
    pub worker: Arc<SyncWorker>,
    pub rate_limiter: Arc<RateLimiter>,
    pub config: Config,
}

pub fn init_tracing() {
    let log_format = std::env::var("ATELIER_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer(pool.clone());

    let project_repository: Arc<dyn ProjectRepositoryTrait> =
        Arc::new(ProjectRepository::new(pool.clone(), writer.clone()));
    let job_repository: Arc<dyn SyncJobRepositoryTrait> =
        Arc::new(SyncJobRepository::new(pool.clone(), writer.clone()));
    let log_repository: Arc<dyn SyncLogRepositoryTrait> =
        Arc::new(SyncLogRepository::new(pool.clone(), writer.clone()));
    let mapping_repository: Arc<dyn MappingRepositoryTrait> =
        Arc::new(MappingRepository::new(pool.clone(), writer.clone()));

    let rate_limiter = Arc::new(RateLimiter::new());
    let board_factory = Arc::new(MiroBoardClientFactory::new(rate_limiter.clone()));

    let worker = Arc::new(SyncWorker::new(
        SyncWorkerDeps {
            projects: project_repository.clone(),
            jobs: job_repository.clone(),
            logs: log_repository.clone(),
            mappings: mapping_repository.clone(),
            boards: board_factory,
        },
        config.miro_access_token.clone(),
    ));

    let lock_service = Arc::new(SessionLockService::new(Arc::new(InMemoryLockStore::new())));
    let sync_service = Arc::new(SyncService::new(
        project_repository.clone(),
        job_repository.clone(),
        mapping_repository.clone(),
        lock_service,
    ));

    Ok(Arc::new(AppState {
        project_repository,
        job_repository,
        log_repository,
        mapping_repository,
        sync_service,
        worker,
        rate_limiter,
        config: config.clone(),
    }))
}

/// Assemble the full router. Everything under `/api` except the health probe
/// requires the administrator bearer credential.
pub fn build_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .merge(api::projects::router())
        .merge(api::sync::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .nest("/api", api::health::router().merge(protected))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(120)))
        .with_state(state)
}
