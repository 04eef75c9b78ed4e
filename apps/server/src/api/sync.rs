use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use atelier_core::sync::{SyncJob, SyncLog};
use atelier_miro::RateLimiterStats;
use atelier_sync::service::BulkSyncResult;
use atelier_sync::worker::JobOutcome;

use crate::error::{ApiError, ApiResult};
use crate::main_lib::AppState;

/// Body of the worker trigger entrypoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncWorkerRequest {
    /// Board credential for this invocation; falls back to the server's
    /// configured token when absent.
    miro_access_token: Option<String>,
    /// Jobs to process this invocation.
    max_jobs: Option<usize>,
    /// Process one specific job instead of draining the queue.
    job_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncWorkerResponse {
    ok: bool,
    worker_id: String,
    processed: usize,
    results: Vec<JobOutcome>,
}

/// POST /sync-worker - claim and process queued jobs.
async fn run_worker(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SyncWorkerRequest>,
) -> ApiResult<Json<SyncWorkerResponse>> {
    let token = request.miro_access_token.as_deref();
    let max_jobs = request
        .max_jobs
        .unwrap_or(state.config.worker_max_jobs)
        .clamp(1, 50);

    let report = match request.job_id.as_deref() {
        Some(job_id) => state.worker.process_job_by_id(job_id, token).await,
        None => state.worker.process_jobs(token, max_jobs).await,
    };

    Ok(Json(SyncWorkerResponse {
        ok: true,
        worker_id: report.worker_id,
        processed: report.processed,
        results: report.results,
    }))
}

/// POST /sync/all - bulk enqueue, guarded by the session lock.
async fn sync_all(State(state): State<Arc<AppState>>) -> ApiResult<Json<BulkSyncResult>> {
    let result = state.sync_service.try_request_sync_all().await?;
    Ok(Json(result))
}

/// Inbound change notification from the board platform.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CanvasEventRequest {
    board_id: String,
    #[serde(flatten)]
    event: serde_json::Value,
}

/// POST /sync/events - enqueue an inbound canvas event.
async fn record_event(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CanvasEventRequest>,
) -> ApiResult<(StatusCode, Json<SyncJob>)> {
    if request.board_id.trim().is_empty() {
        return Err(ApiError::BadRequest("boardId is required".to_string()));
    }
    let job = state
        .sync_service
        .record_canvas_event(&request.board_id, request.event)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(job)))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<i64>,
}

async fn list_jobs(
    Query(query): Query<ListQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<SyncJob>>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    Ok(Json(state.job_repository.list_recent_sync_jobs(limit)?))
}

async fn list_logs(
    Query(query): Query<ListQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<SyncLog>>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    Ok(Json(state.log_repository.list_recent_sync_logs(limit)?))
}

/// GET /sync/stats - rate limiter observability.
async fn stats(State(state): State<Arc<AppState>>) -> Json<RateLimiterStats> {
    Json(state.rate_limiter.stats())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sync-worker", post(run_worker))
        .route("/sync/all", post(sync_all))
        .route("/sync/events", post(record_event))
        .route("/sync/jobs", get(list_jobs))
        .route("/sync/logs", get(list_logs))
        .route("/sync/stats", get(stats))
}
