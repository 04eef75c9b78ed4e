use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use atelier_core::projects::{NewProject, Project, ProjectUpdate};
use atelier_core::sync::SyncJob;

use crate::error::ApiResult;
use crate::main_lib::AppState;

async fn list_projects(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Project>>> {
    let projects = state.project_repository.list()?;
    Ok(Json(projects))
}

async fn get_project(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Project>> {
    let project = state.project_repository.get_by_id(&id)?;
    Ok(Json(project))
}

async fn create_project(
    State(state): State<Arc<AppState>>,
    Json(new_project): Json<NewProject>,
) -> ApiResult<Json<Project>> {
    let project = state.project_repository.create(new_project).await?;
    Ok(Json(project))
}

async fn update_project(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ProjectUpdate>,
) -> ApiResult<Json<Project>> {
    let project = state.project_repository.update(update).await?;
    Ok(Json(project))
}

/// Enqueue a sync job for one project.
async fn request_sync(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<SyncJob>> {
    let job = state.sync_service.request_project_sync(&id).await?;
    Ok(Json(job))
}

/// Remove the board linkage and all mappings.
async fn unsync(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Project>> {
    let project = state.sync_service.unsync_project(&id).await?;
    Ok(Json(project))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project).put(update_project))
        .route("/projects/{id}", get(get_project))
        .route("/projects/{id}/sync", post(request_sync).delete(unsync))
}
