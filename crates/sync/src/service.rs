//! Client-facing sync operations: enqueueing, bulk fan-out, unsync.
//!
//! The bulk path is the one place the session lock matters: two sessions
//! both asking for "sync all" would enqueue a duplicate fan-out, so the
//! enqueue itself runs under the lock. Individual job claiming needs no lock
//! (the job store's claim is already atomic).

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use log::info;
use serde::Serialize;
use serde_json::Value;

use atelier_core::errors::{Error, Result};
use atelier_core::mappings::MappingRepositoryTrait;
use atelier_core::projects::{Project, ProjectRepositoryTrait};
use atelier_core::sync::{NewSyncJob, SyncJob, SyncJobRepositoryTrait};

use crate::session_lock::{SessionLockService, DEFAULT_ACQUIRE_TIMEOUT};

/// Lock name guarding bulk sync enqueue.
const BULK_SYNC_LOCK: &str = "board_sync";

/// Summary of a bulk enqueue.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSyncResult {
    pub project_jobs: usize,
    pub board_jobs: usize,
}

pub struct SyncService {
    projects: Arc<dyn ProjectRepositoryTrait>,
    jobs: Arc<dyn SyncJobRepositoryTrait>,
    mappings: Arc<dyn MappingRepositoryTrait>,
    locks: Arc<SessionLockService>,
}

impl SyncService {
    pub fn new(
        projects: Arc<dyn ProjectRepositoryTrait>,
        jobs: Arc<dyn SyncJobRepositoryTrait>,
        mappings: Arc<dyn MappingRepositoryTrait>,
        locks: Arc<SessionLockService>,
    ) -> Self {
        Self {
            projects,
            jobs,
            mappings,
            locks,
        }
    }

    /// Request a sync for one project: mark it pending and enqueue a job.
    pub async fn request_project_sync(&self, project_id: &str) -> Result<SyncJob> {
        let project = self.projects.get_by_id(project_id)?;
        if !project.has_board() {
            return Err(Error::Sync(format!(
                "project {} has no board linked",
                project_id
            )));
        }

        self.projects.mark_sync_pending(project_id, None).await?;
        self.jobs
            .enqueue_sync_job(NewSyncJob::project_sync(project_id))
            .await
    }

    /// Enqueue an inbound change notification from the board.
    pub async fn record_canvas_event(&self, board_id: &str, payload: Value) -> Result<SyncJob> {
        self.jobs
            .enqueue_sync_job(NewSyncJob::canvas_item_sync(board_id, payload))
            .await
    }

    /// Bulk sync: one job per syncable project plus one board-level job per
    /// distinct board. Guarded by the session lock so two sessions cannot
    /// both fan out.
    pub async fn request_sync_all(&self) -> Result<BulkSyncResult> {
        if !self
            .locks
            .acquire(BULK_SYNC_LOCK, "sync_all", DEFAULT_ACQUIRE_TIMEOUT)
            .await
        {
            return Err(Error::Sync(
                "another session is already running a bulk sync".to_string(),
            ));
        }

        let result = self.enqueue_all().await;
        self.locks.release(BULK_SYNC_LOCK);
        result
    }

    /// Same as [`Self::request_sync_all`] but fails fast instead of waiting
    /// for the lock.
    pub async fn try_request_sync_all(&self) -> Result<BulkSyncResult> {
        if !self.locks.try_acquire(BULK_SYNC_LOCK, "sync_all") {
            return Err(Error::Sync(
                "another session is already running a bulk sync".to_string(),
            ));
        }

        let result = self.enqueue_all().await;
        self.locks.release(BULK_SYNC_LOCK);
        result
    }

    async fn enqueue_all(&self) -> Result<BulkSyncResult> {
        let projects: Vec<Project> = self.projects.list_syncable()?;
        let mut boards: BTreeSet<String> = BTreeSet::new();
        let mut project_jobs = 0;

        for project in &projects {
            self.projects.mark_sync_pending(&project.id, None).await?;
            self.jobs
                .enqueue_sync_job(NewSyncJob::project_sync(&project.id))
                .await?;
            project_jobs += 1;
            if let Some(board) = &project.miro_board_id {
                boards.insert(board.clone());
            }
        }

        let mut board_jobs = 0;
        for board in boards {
            self.jobs
                .enqueue_sync_job(NewSyncJob::master_board_sync(board))
                .await?;
            board_jobs += 1;
        }

        info!(
            "Bulk sync enqueued: {} project jobs, {} board jobs",
            project_jobs, board_jobs
        );
        Ok(BulkSyncResult {
            project_jobs,
            board_jobs,
        })
    }

    /// Remove a project's board linkage and every mapping row it owns.
    pub async fn unsync_project(&self, project_id: &str) -> Result<Project> {
        let project = self.projects.get_by_id(project_id)?;

        if let Some(board_id) = &project.miro_board_id {
            let removed = self.mappings.delete_for_project(board_id, project_id).await?;
            info!(
                "Removed {} mapping(s) while unsyncing project {}",
                removed, project_id
            );
        }

        self.projects.unlink_board(project_id).await
    }

    /// Acquire-with-timeout variant used by callers that want to bound the
    /// wait themselves.
    pub async fn request_sync_all_with_timeout(&self, timeout: Duration) -> Result<BulkSyncResult> {
        if !self.locks.acquire(BULK_SYNC_LOCK, "sync_all", timeout).await {
            return Err(Error::Sync(
                "another session is already running a bulk sync".to_string(),
            ));
        }
        let result = self.enqueue_all().await;
        self.locks.release(BULK_SYNC_LOCK);
        result
    }
}
