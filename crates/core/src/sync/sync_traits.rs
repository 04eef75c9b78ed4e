//! Repository traits for the job store and the sync audit log.

use async_trait::async_trait;
use std::time::Duration;

use crate::errors::Result;
use crate::sync::job_model::{NewSyncJob, SyncJob};
use crate::sync::log_model::{NewSyncLog, SyncLog, SyncLogStatus};

/// Repository operations for the durable job queue.
///
/// The two claim operations are the engine's only mutual-exclusion mechanism
/// across worker processes: each must atomically select a claimable job,
/// transition it to `running`, increment its attempt count, and record the
/// worker id, such that two concurrent claimers can never take the same row.
#[async_trait]
pub trait SyncJobRepositoryTrait: Send + Sync {
    /// Enqueue a new job as `queued`.
    async fn enqueue_sync_job(&self, new_job: NewSyncJob) -> Result<SyncJob>;

    /// Atomically claim the oldest claimable job: `queued`, past its
    /// `run_after` marker (if any), with attempts remaining. Returns `None`
    /// when nothing is claimable.
    async fn claim_next_sync_job(&self, worker_id: &str) -> Result<Option<SyncJob>>;

    /// Atomically claim one specific job, for manually triggered
    /// reprocessing. Returns `None` if the job is not claimable (already
    /// running, terminal, or attempts exhausted).
    async fn claim_sync_job_by_id(&self, job_id: &str, worker_id: &str)
        -> Result<Option<SyncJob>>;

    /// Terminal transition to `succeeded` or `failed`.
    async fn complete_sync_job(
        &self,
        job_id: &str,
        success: bool,
        error: Option<String>,
    ) -> Result<SyncJob>;

    /// Return a running job to `queued` with a retry visibility marker of
    /// `now + retry_delay`, unless its attempts are exhausted, in which case
    /// it becomes `failed` permanently. Returns the updated job.
    async fn fail_sync_job(
        &self,
        job_id: &str,
        error: &str,
        retry_delay: Duration,
    ) -> Result<SyncJob>;

    fn get_sync_job(&self, job_id: &str) -> Result<Option<SyncJob>>;

    fn list_recent_sync_jobs(&self, limit: i64) -> Result<Vec<SyncJob>>;
}

/// Repository operations for sync audit entries.
#[async_trait]
pub trait SyncLogRepositoryTrait: Send + Sync {
    /// Open an audit entry in `running` state.
    async fn create_sync_log(&self, new_log: NewSyncLog) -> Result<SyncLog>;

    /// Close an audit entry with its outcome and object counts.
    async fn complete_sync_log(
        &self,
        log_id: &str,
        status: SyncLogStatus,
        items_created: i32,
        items_updated: i32,
        error: Option<String>,
    ) -> Result<SyncLog>;

    fn list_recent_sync_logs(&self, limit: i64) -> Result<Vec<SyncLog>>;
}
