//! Repository for the durable sync job queue.
//!
//! The claim operations are the engine's cross-process mutual exclusion:
//! both run as a single job on the write actor, whose immediate transaction
//! holds the SQLite write lock from BEGIN to COMMIT. Two concurrent claimers
//! therefore serialize, and the loser re-selects against the already-updated
//! row (no longer `queued`) and comes back empty. This is the SQLite
//! realization of `SELECT ... FOR UPDATE SKIP LOCKED`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::debug;

use atelier_core::errors::Result;
use atelier_core::sync::{JobStatus, NewSyncJob, SyncJob, SyncJobRepositoryTrait};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::sync_jobs;

use super::model::SyncJobDB;

pub struct SyncJobRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SyncJobRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    /// Transition a claimable row to `running` inside the current
    /// transaction. Returns the claimed job.
    fn claim_row(
        conn: &mut SqliteConnection,
        job: SyncJobDB,
        worker: &str,
    ) -> Result<Option<SyncJob>> {
        let now = Utc::now().to_rfc3339();

        // Guard on status so a row that changed between select and update
        // (same transaction, so only possible via claim-by-id on the same
        // row id) is skipped rather than double-claimed.
        let updated = diesel::update(
            sync_jobs::table
                .find(&job.id)
                .filter(sync_jobs::status.eq(JobStatus::Queued.as_str())),
        )
        .set((
            sync_jobs::status.eq(JobStatus::Running.as_str()),
            sync_jobs::attempt_count.eq(job.attempt_count + 1),
            sync_jobs::worker_id.eq(Some(worker.to_string())),
            sync_jobs::updated_at.eq(&now),
        ))
        .execute(conn)
        .map_err(StorageError::from)?;

        if updated == 0 {
            return Ok(None);
        }

        let claimed: SyncJobDB = sync_jobs::table
            .find(&job.id)
            .select(SyncJobDB::as_select())
            .first(conn)
            .map_err(StorageError::from)?;
        Ok(Some(claimed.into()))
    }
}

#[async_trait]
impl SyncJobRepositoryTrait for SyncJobRepository {
    async fn enqueue_sync_job(&self, new_job: NewSyncJob) -> Result<SyncJob> {
        self.writer
            .exec(move |conn| {
                let db: SyncJobDB = new_job.into();
                diesel::insert_into(sync_jobs::table)
                    .values(&db)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                debug!("Enqueued sync job {} ({})", db.id, db.job_type);
                Ok(db.into())
            })
            .await
    }

    async fn claim_next_sync_job(&self, worker_id: &str) -> Result<Option<SyncJob>> {
        let worker = worker_id.to_string();
        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();

                let candidate: Option<SyncJobDB> = sync_jobs::table
                    .filter(sync_jobs::status.eq(JobStatus::Queued.as_str()))
                    .filter(sync_jobs::attempt_count.lt(sync_jobs::max_attempts))
                    .filter(
                        sync_jobs::run_after
                            .is_null()
                            .or(sync_jobs::run_after.le(now)),
                    )
                    .order(sync_jobs::created_at.asc())
                    .select(SyncJobDB::as_select())
                    .first(conn)
                    .optional()
                    .map_err(StorageError::from)?;

                match candidate {
                    Some(job) => Self::claim_row(conn, job, &worker),
                    None => Ok(None),
                }
            })
            .await
    }

    async fn claim_sync_job_by_id(
        &self,
        job_id: &str,
        worker_id: &str,
    ) -> Result<Option<SyncJob>> {
        let id = job_id.to_string();
        let worker = worker_id.to_string();
        self.writer
            .exec(move |conn| {
                let candidate: Option<SyncJobDB> = sync_jobs::table
                    .find(&id)
                    .filter(sync_jobs::status.eq(JobStatus::Queued.as_str()))
                    .filter(sync_jobs::attempt_count.lt(sync_jobs::max_attempts))
                    .select(SyncJobDB::as_select())
                    .first(conn)
                    .optional()
                    .map_err(StorageError::from)?;

                match candidate {
                    Some(job) => Self::claim_row(conn, job, &worker),
                    None => Ok(None),
                }
            })
            .await
    }

    async fn complete_sync_job(
        &self,
        job_id: &str,
        success: bool,
        error: Option<String>,
    ) -> Result<SyncJob> {
        let id = job_id.to_string();
        self.writer
            .exec(move |conn| {
                let status = if success {
                    JobStatus::Succeeded
                } else {
                    JobStatus::Failed
                };
                diesel::update(sync_jobs::table.find(&id))
                    .set((
                        sync_jobs::status.eq(status.as_str()),
                        sync_jobs::last_error.eq(&error),
                        sync_jobs::run_after.eq(None::<String>),
                        sync_jobs::updated_at.eq(Utc::now().to_rfc3339()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let db: SyncJobDB = sync_jobs::table
                    .find(&id)
                    .select(SyncJobDB::as_select())
                    .first(conn)
                    .map_err(StorageError::from)?;
                Ok(db.into())
            })
            .await
    }

    async fn fail_sync_job(
        &self,
        job_id: &str,
        error: &str,
        retry_delay: Duration,
    ) -> Result<SyncJob> {
        let id = job_id.to_string();
        let error = error.to_string();
        self.writer
            .exec(move |conn| {
                let db: SyncJobDB = sync_jobs::table
                    .find(&id)
                    .select(SyncJobDB::as_select())
                    .first(conn)
                    .map_err(StorageError::from)?;

                let now = Utc::now();
                if db.attempt_count >= db.max_attempts {
                    // Attempts exhausted: permanent failure.
                    diesel::update(sync_jobs::table.find(&id))
                        .set((
                            sync_jobs::status.eq(JobStatus::Failed.as_str()),
                            sync_jobs::last_error.eq(Some(&error)),
                            sync_jobs::run_after.eq(None::<String>),
                            sync_jobs::updated_at.eq(now.to_rfc3339()),
                        ))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                } else {
                    let visible_at = now
                        + chrono::Duration::from_std(retry_delay)
                            .unwrap_or_else(|_| chrono::Duration::seconds(30));
                    diesel::update(sync_jobs::table.find(&id))
                        .set((
                            sync_jobs::status.eq(JobStatus::Queued.as_str()),
                            sync_jobs::last_error.eq(Some(&error)),
                            sync_jobs::worker_id.eq(None::<String>),
                            sync_jobs::run_after.eq(Some(visible_at.to_rfc3339())),
                            sync_jobs::updated_at.eq(now.to_rfc3339()),
                        ))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }

                let db: SyncJobDB = sync_jobs::table
                    .find(&id)
                    .select(SyncJobDB::as_select())
                    .first(conn)
                    .map_err(StorageError::from)?;
                Ok(db.into())
            })
            .await
    }

    fn get_sync_job(&self, job_id: &str) -> Result<Option<SyncJob>> {
        let mut conn = get_connection(&self.pool)?;
        let result = sync_jobs::table
            .find(job_id)
            .select(SyncJobDB::as_select())
            .first::<SyncJobDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(result.map(Into::into))
    }

    fn list_recent_sync_jobs(&self, limit: i64) -> Result<Vec<SyncJob>> {
        let mut conn = get_connection(&self.pool)?;
        let results = sync_jobs::table
            .order(sync_jobs::created_at.desc())
            .limit(limit)
            .select(SyncJobDB::as_select())
            .load::<SyncJobDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(results.into_iter().map(Into::into).collect())
    }
}
