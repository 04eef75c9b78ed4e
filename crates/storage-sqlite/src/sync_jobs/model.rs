//! Database model for sync jobs.

use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use atelier_core::sync::{JobStatus, JobType, NewSyncJob, SyncJob, DEFAULT_MAX_ATTEMPTS};

use crate::utils::{fmt_ts, parse_ts};

#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::sync_jobs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncJobDB {
    pub id: String,
    pub job_type: String,
    pub status: String,
    pub project_id: Option<String>,
    pub board_id: Option<String>,
    pub payload: String,
    pub attempt_count: i32,
    pub max_attempts: i32,
    pub worker_id: Option<String>,
    pub run_after: Option<String>,
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SyncJobDB> for SyncJob {
    fn from(db: SyncJobDB) -> Self {
        Self {
            job_type: JobType::parse(&db.job_type).unwrap_or(JobType::ProjectSync),
            status: JobStatus::parse(&db.status).unwrap_or_default(),
            payload: serde_json::from_str(&db.payload).unwrap_or(serde_json::Value::Null),
            run_after: parse_ts(&db.run_after),
            created_at: parse_ts(&Some(db.created_at.clone())).unwrap_or_else(Utc::now),
            updated_at: parse_ts(&Some(db.updated_at.clone())).unwrap_or_else(Utc::now),
            id: db.id,
            project_id: db.project_id,
            board_id: db.board_id,
            attempt_count: db.attempt_count,
            max_attempts: db.max_attempts,
            worker_id: db.worker_id,
            last_error: db.last_error,
        }
    }
}

impl From<NewSyncJob> for SyncJobDB {
    fn from(domain: NewSyncJob) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            job_type: domain.job_type.as_str().to_string(),
            status: JobStatus::Queued.as_str().to_string(),
            project_id: domain.project_id,
            board_id: domain.board_id,
            payload: serde_json::to_string(&domain.payload).unwrap_or_else(|_| "null".to_string()),
            attempt_count: 0,
            max_attempts: domain.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            worker_id: None,
            run_after: fmt_ts(None),
            last_error: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
