//! Sync job domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Default number of delivery attempts before a job fails permanently.
pub const DEFAULT_MAX_ATTEMPTS: i32 = 5;

/// Base retry delay in seconds (first retry).
const BACKOFF_BASE_SECS: u64 = 30;
/// Lower bound on a computed retry delay.
const BACKOFF_MIN_SECS: u64 = 10;
/// Upper bound on a computed retry delay (30 minutes).
const BACKOFF_MAX_SECS: u64 = 30 * 60;

/// Type of sync job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Mirror one project's state onto its board.
    ProjectSync,
    /// Re-sync every project linked to one board.
    MasterBoardSync,
    /// Process an inbound change notification from the board.
    CanvasItemSync,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::ProjectSync => "project_sync",
            JobType::MasterBoardSync => "master_board_sync",
            JobType::CanvasItemSync => "canvas_item_sync",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "project_sync" => Some(JobType::ProjectSync),
            "master_board_sync" => Some(JobType::MasterBoardSync),
            "canvas_item_sync" => Some(JobType::CanvasItemSync),
            _ => None,
        }
    }
}

/// Lifecycle status of a sync job.
///
/// Jobs are retained after reaching a terminal state for audit; they are
/// never deleted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Queued,
    Running,
    Succeeded,
    Failed,
    Canceled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Canceled => "canceled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "queued" => Some(JobStatus::Queued),
            "running" => Some(JobStatus::Running),
            "succeeded" => Some(JobStatus::Succeeded),
            "failed" => Some(JobStatus::Failed),
            "canceled" => Some(JobStatus::Canceled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed | JobStatus::Canceled)
    }
}

/// One unit of synchronization work.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncJob {
    pub id: String,
    pub job_type: JobType,
    pub status: JobStatus,
    pub project_id: Option<String>,
    pub board_id: Option<String>,
    /// Opaque job payload (e.g., the inbound event for `canvas_item_sync`).
    pub payload: Value,
    pub attempt_count: i32,
    pub max_attempts: i32,
    /// Identity of the worker currently (or last) holding the job.
    pub worker_id: Option<String>,
    /// Retry visibility marker: the job is not claimable before this instant.
    pub run_after: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SyncJob {
    /// True when the job has exhausted its delivery attempts.
    pub fn attempts_exhausted(&self) -> bool {
        self.attempt_count >= self.max_attempts
    }
}

/// Input model for enqueuing a sync job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSyncJob {
    pub job_type: JobType,
    pub project_id: Option<String>,
    pub board_id: Option<String>,
    #[serde(default)]
    pub payload: Value,
    pub max_attempts: Option<i32>,
}

impl NewSyncJob {
    pub fn project_sync(project_id: impl Into<String>) -> Self {
        Self {
            job_type: JobType::ProjectSync,
            project_id: Some(project_id.into()),
            board_id: None,
            payload: Value::Null,
            max_attempts: None,
        }
    }

    pub fn master_board_sync(board_id: impl Into<String>) -> Self {
        Self {
            job_type: JobType::MasterBoardSync,
            project_id: None,
            board_id: Some(board_id.into()),
            payload: Value::Null,
            max_attempts: None,
        }
    }

    pub fn canvas_item_sync(board_id: impl Into<String>, payload: Value) -> Self {
        Self {
            job_type: JobType::CanvasItemSync,
            project_id: None,
            board_id: Some(board_id.into()),
            payload,
            max_attempts: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Compute the retry delay for a job, given its attempt count *after* the
/// claim-time increment.
///
/// Exponential from a 30s base, clamped to [10s, 30min]: the first retry
/// waits ~30s, the sixth ~16min, and everything beyond caps at 30min.
pub fn retry_delay(attempt_count: i32) -> Duration {
    let exponent = attempt_count.max(1) - 1;
    // Saturate well before the clamp band to avoid shift overflow.
    let raw = if exponent >= 32 {
        u64::MAX
    } else {
        BACKOFF_BASE_SECS.saturating_mul(1u64 << exponent)
    };
    Duration::from_secs(raw.clamp(BACKOFF_MIN_SECS, BACKOFF_MAX_SECS))
}
