//! Sync audit log domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a sync audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncLogStatus {
    #[default]
    Running,
    Succeeded,
    Failed,
}

impl SyncLogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncLogStatus::Running => "running",
            SyncLogStatus::Succeeded => "succeeded",
            SyncLogStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "running" => Some(SyncLogStatus::Running),
            "succeeded" => Some(SyncLogStatus::Succeeded),
            "failed" => Some(SyncLogStatus::Failed),
            _ => None,
        }
    }
}

/// Audit record for one sync operation.
///
/// Opened when a worker starts an operation, closed with the count of canvas
/// objects created vs. updated (or the failure message).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncLog {
    pub id: String,
    pub job_id: Option<String>,
    pub project_id: Option<String>,
    pub board_id: Option<String>,
    /// Operation name, e.g. "project_sync".
    pub operation: String,
    pub status: SyncLogStatus,
    pub items_created: i32,
    pub items_updated: i32,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Input model for opening a sync audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSyncLog {
    pub job_id: Option<String>,
    pub project_id: Option<String>,
    pub board_id: Option<String>,
    pub operation: String,
}
