//! Database model for sync audit logs.

use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use atelier_core::sync::{NewSyncLog, SyncLog, SyncLogStatus};

use crate::utils::parse_ts;

#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::sync_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncLogDB {
    pub id: String,
    pub job_id: Option<String>,
    pub project_id: Option<String>,
    pub board_id: Option<String>,
    pub operation: String,
    pub status: String,
    pub items_created: i32,
    pub items_updated: i32,
    pub error: Option<String>,
    pub started_at: String,
    pub finished_at: Option<String>,
}

impl From<SyncLogDB> for SyncLog {
    fn from(db: SyncLogDB) -> Self {
        Self {
            status: SyncLogStatus::parse(&db.status).unwrap_or_default(),
            started_at: parse_ts(&Some(db.started_at.clone())).unwrap_or_else(Utc::now),
            finished_at: parse_ts(&db.finished_at),
            id: db.id,
            job_id: db.job_id,
            project_id: db.project_id,
            board_id: db.board_id,
            operation: db.operation,
            items_created: db.items_created,
            items_updated: db.items_updated,
            error: db.error,
        }
    }
}

impl From<NewSyncLog> for SyncLogDB {
    fn from(domain: NewSyncLog) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            job_id: domain.job_id,
            project_id: domain.project_id,
            board_id: domain.board_id,
            operation: domain.operation,
            status: SyncLogStatus::Running.as_str().to_string(),
            items_created: 0,
            items_updated: 0,
            error: None,
            started_at: Utc::now().to_rfc3339(),
            finished_at: None,
        }
    }
}
