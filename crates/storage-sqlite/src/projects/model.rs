//! Database model for projects.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use atelier_core::projects::{BriefingData, NewProject, Project, ProjectStatus, SyncStatus};

use crate::utils::parse_ts;

/// Database model for projects
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::projects)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProjectDB {
    pub id: String,
    pub name: String,
    pub client_name: String,
    pub description: Option<String>,
    pub status: String,
    pub due_date: Option<NaiveDate>,
    pub due_date_approved: Option<bool>,
    pub briefing: String,
    pub miro_board_id: Option<String>,
    pub miro_card_id: Option<String>,
    pub sync_status: String,
    pub sync_retry_count: i32,
    pub last_sync_attempt: Option<String>,
    pub last_synced_at: Option<String>,
    pub last_miro_outbound_at: Option<String>,
    pub last_miro_inbound_at: Option<String>,
    pub sync_error_message: Option<String>,
    #[diesel(skip_insertion)]
    pub created_at: NaiveDateTime,
    #[diesel(skip_insertion)]
    pub updated_at: NaiveDateTime,
}

impl From<ProjectDB> for Project {
    fn from(db: ProjectDB) -> Self {
        Self {
            status: ProjectStatus::parse(&db.status).unwrap_or_default(),
            sync_status: SyncStatus::parse(&db.sync_status).unwrap_or_default(),
            briefing: serde_json::from_str::<BriefingData>(&db.briefing).unwrap_or_default(),
            last_sync_attempt: parse_ts(&db.last_sync_attempt),
            last_synced_at: parse_ts(&db.last_synced_at),
            last_miro_outbound_at: parse_ts(&db.last_miro_outbound_at),
            last_miro_inbound_at: parse_ts(&db.last_miro_inbound_at),
            id: db.id,
            name: db.name,
            client_name: db.client_name,
            description: db.description,
            due_date: db.due_date,
            due_date_approved: db.due_date_approved,
            miro_board_id: db.miro_board_id,
            miro_card_id: db.miro_card_id,
            sync_retry_count: db.sync_retry_count,
            sync_error_message: db.sync_error_message,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewProject> for ProjectDB {
    fn from(domain: NewProject) -> Self {
        let now = Utc::now().naive_utc();
        // A project linked to a board at creation starts as pending.
        let sync_status = if domain.miro_board_id.is_some() {
            SyncStatus::Pending
        } else {
            SyncStatus::NotRequired
        };
        Self {
            id: domain.id.unwrap_or_default(),
            name: domain.name,
            client_name: domain.client_name,
            description: domain.description,
            status: domain.status.as_str().to_string(),
            due_date: domain.due_date,
            due_date_approved: domain.due_date_approved,
            briefing: serde_json::to_string(&domain.briefing).unwrap_or_else(|_| "{}".to_string()),
            miro_board_id: domain.miro_board_id,
            miro_card_id: None,
            sync_status: sync_status.as_str().to_string(),
            sync_retry_count: 0,
            last_sync_attempt: None,
            last_synced_at: None,
            last_miro_outbound_at: None,
            last_miro_inbound_at: None,
            sync_error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}
