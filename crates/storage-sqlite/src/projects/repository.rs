//! Repository for project persistence.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use atelier_core::errors::Result;
use atelier_core::projects::{
    NewProject, Project, ProjectRepositoryTrait, ProjectStatus, ProjectUpdate, SyncStatus,
};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::projects;

use super::model::ProjectDB;

pub struct ProjectRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ProjectRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    fn load(conn: &mut SqliteConnection, project_id: &str) -> Result<Project> {
        let db = projects::table
            .find(project_id)
            .select(ProjectDB::as_select())
            .first::<ProjectDB>(conn)
            .map_err(StorageError::from)?;
        Ok(db.into())
    }
}

#[async_trait]
impl ProjectRepositoryTrait for ProjectRepository {
    fn get_by_id(&self, project_id: &str) -> Result<Project> {
        let mut conn = get_connection(&self.pool)?;
        Self::load(&mut conn, project_id)
    }

    fn find_by_card(&self, board_id: &str, card_id: &str) -> Result<Option<Project>> {
        let mut conn = get_connection(&self.pool)?;
        let result = projects::table
            .filter(projects::miro_board_id.eq(board_id))
            .filter(projects::miro_card_id.eq(card_id))
            .select(ProjectDB::as_select())
            .first::<ProjectDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(result.map(Into::into))
    }

    fn list(&self) -> Result<Vec<Project>> {
        let mut conn = get_connection(&self.pool)?;
        let results = projects::table
            .select(ProjectDB::as_select())
            .order(projects::created_at.asc())
            .load::<ProjectDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    fn list_syncable(&self) -> Result<Vec<Project>> {
        let mut conn = get_connection(&self.pool)?;
        let results = projects::table
            .filter(projects::miro_board_id.is_not_null())
            .select(ProjectDB::as_select())
            .order(projects::created_at.asc())
            .load::<ProjectDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    fn list_for_board(&self, board_id: &str) -> Result<Vec<Project>> {
        let mut conn = get_connection(&self.pool)?;
        let results = projects::table
            .filter(projects::miro_board_id.eq(board_id))
            .select(ProjectDB::as_select())
            .order(projects::created_at.asc())
            .load::<ProjectDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn create(&self, new_project: NewProject) -> Result<Project> {
        new_project.validate()?;

        self.writer
            .exec(move |conn| {
                let mut db: ProjectDB = new_project.into();
                if db.id.is_empty() {
                    db.id = uuid::Uuid::new_v4().to_string();
                }

                diesel::insert_into(projects::table)
                    .values(&db)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                Self::load(conn, &db.id)
            })
            .await
    }

    async fn update(&self, update: ProjectUpdate) -> Result<Project> {
        update.validate()?;

        self.writer
            .exec(move |conn| {
                let board_changed: bool = {
                    let existing: ProjectDB = projects::table
                        .find(&update.id)
                        .select(ProjectDB::as_select())
                        .first(conn)
                        .map_err(StorageError::from)?;
                    existing.miro_board_id != update.miro_board_id
                };

                diesel::update(projects::table.find(&update.id))
                    .set((
                        projects::name.eq(&update.name),
                        projects::client_name.eq(&update.client_name),
                        projects::description.eq(&update.description),
                        projects::status.eq(update.status.as_str()),
                        projects::due_date.eq(update.due_date),
                        projects::due_date_approved.eq(update.due_date_approved),
                        projects::briefing.eq(serde_json::to_string(&update.briefing)
                            .unwrap_or_else(|_| "{}".to_string())),
                        projects::miro_board_id.eq(&update.miro_board_id),
                        projects::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                // Re-linking a board invalidates the old card linkage.
                if board_changed {
                    let (sync_status, card_id): (&str, Option<String>) =
                        if update.miro_board_id.is_some() {
                            (SyncStatus::Pending.as_str(), None)
                        } else {
                            (SyncStatus::NotRequired.as_str(), None)
                        };
                    diesel::update(projects::table.find(&update.id))
                        .set((
                            projects::sync_status.eq(sync_status),
                            projects::miro_card_id.eq(card_id),
                        ))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }

                Self::load(conn, &update.id)
            })
            .await
    }

    async fn mark_sync_started(&self, project_id: &str) -> Result<Project> {
        let id = project_id.to_string();
        self.writer
            .exec(move |conn| {
                let now = Utc::now();
                diesel::update(projects::table.find(&id))
                    .set((
                        projects::sync_status.eq(SyncStatus::Syncing.as_str()),
                        projects::last_sync_attempt.eq(Some(now.to_rfc3339())),
                        projects::updated_at.eq(now.naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Self::load(conn, &id)
            })
            .await
    }

    async fn mark_sync_succeeded(&self, project_id: &str, card_id: &str) -> Result<Project> {
        let id = project_id.to_string();
        let card = card_id.to_string();
        self.writer
            .exec(move |conn| {
                let now = Utc::now();
                diesel::update(projects::table.find(&id))
                    .set((
                        projects::sync_status.eq(SyncStatus::Synced.as_str()),
                        projects::miro_card_id.eq(Some(card)),
                        projects::last_synced_at.eq(Some(now.to_rfc3339())),
                        projects::last_miro_outbound_at.eq(Some(now.to_rfc3339())),
                        projects::sync_error_message.eq(None::<String>),
                        projects::sync_retry_count.eq(0),
                        projects::updated_at.eq(now.naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Self::load(conn, &id)
            })
            .await
    }

    async fn mark_sync_failed(&self, project_id: &str, message: &str) -> Result<Project> {
        let id = project_id.to_string();
        let message = message.to_string();
        self.writer
            .exec(move |conn| {
                let now = Utc::now();
                diesel::update(projects::table.find(&id))
                    .set((
                        projects::sync_status.eq(SyncStatus::SyncError.as_str()),
                        projects::sync_error_message.eq(Some(message)),
                        projects::sync_retry_count.eq(projects::sync_retry_count + 1),
                        projects::updated_at.eq(now.naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Self::load(conn, &id)
            })
            .await
    }

    async fn mark_sync_not_required(&self, project_id: &str) -> Result<Project> {
        let id = project_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::update(projects::table.find(&id))
                    .set((
                        projects::sync_status.eq(SyncStatus::NotRequired.as_str()),
                        projects::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Self::load(conn, &id)
            })
            .await
    }

    async fn mark_sync_pending(&self, project_id: &str, message: Option<&str>) -> Result<Project> {
        let id = project_id.to_string();
        let message = message.map(String::from);
        self.writer
            .exec(move |conn| {
                diesel::update(projects::table.find(&id))
                    .set((
                        projects::sync_status.eq(SyncStatus::Pending.as_str()),
                        projects::sync_error_message.eq(message),
                        projects::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Self::load(conn, &id)
            })
            .await
    }

    async fn apply_inbound_move(
        &self,
        project_id: &str,
        status: ProjectStatus,
        due_date: Option<NaiveDate>,
    ) -> Result<Project> {
        let id = project_id.to_string();
        self.writer
            .exec(move |conn| {
                let now = Utc::now();
                diesel::update(projects::table.find(&id))
                    .set((
                        projects::status.eq(status.as_str()),
                        projects::last_miro_inbound_at.eq(Some(now.to_rfc3339())),
                        projects::updated_at.eq(now.naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                // The due date only moves when the card carries one.
                if due_date.is_some() {
                    diesel::update(projects::table.find(&id))
                        .set(projects::due_date.eq(due_date))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }

                Self::load(conn, &id)
            })
            .await
    }

    async fn apply_inbound_briefing_field(
        &self,
        project_id: &str,
        field_key: &str,
        value: &str,
    ) -> Result<Project> {
        let id = project_id.to_string();
        let key = field_key.to_string();
        let value = value.to_string();
        self.writer
            .exec(move |conn| {
                let project = Self::load(conn, &id)?;
                let mut briefing = project.briefing;
                briefing.set(key, value);

                let now = Utc::now();
                diesel::update(projects::table.find(&id))
                    .set((
                        projects::briefing.eq(serde_json::to_string(&briefing)
                            .unwrap_or_else(|_| "{}".to_string())),
                        projects::last_miro_inbound_at.eq(Some(now.to_rfc3339())),
                        projects::updated_at.eq(now.naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                Self::load(conn, &id)
            })
            .await
    }

    async fn clear_card_link(&self, project_id: &str, reason: &str) -> Result<Project> {
        let id = project_id.to_string();
        let reason = reason.to_string();
        self.writer
            .exec(move |conn| {
                diesel::update(projects::table.find(&id))
                    .set((
                        projects::miro_card_id.eq(None::<String>),
                        projects::sync_status.eq(SyncStatus::Pending.as_str()),
                        projects::sync_error_message.eq(Some(reason)),
                        projects::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Self::load(conn, &id)
            })
            .await
    }

    async fn unlink_board(&self, project_id: &str) -> Result<Project> {
        let id = project_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::update(projects::table.find(&id))
                    .set((
                        projects::miro_board_id.eq(None::<String>),
                        projects::miro_card_id.eq(None::<String>),
                        projects::sync_status.eq(SyncStatus::NotRequired.as_str()),
                        projects::sync_error_message.eq(None::<String>),
                        projects::sync_retry_count.eq(0),
                        projects::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Self::load(conn, &id)
            })
            .await
    }
}
