//! Repository for sync audit log persistence.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;

use atelier_core::errors::Result;
use atelier_core::sync::{NewSyncLog, SyncLog, SyncLogRepositoryTrait, SyncLogStatus};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::sync_logs;

use super::model::SyncLogDB;

pub struct SyncLogRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SyncLogRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl SyncLogRepositoryTrait for SyncLogRepository {
    async fn create_sync_log(&self, new_log: NewSyncLog) -> Result<SyncLog> {
        self.writer
            .exec(move |conn| {
                let db: SyncLogDB = new_log.into();
                diesel::insert_into(sync_logs::table)
                    .values(&db)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(db.into())
            })
            .await
    }

    async fn complete_sync_log(
        &self,
        log_id: &str,
        status: SyncLogStatus,
        items_created: i32,
        items_updated: i32,
        error: Option<String>,
    ) -> Result<SyncLog> {
        let id = log_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::update(sync_logs::table.find(&id))
                    .set((
                        sync_logs::status.eq(status.as_str()),
                        sync_logs::items_created.eq(items_created),
                        sync_logs::items_updated.eq(items_updated),
                        sync_logs::error.eq(&error),
                        sync_logs::finished_at.eq(Some(Utc::now().to_rfc3339())),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let db: SyncLogDB = sync_logs::table
                    .find(&id)
                    .select(SyncLogDB::as_select())
                    .first(conn)
                    .map_err(StorageError::from)?;
                Ok(db.into())
            })
            .await
    }

    fn list_recent_sync_logs(&self, limit: i64) -> Result<Vec<SyncLog>> {
        let mut conn = get_connection(&self.pool)?;
        let results = sync_logs::table
            .order(sync_logs::started_at.desc())
            .limit(limit)
            .select(SyncLogDB::as_select())
            .load::<SyncLogDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(results.into_iter().map(Into::into).collect())
    }
}
