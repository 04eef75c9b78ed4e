//! Repository for board mapping persistence.

use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;

use atelier_core::errors::Result;
use atelier_core::mappings::{MappingItemType, MappingRecord, MappingRepositoryTrait};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::board_mappings;

use super::model::MappingRecordDB;

pub struct MappingRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl MappingRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl MappingRepositoryTrait for MappingRepository {
    async fn upsert(&self, record: MappingRecord) -> Result<MappingRecord> {
        self.writer
            .exec(move |conn| {
                let db: MappingRecordDB = record.into();

                // Re-discovery of an already-mapped object is not an error;
                // keep the first row (the canvas item id is stable).
                diesel::insert_into(board_mappings::table)
                    .values(&db)
                    .on_conflict((board_mappings::board_id, board_mappings::canvas_item_id))
                    .do_nothing()
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let stored: MappingRecordDB = board_mappings::table
                    .find((&db.board_id, &db.canvas_item_id))
                    .select(MappingRecordDB::as_select())
                    .first(conn)
                    .map_err(StorageError::from)?;
                Ok(stored.into())
            })
            .await
    }

    fn get_by_item(&self, board_id: &str, canvas_item_id: &str) -> Result<Option<MappingRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let result = board_mappings::table
            .find((board_id, canvas_item_id))
            .select(MappingRecordDB::as_select())
            .first::<MappingRecordDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(result.map(Into::into))
    }

    fn list_for_project(&self, board_id: &str, project_id: &str) -> Result<Vec<MappingRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let results = board_mappings::table
            .filter(board_mappings::board_id.eq(board_id))
            .filter(board_mappings::project_id.eq(project_id))
            .select(MappingRecordDB::as_select())
            .load::<MappingRecordDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    fn find_for_project(
        &self,
        board_id: &str,
        project_id: &str,
        item_type: MappingItemType,
    ) -> Result<Option<MappingRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let result = board_mappings::table
            .filter(board_mappings::board_id.eq(board_id))
            .filter(board_mappings::project_id.eq(project_id))
            .filter(board_mappings::item_type.eq(item_type.as_str()))
            .select(MappingRecordDB::as_select())
            .first::<MappingRecordDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(result.map(Into::into))
    }

    async fn delete_by_item(&self, board_id: &str, canvas_item_id: &str) -> Result<usize> {
        let board = board_id.to_string();
        let item = canvas_item_id.to_string();
        self.writer
            .exec(move |conn| {
                let affected = diesel::delete(board_mappings::table.find((&board, &item)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(affected)
            })
            .await
    }

    async fn delete_for_project(&self, board_id: &str, project_id: &str) -> Result<usize> {
        let board = board_id.to_string();
        let project = project_id.to_string();
        self.writer
            .exec(move |conn| {
                let affected = diesel::delete(
                    board_mappings::table
                        .filter(board_mappings::board_id.eq(&board))
                        .filter(board_mappings::project_id.eq(&project)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(affected)
            })
            .await
    }
}
