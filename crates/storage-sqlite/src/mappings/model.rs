//! Database model for board mappings.

use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use atelier_core::mappings::{MappingItemType, MappingRecord};

use crate::utils::parse_ts;

#[derive(
    Queryable, Identifiable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::board_mappings)]
#[diesel(primary_key(board_id, canvas_item_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MappingRecordDB {
    pub board_id: String,
    pub project_id: String,
    pub item_type: String,
    pub canvas_item_id: String,
    pub field_key: Option<String>,
    pub version_number: Option<i32>,
    pub created_at: String,
}

impl From<MappingRecordDB> for MappingRecord {
    fn from(db: MappingRecordDB) -> Self {
        Self {
            item_type: MappingItemType::parse(&db.item_type)
                .unwrap_or(MappingItemType::TimelineCard),
            created_at: parse_ts(&Some(db.created_at.clone())).unwrap_or_else(Utc::now),
            board_id: db.board_id,
            project_id: db.project_id,
            canvas_item_id: db.canvas_item_id,
            field_key: db.field_key,
            version_number: db.version_number,
        }
    }
}

impl From<MappingRecord> for MappingRecordDB {
    fn from(domain: MappingRecord) -> Self {
        Self {
            board_id: domain.board_id,
            project_id: domain.project_id,
            item_type: domain.item_type.as_str().to_string(),
            canvas_item_id: domain.canvas_item_id,
            field_key: domain.field_key,
            version_number: domain.version_number,
            created_at: domain.created_at.to_rfc3339(),
        }
    }
}
