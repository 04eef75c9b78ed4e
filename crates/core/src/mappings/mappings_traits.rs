//! Mapping repository trait.

use async_trait::async_trait;

use crate::errors::Result;
use crate::mappings::mappings_model::{MappingItemType, MappingRecord};

/// Repository operations for canvas-object mappings.
#[async_trait]
pub trait MappingRepositoryTrait: Send + Sync {
    /// Insert a mapping, or return the existing row if `(board_id,
    /// canvas_item_id)` is already mapped. Discovery and creation race
    /// benignly under retries, so the insert must be idempotent.
    async fn upsert(&self, record: MappingRecord) -> Result<MappingRecord>;

    fn get_by_item(&self, board_id: &str, canvas_item_id: &str) -> Result<Option<MappingRecord>>;

    fn list_for_project(&self, board_id: &str, project_id: &str) -> Result<Vec<MappingRecord>>;

    /// The project's mapping of one item type (e.g. its timeline card).
    fn find_for_project(
        &self,
        board_id: &str,
        project_id: &str,
        item_type: MappingItemType,
    ) -> Result<Option<MappingRecord>>;

    async fn delete_by_item(&self, board_id: &str, canvas_item_id: &str) -> Result<usize>;

    async fn delete_for_project(&self, board_id: &str, project_id: &str) -> Result<usize>;
}
