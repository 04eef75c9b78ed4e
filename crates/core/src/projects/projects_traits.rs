//! Project repository trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::Result;
use crate::projects::projects_model::{NewProject, Project, ProjectStatus, ProjectUpdate};

/// Repository operations for projects.
///
/// The sync-state mutators are deliberately narrow: the sync worker drives
/// the project record through a small set of transitions, and each one is a
/// single targeted write rather than a whole-record update.
#[async_trait]
pub trait ProjectRepositoryTrait: Send + Sync {
    fn get_by_id(&self, project_id: &str) -> Result<Project>;

    /// Find the project that owns a given card on a board.
    fn find_by_card(&self, board_id: &str, card_id: &str) -> Result<Option<Project>>;

    fn list(&self) -> Result<Vec<Project>>;

    /// Projects linked to any board (candidates for a bulk sync).
    fn list_syncable(&self) -> Result<Vec<Project>>;

    /// Projects linked to one specific board.
    fn list_for_board(&self, board_id: &str) -> Result<Vec<Project>>;

    async fn create(&self, new_project: NewProject) -> Result<Project>;

    async fn update(&self, update: ProjectUpdate) -> Result<Project>;

    /// Transition to `syncing` and stamp `last_sync_attempt`.
    async fn mark_sync_started(&self, project_id: &str) -> Result<Project>;

    /// Transition to `synced`: store the card id, stamp `last_synced_at` and
    /// `last_miro_outbound_at`, clear the error message, reset the retry count.
    async fn mark_sync_succeeded(&self, project_id: &str, card_id: &str) -> Result<Project>;

    /// Transition to `sync_error` with an operator-visible message and bump
    /// the retry count.
    async fn mark_sync_failed(&self, project_id: &str, message: &str) -> Result<Project>;

    /// Transition to `not_required` (no board linked).
    async fn mark_sync_not_required(&self, project_id: &str) -> Result<Project>;

    /// Transition to `pending`, optionally recording why.
    async fn mark_sync_pending(&self, project_id: &str, message: Option<&str>) -> Result<Project>;

    /// Apply a genuine inbound card move: new status, optional due date, and
    /// stamp `last_miro_inbound_at`.
    async fn apply_inbound_move(
        &self,
        project_id: &str,
        status: ProjectStatus,
        due_date: Option<NaiveDate>,
    ) -> Result<Project>;

    /// Apply a genuine inbound briefing-field edit and stamp
    /// `last_miro_inbound_at`.
    async fn apply_inbound_briefing_field(
        &self,
        project_id: &str,
        field_key: &str,
        value: &str,
    ) -> Result<Project>;

    /// Drop the card linkage (the card was deleted on the board) and mark the
    /// project `pending` with an explanatory message.
    async fn clear_card_link(&self, project_id: &str, reason: &str) -> Result<Project>;

    /// Remove the board linkage entirely and reset sync state.
    async fn unlink_board(&self, project_id: &str) -> Result<Project>;
}
