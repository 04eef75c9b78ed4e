//! Integration tests for project sync-state transitions and mappings.

use std::sync::Arc;

use tempfile::TempDir;

use atelier_core::mappings::{MappingItemType, MappingRecord, MappingRepositoryTrait};
use atelier_core::projects::{NewProject, ProjectRepositoryTrait, ProjectStatus, SyncStatus};
use atelier_storage_sqlite::db::{self, spawn_writer, DbPool, WriteHandle};
use atelier_storage_sqlite::mappings::MappingRepository;
use atelier_storage_sqlite::projects::ProjectRepository;

fn setup(tmp: &TempDir) -> (Arc<DbPool>, WriteHandle) {
    let db_path = tmp.path().join("atelier.db");
    let db_path = db_path.to_str().unwrap();

    db::init(db_path).unwrap();
    let pool = db::create_pool(db_path).unwrap();
    db::run_migrations(&pool).unwrap();
    let writer = spawn_writer(pool.clone());
    (pool, writer)
}

fn new_project(board: Option<&str>) -> NewProject {
    NewProject {
        id: None,
        name: "Brand refresh".to_string(),
        client_name: "Acme".to_string(),
        description: None,
        status: ProjectStatus::Review,
        due_date: None,
        due_date_approved: None,
        briefing: Default::default(),
        miro_board_id: board.map(String::from),
    }
}

#[tokio::test]
async fn linked_project_starts_pending() {
    let tmp = TempDir::new().unwrap();
    let (pool, writer) = setup(&tmp);
    let repo = ProjectRepository::new(pool, writer);

    let linked = repo.create(new_project(Some("brd-1"))).await.unwrap();
    assert_eq!(linked.sync_status, SyncStatus::Pending);

    let unlinked = repo.create(new_project(None)).await.unwrap();
    assert_eq!(unlinked.sync_status, SyncStatus::NotRequired);
}

#[tokio::test]
async fn sync_lifecycle_transitions() {
    let tmp = TempDir::new().unwrap();
    let (pool, writer) = setup(&tmp);
    let repo = ProjectRepository::new(pool, writer);

    let project = repo.create(new_project(Some("brd-1"))).await.unwrap();

    let syncing = repo.mark_sync_started(&project.id).await.unwrap();
    assert_eq!(syncing.sync_status, SyncStatus::Syncing);
    assert!(syncing.last_sync_attempt.is_some());

    let synced = repo.mark_sync_succeeded(&project.id, "card-7").await.unwrap();
    assert_eq!(synced.sync_status, SyncStatus::Synced);
    assert_eq!(synced.miro_card_id.as_deref(), Some("card-7"));
    assert!(synced.last_synced_at.is_some());
    assert!(synced.last_miro_outbound_at.is_some());
    assert_eq!(synced.sync_retry_count, 0);
    assert!(synced.sync_error_message.is_none());

    let failed = repo
        .mark_sync_failed(&project.id, "credential expired")
        .await
        .unwrap();
    assert_eq!(failed.sync_status, SyncStatus::SyncError);
    assert_eq!(failed.sync_error_message.as_deref(), Some("credential expired"));
    assert_eq!(failed.sync_retry_count, 1);
}

#[tokio::test]
async fn inbound_move_updates_status_and_stamps_inbound() {
    let tmp = TempDir::new().unwrap();
    let (pool, writer) = setup(&tmp);
    let repo = ProjectRepository::new(pool, writer);

    let project = repo.create(new_project(Some("brd-1"))).await.unwrap();
    repo.mark_sync_succeeded(&project.id, "card-7").await.unwrap();

    let moved = repo
        .apply_inbound_move(&project.id, ProjectStatus::Done, None)
        .await
        .unwrap();
    assert_eq!(moved.status, ProjectStatus::Done);
    assert!(moved.last_miro_inbound_at.is_some());

    let found = repo.find_by_card("brd-1", "card-7").unwrap().unwrap();
    assert_eq!(found.id, project.id);
}

#[tokio::test]
async fn clear_card_link_resets_to_pending() {
    let tmp = TempDir::new().unwrap();
    let (pool, writer) = setup(&tmp);
    let repo = ProjectRepository::new(pool, writer);

    let project = repo.create(new_project(Some("brd-1"))).await.unwrap();
    repo.mark_sync_succeeded(&project.id, "card-7").await.unwrap();

    let cleared = repo
        .clear_card_link(&project.id, "Card was deleted on the board")
        .await
        .unwrap();
    assert_eq!(cleared.sync_status, SyncStatus::Pending);
    assert!(cleared.miro_card_id.is_none());
    assert_eq!(
        cleared.sync_error_message.as_deref(),
        Some("Card was deleted on the board")
    );
}

#[tokio::test]
async fn mapping_upsert_is_idempotent_per_canvas_item() {
    let tmp = TempDir::new().unwrap();
    let (pool, writer) = setup(&tmp);
    let repo = MappingRepository::new(pool, writer);

    let record = MappingRecord::new("brd-1", "prj-1", MappingItemType::TimelineCard, "card-7");
    let first = repo.upsert(record.clone()).await.unwrap();
    let second = repo.upsert(record).await.unwrap();
    assert_eq!(first.canvas_item_id, second.canvas_item_id);
    assert_eq!(first.created_at, second.created_at);

    let found = repo.get_by_item("brd-1", "card-7").unwrap().unwrap();
    assert_eq!(found.project_id, "prj-1");
    assert_eq!(found.item_type, MappingItemType::TimelineCard);
}

#[tokio::test]
async fn mappings_are_deleted_with_the_project_scope() {
    let tmp = TempDir::new().unwrap();
    let (pool, writer) = setup(&tmp);
    let repo = MappingRepository::new(pool, writer);

    repo.upsert(MappingRecord::new(
        "brd-1",
        "prj-1",
        MappingItemType::TimelineCard,
        "card-7",
    ))
    .await
    .unwrap();
    repo.upsert(
        MappingRecord::new("brd-1", "prj-1", MappingItemType::BriefingField, "shape-1")
            .with_field_key("objective"),
    )
    .await
    .unwrap();
    repo.upsert(MappingRecord::new(
        "brd-1",
        "prj-2",
        MappingItemType::TimelineCard,
        "card-8",
    ))
    .await
    .unwrap();

    let deleted = repo.delete_for_project("brd-1", "prj-1").await.unwrap();
    assert_eq!(deleted, 2);
    assert!(repo.get_by_item("brd-1", "card-7").unwrap().is_none());
    assert!(repo.get_by_item("brd-1", "card-8").unwrap().is_some());
}
