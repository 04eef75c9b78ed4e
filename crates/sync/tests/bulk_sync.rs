//! Bulk sync enqueue under the session lock.

mod support;

use std::sync::Arc;

use atelier_core::projects::{ProjectStatus, SyncStatus};
use atelier_core::sync::{JobType, SyncJobRepositoryTrait};
use atelier_sync::{InMemoryLockStore, LockStore, SessionLockService, SyncService};

use support::{harness, make_project, Harness};

fn service_for(h: &Harness, store: Arc<dyn LockStore>) -> SyncService {
    SyncService::new(
        h.projects.clone(),
        h.jobs.clone(),
        h.mappings.clone(),
        Arc::new(SessionLockService::new(store)),
    )
}

#[tokio::test]
async fn sync_all_enqueues_project_and_board_jobs() {
    let h = harness();
    h.projects
        .insert(make_project("prj-1", "One", ProjectStatus::InProgress, Some("brd-1")));
    h.projects
        .insert(make_project("prj-2", "Two", ProjectStatus::Review, Some("brd-1")));
    h.projects
        .insert(make_project("prj-3", "Three", ProjectStatus::Review, Some("brd-2")));
    h.projects
        .insert(make_project("prj-4", "Local only", ProjectStatus::Review, None));

    let store: Arc<dyn LockStore> = Arc::new(InMemoryLockStore::new());
    let service = service_for(&h, store);

    let result = service.try_request_sync_all().await.unwrap();
    assert_eq!(result.project_jobs, 3);
    assert_eq!(result.board_jobs, 2);

    let jobs = h.jobs.list_recent_sync_jobs(100).unwrap();
    assert_eq!(
        jobs.iter().filter(|j| j.job_type == JobType::ProjectSync).count(),
        3
    );
    assert_eq!(
        jobs.iter()
            .filter(|j| j.job_type == JobType::MasterBoardSync)
            .count(),
        2
    );

    // Enqueued projects are flagged pending.
    assert_eq!(h.projects.get("prj-1").sync_status, SyncStatus::Pending);
    // The board-less project stays untouched.
    assert_eq!(h.projects.get("prj-4").sync_status, SyncStatus::NotRequired);
}

#[tokio::test]
async fn concurrent_sessions_cannot_both_fan_out() {
    let h = harness();
    h.projects
        .insert(make_project("prj-1", "One", ProjectStatus::InProgress, Some("brd-1")));

    let store: Arc<dyn LockStore> = Arc::new(InMemoryLockStore::new());
    let service_a = service_for(&h, store.clone());
    let service_b = service_for(&h, store.clone());

    // Session A holds the lock (as if mid-fan-out).
    let lock_a = Arc::new(SessionLockService::new(store.clone()));
    assert!(lock_a.try_acquire("board_sync", "sync_all"));

    let denied = service_b.try_request_sync_all().await;
    assert!(denied.is_err());

    lock_a.release("board_sync");
    assert!(service_a.try_request_sync_all().await.is_ok());
}

#[tokio::test]
async fn unsync_removes_mappings_and_board_link() {
    let h = harness();
    h.projects
        .insert(make_project("prj-1", "One", ProjectStatus::InProgress, Some("brd-1")));
    h.mappings.insert(atelier_core::mappings::MappingRecord::new(
        "brd-1",
        "prj-1",
        atelier_core::mappings::MappingItemType::TimelineCard,
        "card-1",
    ));

    let store: Arc<dyn LockStore> = Arc::new(InMemoryLockStore::new());
    let service = service_for(&h, store);

    let project = service.unsync_project("prj-1").await.unwrap();
    assert!(project.miro_board_id.is_none());
    assert!(project.miro_card_id.is_none());
    assert_eq!(project.sync_status, SyncStatus::NotRequired);
    assert!(h.mappings.all().is_empty());
}
