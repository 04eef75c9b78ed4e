//! In-memory fakes for exercising the sync worker end to end.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use atelier_core::errors::{DatabaseError, Error, Result};
use atelier_core::mappings::{MappingItemType, MappingRecord, MappingRepositoryTrait};
use atelier_core::projects::{
    BriefingData, NewProject, Project, ProjectRepositoryTrait, ProjectStatus, ProjectUpdate,
    SyncStatus,
};
use atelier_core::sync::{
    JobStatus, NewSyncJob, NewSyncLog, SyncJob, SyncJobRepositoryTrait, SyncLog,
    SyncLogRepositoryTrait, SyncLogStatus, DEFAULT_MAX_ATTEMPTS,
};
use atelier_miro::error::Result as MiroResult;
use atelier_miro::types::*;
use atelier_miro::MiroError;
use atelier_sync::{BoardApiClient, BoardClientFactory, SyncWorker, SyncWorkerDeps};

fn not_found(what: &str) -> Error {
    Error::Database(DatabaseError::NotFound(what.to_string()))
}

// ============================================================================
// Projects
// ============================================================================

#[derive(Default)]
pub struct InMemoryProjects {
    inner: Mutex<HashMap<String, Project>>,
}

impl InMemoryProjects {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, project: Project) {
        self.inner.lock().unwrap().insert(project.id.clone(), project);
    }

    pub fn get(&self, id: &str) -> Project {
        self.inner.lock().unwrap().get(id).cloned().expect("project exists")
    }

    fn with_project<T>(&self, id: &str, f: impl FnOnce(&mut Project) -> T) -> Result<T> {
        let mut inner = self.inner.lock().unwrap();
        let project = inner.get_mut(id).ok_or_else(|| not_found(id))?;
        let value = f(project);
        project.updated_at = Utc::now().naive_utc();
        Ok(value)
    }

    fn cloned(&self, id: &str) -> Result<Project> {
        self.inner
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }
}

#[async_trait]
impl ProjectRepositoryTrait for InMemoryProjects {
    fn get_by_id(&self, project_id: &str) -> Result<Project> {
        self.cloned(project_id)
    }

    fn find_by_card(&self, board_id: &str, card_id: &str) -> Result<Option<Project>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .values()
            .find(|p| {
                p.miro_board_id.as_deref() == Some(board_id)
                    && p.miro_card_id.as_deref() == Some(card_id)
            })
            .cloned())
    }

    fn list(&self) -> Result<Vec<Project>> {
        Ok(self.inner.lock().unwrap().values().cloned().collect())
    }

    fn list_syncable(&self) -> Result<Vec<Project>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.has_board())
            .cloned()
            .collect())
    }

    fn list_for_board(&self, board_id: &str) -> Result<Vec<Project>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.miro_board_id.as_deref() == Some(board_id))
            .cloned()
            .collect())
    }

    async fn create(&self, new_project: NewProject) -> Result<Project> {
        let project = make_project(
            &new_project.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            &new_project.name,
            new_project.status,
            new_project.miro_board_id.as_deref(),
        );
        self.insert(project.clone());
        Ok(project)
    }

    async fn update(&self, update: ProjectUpdate) -> Result<Project> {
        self.with_project(&update.id.clone(), move |p| {
            p.name = update.name.clone();
            p.status = update.status;
            p.due_date = update.due_date;
            p.due_date_approved = update.due_date_approved;
            p.briefing = update.briefing.clone();
            p.miro_board_id = update.miro_board_id.clone();
            p.clone()
        })
    }

    async fn mark_sync_started(&self, project_id: &str) -> Result<Project> {
        self.with_project(project_id, |p| {
            p.sync_status = SyncStatus::Syncing;
            p.last_sync_attempt = Some(Utc::now());
            p.clone()
        })
    }

    async fn mark_sync_succeeded(&self, project_id: &str, card_id: &str) -> Result<Project> {
        self.with_project(project_id, |p| {
            let now = Utc::now();
            p.sync_status = SyncStatus::Synced;
            p.miro_card_id = Some(card_id.to_string());
            p.last_synced_at = Some(now);
            p.last_miro_outbound_at = Some(now);
            p.sync_error_message = None;
            p.sync_retry_count = 0;
            p.clone()
        })
    }

    async fn mark_sync_failed(&self, project_id: &str, message: &str) -> Result<Project> {
        self.with_project(project_id, |p| {
            p.sync_status = SyncStatus::SyncError;
            p.sync_error_message = Some(message.to_string());
            p.sync_retry_count += 1;
            p.clone()
        })
    }

    async fn mark_sync_not_required(&self, project_id: &str) -> Result<Project> {
        self.with_project(project_id, |p| {
            p.sync_status = SyncStatus::NotRequired;
            p.clone()
        })
    }

    async fn mark_sync_pending(&self, project_id: &str, message: Option<&str>) -> Result<Project> {
        self.with_project(project_id, |p| {
            p.sync_status = SyncStatus::Pending;
            p.sync_error_message = message.map(String::from);
            p.clone()
        })
    }

    async fn apply_inbound_move(
        &self,
        project_id: &str,
        status: ProjectStatus,
        due_date: Option<NaiveDate>,
    ) -> Result<Project> {
        self.with_project(project_id, |p| {
            p.status = status;
            if due_date.is_some() {
                p.due_date = due_date;
            }
            p.last_miro_inbound_at = Some(Utc::now());
            p.clone()
        })
    }

    async fn apply_inbound_briefing_field(
        &self,
        project_id: &str,
        field_key: &str,
        value: &str,
    ) -> Result<Project> {
        self.with_project(project_id, |p| {
            p.briefing.set(field_key, value);
            p.last_miro_inbound_at = Some(Utc::now());
            p.clone()
        })
    }

    async fn clear_card_link(&self, project_id: &str, reason: &str) -> Result<Project> {
        self.with_project(project_id, |p| {
            p.miro_card_id = None;
            p.sync_status = SyncStatus::Pending;
            p.sync_error_message = Some(reason.to_string());
            p.clone()
        })
    }

    async fn unlink_board(&self, project_id: &str) -> Result<Project> {
        self.with_project(project_id, |p| {
            p.miro_board_id = None;
            p.miro_card_id = None;
            p.sync_status = SyncStatus::NotRequired;
            p.sync_error_message = None;
            p.sync_retry_count = 0;
            p.clone()
        })
    }
}

// ============================================================================
// Jobs
// ============================================================================

#[derive(Default)]
pub struct InMemoryJobs {
    inner: Mutex<Vec<SyncJob>>,
}

impl InMemoryJobs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn job(&self, id: &str) -> SyncJob {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .find(|j| j.id == id)
            .cloned()
            .expect("job exists")
    }

    /// Test helper: drop a job's retry visibility marker so it can be
    /// claimed immediately.
    pub fn make_claimable(&self, id: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(job) = inner.iter_mut().find(|j| j.id == id) {
            job.run_after = None;
        }
    }
}

#[async_trait]
impl SyncJobRepositoryTrait for InMemoryJobs {
    async fn enqueue_sync_job(&self, new_job: NewSyncJob) -> Result<SyncJob> {
        let now = Utc::now();
        let job = SyncJob {
            id: uuid::Uuid::new_v4().to_string(),
            job_type: new_job.job_type,
            status: JobStatus::Queued,
            project_id: new_job.project_id,
            board_id: new_job.board_id,
            payload: new_job.payload,
            attempt_count: 0,
            max_attempts: new_job.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            worker_id: None,
            run_after: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        };
        self.inner.lock().unwrap().push(job.clone());
        Ok(job)
    }

    async fn claim_next_sync_job(&self, worker_id: &str) -> Result<Option<SyncJob>> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let candidate = inner
            .iter_mut()
            .filter(|j| j.status == JobStatus::Queued)
            .filter(|j| j.attempt_count < j.max_attempts)
            .filter(|j| j.run_after.map(|r| r <= now).unwrap_or(true))
            .min_by_key(|j| j.created_at);

        Ok(candidate.map(|job| {
            job.status = JobStatus::Running;
            job.attempt_count += 1;
            job.worker_id = Some(worker_id.to_string());
            job.updated_at = now;
            job.clone()
        }))
    }

    async fn claim_sync_job_by_id(
        &self,
        job_id: &str,
        worker_id: &str,
    ) -> Result<Option<SyncJob>> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let candidate = inner
            .iter_mut()
            .find(|j| j.id == job_id)
            .filter(|j| j.status == JobStatus::Queued)
            .filter(|j| j.attempt_count < j.max_attempts);

        Ok(candidate.map(|job| {
            job.status = JobStatus::Running;
            job.attempt_count += 1;
            job.worker_id = Some(worker_id.to_string());
            job.updated_at = now;
            job.clone()
        }))
    }

    async fn complete_sync_job(
        &self,
        job_id: &str,
        success: bool,
        error: Option<String>,
    ) -> Result<SyncJob> {
        let mut inner = self.inner.lock().unwrap();
        let job = inner
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or_else(|| not_found(job_id))?;
        job.status = if success {
            JobStatus::Succeeded
        } else {
            JobStatus::Failed
        };
        job.last_error = error;
        job.run_after = None;
        job.updated_at = Utc::now();
        Ok(job.clone())
    }

    async fn fail_sync_job(
        &self,
        job_id: &str,
        error: &str,
        retry_delay: Duration,
    ) -> Result<SyncJob> {
        let mut inner = self.inner.lock().unwrap();
        let job = inner
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or_else(|| not_found(job_id))?;
        let now = Utc::now();
        if job.attempt_count >= job.max_attempts {
            job.status = JobStatus::Failed;
            job.run_after = None;
        } else {
            job.status = JobStatus::Queued;
            job.worker_id = None;
            job.run_after =
                Some(now + chrono::Duration::from_std(retry_delay).unwrap_or_default());
        }
        job.last_error = Some(error.to_string());
        job.updated_at = now;
        Ok(job.clone())
    }

    fn get_sync_job(&self, job_id: &str) -> Result<Option<SyncJob>> {
        Ok(self.inner.lock().unwrap().iter().find(|j| j.id == job_id).cloned())
    }

    fn list_recent_sync_jobs(&self, limit: i64) -> Result<Vec<SyncJob>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.iter().rev().take(limit as usize).cloned().collect())
    }
}

// ============================================================================
// Logs
// ============================================================================

#[derive(Default)]
pub struct InMemoryLogs {
    inner: Mutex<Vec<SyncLog>>,
}

impl InMemoryLogs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn all(&self) -> Vec<SyncLog> {
        self.inner.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncLogRepositoryTrait for InMemoryLogs {
    async fn create_sync_log(&self, new_log: NewSyncLog) -> Result<SyncLog> {
        let log = SyncLog {
            id: uuid::Uuid::new_v4().to_string(),
            job_id: new_log.job_id,
            project_id: new_log.project_id,
            board_id: new_log.board_id,
            operation: new_log.operation,
            status: SyncLogStatus::Running,
            items_created: 0,
            items_updated: 0,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        };
        self.inner.lock().unwrap().push(log.clone());
        Ok(log)
    }

    async fn complete_sync_log(
        &self,
        log_id: &str,
        status: SyncLogStatus,
        items_created: i32,
        items_updated: i32,
        error: Option<String>,
    ) -> Result<SyncLog> {
        let mut inner = self.inner.lock().unwrap();
        let log = inner
            .iter_mut()
            .find(|l| l.id == log_id)
            .ok_or_else(|| not_found(log_id))?;
        log.status = status;
        log.items_created = items_created;
        log.items_updated = items_updated;
        log.error = error;
        log.finished_at = Some(Utc::now());
        Ok(log.clone())
    }

    fn list_recent_sync_logs(&self, limit: i64) -> Result<Vec<SyncLog>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.iter().rev().take(limit as usize).cloned().collect())
    }
}

// ============================================================================
// Mappings
// ============================================================================

#[derive(Default)]
pub struct InMemoryMappings {
    inner: Mutex<Vec<MappingRecord>>,
}

impl InMemoryMappings {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn all(&self) -> Vec<MappingRecord> {
        self.inner.lock().unwrap().clone()
    }

    pub fn insert(&self, record: MappingRecord) {
        self.inner.lock().unwrap().push(record);
    }
}

#[async_trait]
impl MappingRepositoryTrait for InMemoryMappings {
    async fn upsert(&self, record: MappingRecord) -> Result<MappingRecord> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner
            .iter()
            .find(|m| m.board_id == record.board_id && m.canvas_item_id == record.canvas_item_id)
        {
            return Ok(existing.clone());
        }
        inner.push(record.clone());
        Ok(record)
    }

    fn get_by_item(&self, board_id: &str, canvas_item_id: &str) -> Result<Option<MappingRecord>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.board_id == board_id && m.canvas_item_id == canvas_item_id)
            .cloned())
    }

    fn list_for_project(&self, board_id: &str, project_id: &str) -> Result<Vec<MappingRecord>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.board_id == board_id && m.project_id == project_id)
            .cloned()
            .collect())
    }

    fn find_for_project(
        &self,
        board_id: &str,
        project_id: &str,
        item_type: MappingItemType,
    ) -> Result<Option<MappingRecord>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .iter()
            .find(|m| {
                m.board_id == board_id && m.project_id == project_id && m.item_type == item_type
            })
            .cloned())
    }

    async fn delete_by_item(&self, board_id: &str, canvas_item_id: &str) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.len();
        inner.retain(|m| !(m.board_id == board_id && m.canvas_item_id == canvas_item_id));
        Ok(before - inner.len())
    }

    async fn delete_for_project(&self, board_id: &str, project_id: &str) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.len();
        inner.retain(|m| !(m.board_id == board_id && m.project_id == project_id));
        Ok(before - inner.len())
    }
}

// ============================================================================
// Fake board
// ============================================================================

#[derive(Default)]
pub struct BoardState {
    pub frames: Vec<Frame>,
    pub cards: Vec<Card>,
    pub shapes: Vec<Shape>,
    pub texts: Vec<TextItem>,
    next_id: u64,
    /// When set, `get_board` fails with this HTTP status.
    pub fail_get_board: Option<u16>,
}

impl BoardState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

pub struct FakeBoard {
    state: Mutex<BoardState>,
}

impl FakeBoard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(BoardState::default()),
        })
    }

    pub fn set_fail_get_board(&self, status: Option<u16>) {
        self.state.lock().unwrap().fail_get_board = status;
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.state.lock().unwrap().frames.clone()
    }

    pub fn cards(&self) -> Vec<Card> {
        self.state.lock().unwrap().cards.clone()
    }

    pub fn shapes(&self) -> Vec<Shape> {
        self.state.lock().unwrap().shapes.clone()
    }

    /// Simulate a user dragging a card to a new position.
    pub fn move_card(&self, card_id: &str, x: f64, y: f64) {
        let mut state = self.state.lock().unwrap();
        if let Some(card) = state.cards.iter_mut().find(|c| c.id == card_id) {
            card.position = Some(Position::new(x, y));
        }
    }

    /// Simulate a user editing a shape's content.
    pub fn edit_shape(&self, shape_id: &str, content: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(shape) = state.shapes.iter_mut().find(|s| s.id == shape_id) {
            shape.data.content = Some(content.to_string());
        }
    }

    /// Simulate a user deleting a card.
    pub fn delete_card(&self, card_id: &str) {
        self.state.lock().unwrap().cards.retain(|c| c.id != card_id);
    }

    /// Simulate a user setting a card's due date (RFC 3339).
    pub fn set_card_due_date(&self, card_id: &str, due: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(card) = state.cards.iter_mut().find(|c| c.id == card_id) {
            card.data.due_date = chrono::DateTime::parse_from_rfc3339(due)
                .ok()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }
}

#[async_trait]
impl BoardApiClient for FakeBoard {
    async fn get_board(&self, board_id: &str) -> MiroResult<Board> {
        let state = self.state.lock().unwrap();
        if let Some(status) = state.fail_get_board {
            return Err(MiroError::from_status(status, "injected failure"));
        }
        Ok(Board {
            id: board_id.to_string(),
            name: Some("Studio board".to_string()),
            description: None,
        })
    }

    async fn list_frames(&self, _board_id: &str) -> MiroResult<Vec<Frame>> {
        Ok(self.state.lock().unwrap().frames.clone())
    }

    async fn create_frame(&self, _board_id: &str, request: CreateFrameRequest) -> MiroResult<Frame> {
        let mut state = self.state.lock().unwrap();
        let frame = Frame {
            id: state.next_id("frame"),
            data: request.data,
            position: Some(request.position),
            geometry: request.geometry,
        };
        state.frames.push(frame.clone());
        Ok(frame)
    }

    async fn list_cards(&self, _board_id: &str) -> MiroResult<Vec<Card>> {
        Ok(self.state.lock().unwrap().cards.clone())
    }

    async fn create_card(&self, _board_id: &str, request: CreateCardRequest) -> MiroResult<Card> {
        let mut state = self.state.lock().unwrap();
        let card = Card {
            id: state.next_id("card"),
            data: request.data,
            position: Some(request.position),
            geometry: request.geometry,
        };
        state.cards.push(card.clone());
        Ok(card)
    }

    async fn update_card(
        &self,
        _board_id: &str,
        card_id: &str,
        request: UpdateCardRequest,
    ) -> MiroResult<Card> {
        let mut state = self.state.lock().unwrap();
        let card = state
            .cards
            .iter_mut()
            .find(|c| c.id == card_id)
            .ok_or_else(|| MiroError::from_status(404, "card not found"))?;
        if let Some(data) = request.data {
            card.data = data;
        }
        if let Some(position) = request.position {
            card.position = Some(position);
        }
        Ok(card.clone())
    }

    async fn create_shape(&self, _board_id: &str, request: CreateShapeRequest) -> MiroResult<Shape> {
        let mut state = self.state.lock().unwrap();
        let shape = Shape {
            id: state.next_id("shape"),
            data: request.data,
            style: request.style,
            position: Some(request.position),
            geometry: request.geometry,
        };
        state.shapes.push(shape.clone());
        Ok(shape)
    }

    async fn update_shape(
        &self,
        _board_id: &str,
        shape_id: &str,
        request: UpdateShapeRequest,
    ) -> MiroResult<Shape> {
        let mut state = self.state.lock().unwrap();
        let shape = state
            .shapes
            .iter_mut()
            .find(|s| s.id == shape_id)
            .ok_or_else(|| MiroError::from_status(404, "shape not found"))?;
        if let Some(data) = request.data {
            shape.data = data;
        }
        if let Some(style) = request.style {
            shape.style = Some(style);
        }
        Ok(shape.clone())
    }

    async fn create_text(
        &self,
        _board_id: &str,
        request: CreateTextRequest,
    ) -> MiroResult<TextItem> {
        let mut state = self.state.lock().unwrap();
        let text = TextItem {
            id: state.next_id("text"),
            data: request.data,
            position: Some(request.position),
        };
        state.texts.push(text.clone());
        Ok(text)
    }

    async fn get_item(&self, _board_id: &str, item_id: &str) -> MiroResult<BoardItem> {
        let state = self.state.lock().unwrap();

        if let Some(card) = state.cards.iter().find(|c| c.id == item_id) {
            let mut data = serde_json::json!({
                "title": card.data.title,
                "description": card.data.description,
            });
            if let Some(due) = card.data.due_date {
                data["dueDate"] = serde_json::json!(due.to_rfc3339());
            }
            return Ok(BoardItem {
                id: card.id.clone(),
                item_type: "card".to_string(),
                data,
                position: card.position,
            });
        }

        if let Some(shape) = state.shapes.iter().find(|s| s.id == item_id) {
            return Ok(BoardItem {
                id: shape.id.clone(),
                item_type: "shape".to_string(),
                data: serde_json::json!({ "content": shape.data.content }),
                position: shape.position,
            });
        }

        Err(MiroError::from_status(404, "item not found"))
    }
}

pub struct FakeBoardFactory {
    board: Arc<FakeBoard>,
}

impl FakeBoardFactory {
    pub fn new(board: Arc<FakeBoard>) -> Arc<Self> {
        Arc::new(Self { board })
    }
}

impl BoardClientFactory for FakeBoardFactory {
    fn create(&self, access_token: &str) -> MiroResult<Arc<dyn BoardApiClient>> {
        atelier_miro::sanitize_access_token(access_token)?;
        Ok(self.board.clone())
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn make_project(
    id: &str,
    name: &str,
    status: ProjectStatus,
    board_id: Option<&str>,
) -> Project {
    let now = Utc::now();
    Project {
        id: id.to_string(),
        name: name.to_string(),
        client_name: "Acme".to_string(),
        description: Some("Spring campaign refresh".to_string()),
        status,
        due_date: None,
        due_date_approved: None,
        briefing: BriefingData::default(),
        miro_board_id: board_id.map(String::from),
        miro_card_id: None,
        sync_status: if board_id.is_some() {
            SyncStatus::Pending
        } else {
            SyncStatus::NotRequired
        },
        sync_retry_count: 0,
        last_sync_attempt: None,
        last_synced_at: None,
        last_miro_outbound_at: None,
        last_miro_inbound_at: None,
        sync_error_message: None,
        created_at: now.naive_utc(),
        updated_at: now.naive_utc(),
    }
}

pub struct Harness {
    pub projects: Arc<InMemoryProjects>,
    pub jobs: Arc<InMemoryJobs>,
    pub logs: Arc<InMemoryLogs>,
    pub mappings: Arc<InMemoryMappings>,
    pub board: Arc<FakeBoard>,
    pub worker: SyncWorker,
}

pub fn harness() -> Harness {
    harness_with_fallback_token(None)
}

pub fn harness_with_fallback_token(fallback_token: Option<&str>) -> Harness {
    let projects = InMemoryProjects::new();
    let jobs = InMemoryJobs::new();
    let logs = InMemoryLogs::new();
    let mappings = InMemoryMappings::new();
    let board = FakeBoard::new();

    let deps = SyncWorkerDeps {
        projects: projects.clone(),
        jobs: jobs.clone(),
        logs: logs.clone(),
        mappings: mappings.clone(),
        boards: FakeBoardFactory::new(board.clone()),
    };
    let worker = SyncWorker::new(deps, fallback_token.map(String::from));

    Harness {
        projects,
        jobs,
        logs,
        mappings,
        board,
        worker,
    }
}
