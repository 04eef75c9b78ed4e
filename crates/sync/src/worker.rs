//! The sync worker: claims jobs and executes them against the board.
//!
//! One worker invocation processes up to N jobs in a sequential loop; there
//! is no intra-invocation parallelism across jobs, so board writes stay
//! ordered per board. Multiple invocations may run concurrently - mutual
//! exclusion across jobs comes solely from the job store's atomic claim.

use std::sync::Arc;

use chrono::{NaiveTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;

use atelier_core::errors::{DatabaseError, Error};
use atelier_core::mappings::{MappingItemType, MappingRecord, MappingRepositoryTrait};
use atelier_core::projects::{
    derive_timeline_column, Project, ProjectRepositoryTrait, BRIEFING_FIELDS,
};
use atelier_core::sync::{
    retry_delay, JobStatus, JobType, NewSyncLog, SyncJob, SyncJobRepositoryTrait,
    SyncLogRepositoryTrait, SyncLogStatus,
};
use atelier_miro::types::{
    Card, CardData, CreateCardRequest, CreateFrameRequest, CreateShapeRequest, Frame, FrameData,
    Parent, ShapeData, UpdateCardRequest, UpdateShapeRequest,
};
use atelier_miro::{BatchQueue, MiroError, RetryClass};

use crate::briefing;
use crate::echo::EchoSuppressor;
use crate::identity;
use crate::inbound::{self, CanvasEvent, CanvasEventType};
use crate::layout;
use crate::traits::{BoardApiClient, BoardClientFactory};

/// How a processed job ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobResultKind {
    Succeeded,
    Requeued,
    Failed,
    Skipped,
}

/// Per-job result reported back to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    pub job_id: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub project_id: Option<String>,
    pub board_id: Option<String>,
    pub result: JobResultKind,
    pub details: Option<String>,
}

/// Summary of one worker invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerReport {
    pub worker_id: String,
    pub processed: usize,
    pub results: Vec<JobOutcome>,
}

/// How a job-step failure should be handled.
enum JobError {
    /// Reschedule with backoff; the cause may self-heal.
    Retryable(String),
    /// Terminate the job; retrying cannot fix it.
    Terminal(String),
}

impl JobError {
    fn message(&self) -> &str {
        match self {
            JobError::Retryable(m) | JobError::Terminal(m) => m,
        }
    }
}

impl From<MiroError> for JobError {
    fn from(err: MiroError) -> Self {
        match err.retry_class() {
            RetryClass::WithBackoff => JobError::Retryable(err.to_string()),
            RetryClass::Never => JobError::Terminal(err.to_string()),
        }
    }
}

impl From<Error> for JobError {
    fn from(err: Error) -> Self {
        match &err {
            // Missing records cannot be fixed by retrying.
            Error::Database(DatabaseError::NotFound(_)) => JobError::Terminal(err.to_string()),
            Error::Miro(miro) => match miro.retry_class() {
                RetryClass::WithBackoff => JobError::Retryable(err.to_string()),
                RetryClass::Never => JobError::Terminal(err.to_string()),
            },
            // Everything else (pool exhaustion, transient store trouble) is
            // worth another attempt.
            _ => JobError::Retryable(err.to_string()),
        }
    }
}

/// Successful job body outcome.
enum JobSuccess {
    Done(String),
    Skipped(String),
}

/// Result of mirroring one project's card (and companions) to the board.
struct CardSyncResult {
    card_id: String,
    items_created: i32,
    items_updated: i32,
}

/// Dependencies injected into the worker.
pub struct SyncWorkerDeps {
    pub projects: Arc<dyn ProjectRepositoryTrait>,
    pub jobs: Arc<dyn SyncJobRepositoryTrait>,
    pub logs: Arc<dyn SyncLogRepositoryTrait>,
    pub mappings: Arc<dyn MappingRepositoryTrait>,
    pub boards: Arc<dyn BoardClientFactory>,
}

/// The job orchestrator.
pub struct SyncWorker {
    deps: SyncWorkerDeps,
    worker_id: String,
    /// Server-configured credential used when neither the job payload nor
    /// the triggering request carries one.
    fallback_token: Option<String>,
    echo: EchoSuppressor,
    batch: BatchQueue,
}

impl SyncWorker {
    pub fn new(deps: SyncWorkerDeps, fallback_token: Option<String>) -> Self {
        Self {
            deps,
            worker_id: format!("worker-{}", uuid::Uuid::new_v4()),
            fallback_token,
            echo: EchoSuppressor::new(),
            batch: BatchQueue::new(),
        }
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Claim and process up to `max_jobs` jobs sequentially.
    pub async fn process_jobs(
        &self,
        token_override: Option<&str>,
        max_jobs: usize,
    ) -> WorkerReport {
        let mut results = Vec::new();

        for _ in 0..max_jobs {
            let claimed = match self.deps.jobs.claim_next_sync_job(&self.worker_id).await {
                Ok(Some(job)) => job,
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to claim a sync job: {}", e);
                    break;
                }
            };
            results.push(self.run_claimed_job(claimed, token_override).await);
        }

        WorkerReport {
            worker_id: self.worker_id.clone(),
            processed: results.len(),
            results,
        }
    }

    /// Claim and process one specific job (manual reprocessing).
    pub async fn process_job_by_id(
        &self,
        job_id: &str,
        token_override: Option<&str>,
    ) -> WorkerReport {
        let mut results = Vec::new();

        match self
            .deps
            .jobs
            .claim_sync_job_by_id(job_id, &self.worker_id)
            .await
        {
            Ok(Some(job)) => results.push(self.run_claimed_job(job, token_override).await),
            Ok(None) => {
                let existing = self.deps.jobs.get_sync_job(job_id).ok().flatten();
                results.push(JobOutcome {
                    job_id: job_id.to_string(),
                    job_type: existing
                        .as_ref()
                        .map(|j| j.job_type)
                        .unwrap_or(JobType::ProjectSync),
                    project_id: existing.as_ref().and_then(|j| j.project_id.clone()),
                    board_id: existing.as_ref().and_then(|j| j.board_id.clone()),
                    result: JobResultKind::Skipped,
                    details: Some("job is not claimable".to_string()),
                });
            }
            Err(e) => warn!("Failed to claim sync job {}: {}", job_id, e),
        }

        WorkerReport {
            worker_id: self.worker_id.clone(),
            processed: results.len(),
            results,
        }
    }

    /// Execute one claimed job and persist its terminal/retry transition.
    async fn run_claimed_job(&self, job: SyncJob, token_override: Option<&str>) -> JobOutcome {
        info!(
            "Processing job {} ({}, attempt {}/{})",
            job.id,
            job.job_type.as_str(),
            job.attempt_count,
            job.max_attempts
        );

        let token = self.resolve_token(&job, token_override);
        let body_result = match job.job_type {
            JobType::ProjectSync => self.project_sync(&job, token.as_deref()).await,
            JobType::MasterBoardSync => self.master_board_sync(&job, token.as_deref()).await,
            JobType::CanvasItemSync => self.canvas_item_sync(&job, token.as_deref()).await,
        };

        let (result, details) = match body_result {
            Ok(JobSuccess::Done(details)) => {
                if let Err(e) = self.deps.jobs.complete_sync_job(&job.id, true, None).await {
                    warn!("Failed to complete job {}: {}", job.id, e);
                }
                (JobResultKind::Succeeded, details)
            }
            Ok(JobSuccess::Skipped(details)) => {
                if let Err(e) = self.deps.jobs.complete_sync_job(&job.id, true, None).await {
                    warn!("Failed to complete job {}: {}", job.id, e);
                }
                (JobResultKind::Skipped, details)
            }
            Err(JobError::Terminal(message)) => {
                if let Err(e) = self
                    .deps
                    .jobs
                    .complete_sync_job(&job.id, false, Some(message.clone()))
                    .await
                {
                    warn!("Failed to fail job {}: {}", job.id, e);
                }
                (JobResultKind::Failed, message)
            }
            Err(JobError::Retryable(message)) => {
                let delay = retry_delay(job.attempt_count);
                match self.deps.jobs.fail_sync_job(&job.id, &message, delay).await {
                    Ok(updated) if updated.status == JobStatus::Failed => {
                        (JobResultKind::Failed, format!("{} (attempts exhausted)", message))
                    }
                    Ok(_) => (
                        JobResultKind::Requeued,
                        format!("{} (retry in {}s)", message, delay.as_secs()),
                    ),
                    Err(e) => {
                        warn!("Failed to reschedule job {}: {}", job.id, e);
                        (JobResultKind::Failed, message)
                    }
                }
            }
        };

        JobOutcome {
            job_id: job.id,
            job_type: job.job_type,
            project_id: job.project_id,
            board_id: job.board_id,
            result,
            details: Some(details),
        }
    }

    /// Credential precedence: job payload, then triggering request, then the
    /// server-configured fallback.
    fn resolve_token(&self, job: &SyncJob, token_override: Option<&str>) -> Option<String> {
        job.payload
            .get("miroAccessToken")
            .and_then(|v| v.as_str())
            .map(String::from)
            .or_else(|| token_override.map(String::from))
            .or_else(|| self.fallback_token.clone())
    }

    fn board_client(
        &self,
        token: Option<&str>,
    ) -> Result<Arc<dyn BoardApiClient>, JobError> {
        // No credential is an operational gap (token refresh may fix it),
        // not a client error.
        let token = token.ok_or_else(|| {
            JobError::Retryable("no board access credential available".to_string())
        })?;
        self.deps.boards.create(token).map_err(JobError::from)
    }

    // ─────────────────────────────────────────────────────────────────────
    // project_sync
    // ─────────────────────────────────────────────────────────────────────

    async fn project_sync(
        &self,
        job: &SyncJob,
        token: Option<&str>,
    ) -> Result<JobSuccess, JobError> {
        let project_id = job
            .project_id
            .as_deref()
            .ok_or_else(|| JobError::Terminal("job has no project id".to_string()))?;

        let project = self
            .deps
            .projects
            .get_by_id(project_id)
            .map_err(JobError::from)?;

        // A project without a board is a no-op, not an error.
        let Some(board_id) = project.miro_board_id.clone().filter(|b| !b.is_empty()) else {
            self.deps
                .projects
                .mark_sync_not_required(project_id)
                .await
                .map_err(JobError::from)?;
            return Ok(JobSuccess::Skipped("no board linked".to_string()));
        };

        let client = match self.board_client(token) {
            Ok(client) => client,
            Err(err) => {
                // A rejected credential is operator-visible; a missing one
                // retries quietly.
                if let JobError::Terminal(message) = &err {
                    if let Err(e) = self.deps.projects.mark_sync_failed(project_id, message).await
                    {
                        warn!("Failed to record sync error on {}: {}", project_id, e);
                    }
                }
                return Err(err);
            }
        };

        let project = self
            .deps
            .projects
            .mark_sync_started(project_id)
            .await
            .map_err(JobError::from)?;

        let log = self
            .deps
            .logs
            .create_sync_log(NewSyncLog {
                job_id: Some(job.id.clone()),
                project_id: Some(project_id.to_string()),
                board_id: Some(board_id.clone()),
                operation: job.job_type.as_str().to_string(),
            })
            .await
            .map_err(JobError::from)?;

        match self.mirror_project(client.as_ref(), &project, &board_id).await {
            Ok(outcome) => {
                self.deps
                    .projects
                    .mark_sync_succeeded(project_id, &outcome.card_id)
                    .await
                    .map_err(JobError::from)?;
                self.close_log(
                    &log.id,
                    SyncLogStatus::Succeeded,
                    outcome.items_created,
                    outcome.items_updated,
                    None,
                )
                .await;
                Ok(JobSuccess::Done(format!(
                    "card {} ({} created, {} updated)",
                    outcome.card_id, outcome.items_created, outcome.items_updated
                )))
            }
            Err(err) => {
                let message = err.message().to_string();
                if let Err(e) = self.deps.projects.mark_sync_failed(project_id, &message).await {
                    warn!("Failed to record sync error on {}: {}", project_id, e);
                }
                self.close_log(&log.id, SyncLogStatus::Failed, 0, 0, Some(message)).await;
                Err(err)
            }
        }
    }

    /// Steps 4-10 of the outbound pipeline: probe, ensure frames, place the
    /// card, mirror the briefing. Every mutation is idempotent-by-lookup, so
    /// partial progress is safe to retry.
    async fn mirror_project(
        &self,
        client: &dyn BoardApiClient,
        project: &Project,
        board_id: &str,
    ) -> Result<CardSyncResult, JobError> {
        // Connectivity probe; classifies credential problems before any
        // mutation happens.
        client.get_board(board_id).await.map_err(JobError::from)?;

        let mut items_created = 0;
        let mut items_updated = 0;

        let frames = client.list_frames(board_id).await.map_err(JobError::from)?;
        let master_frame =
            match frames.iter().find(|f| f.title() == briefing::MASTER_FRAME_TITLE) {
                Some(frame) => frame.clone(),
                None => {
                    let frame = client
                        .create_frame(
                            board_id,
                            CreateFrameRequest {
                                data: FrameData {
                                    title: Some(briefing::MASTER_FRAME_TITLE.to_string()),
                                },
                                position: layout::master_frame_position(),
                                geometry: Some(layout::master_frame_geometry()),
                            },
                        )
                        .await
                        .map_err(JobError::from)?;
                    items_created += 1;
                    frame
                }
            };

        let (card_id, created, updated) = self
            .place_timeline_card(client, project, board_id, &master_frame)
            .await?;
        items_created += created;
        items_updated += updated;

        self.deps
            .mappings
            .upsert(MappingRecord::new(
                board_id,
                &project.id,
                MappingItemType::TimelineCard,
                &card_id,
            ))
            .await
            .map_err(JobError::from)?;

        let (created, updated) = self
            .mirror_briefing(client, project, board_id, &frames)
            .await;
        items_created += created;
        items_updated += updated;

        Ok(CardSyncResult {
            card_id,
            items_created,
            items_updated,
        })
    }

    /// Ensure the project's card exists in its derived column.
    async fn place_timeline_card(
        &self,
        client: &dyn BoardApiClient,
        project: &Project,
        board_id: &str,
        master_frame: &Frame,
    ) -> Result<(String, i32, i32), JobError> {
        // Recomputed on every sync, never cached.
        let column = derive_timeline_column(
            project.status,
            project.due_date,
            project.due_date_approved,
            Utc::now().date_naive(),
        );

        let cards = client.list_cards(board_id).await.map_err(JobError::from)?;

        // Prefer the stored card id; fall back to the embedded identity
        // marker when the stored id is stale or missing.
        let resolved = project.miro_card_id.clone().or_else(|| {
            cards
                .iter()
                .find(|c| identity::carries_marker(c.description(), &project.id))
                .map(|c| c.id.clone())
        });

        let position = layout::card_position(column, &cards, resolved.as_deref());
        let data = self.card_data(project);

        match resolved {
            Some(card_id) => {
                let request = UpdateCardRequest {
                    data: Some(data.clone()),
                    position: Some(position),
                };
                match client.update_card(board_id, &card_id, request).await {
                    Ok(card) => Ok((card.id, 0, 1)),
                    Err(err) if err.is_not_found() => {
                        // Stale id: self-heal by creating a fresh card. The
                        // old mapping row points at a dead object; drop it so
                        // later inbound events cannot match it.
                        debug!(
                            "Card {} is gone on board {}; creating a replacement",
                            card_id, board_id
                        );
                        let _ = self.deps.mappings.delete_by_item(board_id, &card_id).await;
                        let card = self
                            .create_timeline_card(client, board_id, master_frame, data, position)
                            .await?;
                        Ok((card.id, 1, 0))
                    }
                    Err(err) => Err(err.into()),
                }
            }
            None => {
                let card = self
                    .create_timeline_card(client, board_id, master_frame, data, position)
                    .await?;
                Ok((card.id, 1, 0))
            }
        }
    }

    async fn create_timeline_card(
        &self,
        client: &dyn BoardApiClient,
        board_id: &str,
        master_frame: &Frame,
        data: CardData,
        position: atelier_miro::types::Position,
    ) -> Result<Card, JobError> {
        client
            .create_card(
                board_id,
                CreateCardRequest {
                    data,
                    position,
                    geometry: Some(layout::card_geometry()),
                    parent: Some(Parent {
                        id: master_frame.id.clone(),
                    }),
                },
            )
            .await
            .map_err(JobError::from)
    }

    fn card_data(&self, project: &Project) -> CardData {
        let description = identity::embed_project_marker(
            project.description.as_deref().unwrap_or(""),
            &project.id,
        );
        CardData {
            title: Some(project.name.clone()),
            description: Some(description),
            // Date-only due dates mean end of day.
            due_date: project.due_date.and_then(|d| {
                let end_of_day = NaiveTime::from_hms_opt(23, 59, 59)?;
                Some(d.and_time(end_of_day).and_utc())
            }),
        }
    }

    /// Ensure the companion frames and one shape per briefing field.
    ///
    /// Best-effort per field: a failed shape write is logged and skipped so
    /// one broken field never blocks the card sync that already happened.
    async fn mirror_briefing(
        &self,
        client: &dyn BoardApiClient,
        project: &Project,
        board_id: &str,
        frames: &[Frame],
    ) -> (i32, i32) {
        let mut created = 0;
        let mut updated = 0;

        let briefing_frame = match self
            .ensure_frame(
                client,
                board_id,
                frames,
                &briefing::briefing_frame_title(project),
                briefing::briefing_frame_position(),
                briefing::briefing_frame_geometry(),
                project,
                MappingItemType::BriefingFrame,
            )
            .await
        {
            Ok((frame, was_created)) => {
                if was_created {
                    created += 1;
                }
                frame
            }
            Err(e) => {
                warn!(
                    "Skipping briefing mirror for {}: {}",
                    project.id,
                    e.message()
                );
                return (created, updated);
            }
        };

        match self
            .ensure_frame(
                client,
                board_id,
                frames,
                &briefing::version_frame_title(project, 1),
                briefing::version_frame_position(),
                briefing::briefing_frame_geometry(),
                project,
                MappingItemType::VersionFrame,
            )
            .await
        {
            Ok((_, was_created)) => {
                if was_created {
                    created += 1;
                }
            }
            Err(e) => warn!(
                "Could not ensure version frame for {}: {}",
                project.id,
                e.message()
            ),
        }

        let existing = self
            .deps
            .mappings
            .list_for_project(board_id, &project.id)
            .unwrap_or_default();

        for (index, field) in BRIEFING_FIELDS.iter().enumerate() {
            let value = project.briefing.get(field.key);
            let content = briefing::field_content(field.label, value);
            let style = briefing::field_style(value.is_some());

            let mapped = existing.iter().find(|m| {
                m.item_type == MappingItemType::BriefingField
                    && m.field_key.as_deref() == Some(field.key)
            });

            let result = match mapped {
                Some(mapping) => {
                    let request = UpdateShapeRequest {
                        data: Some(ShapeData {
                            content: Some(content.clone()),
                            shape: None,
                        }),
                        style: Some(style.clone()),
                    };
                    match client
                        .update_shape(board_id, &mapping.canvas_item_id, request)
                        .await
                    {
                        Ok(_) => {
                            updated += 1;
                            Ok(())
                        }
                        Err(err) if err.is_not_found() => {
                            // The shape was deleted on the board; replace it.
                            let _ = self
                                .deps
                                .mappings
                                .delete_by_item(board_id, &mapping.canvas_item_id)
                                .await;
                            self.create_field_shape(
                                client,
                                board_id,
                                &briefing_frame,
                                project,
                                field.key,
                                index,
                                content,
                                style,
                            )
                            .await
                            .map(|_| created += 1)
                        }
                        Err(err) => Err(err.into()),
                    }
                }
                None => self
                    .create_field_shape(
                        client,
                        board_id,
                        &briefing_frame,
                        project,
                        field.key,
                        index,
                        content,
                        style,
                    )
                    .await
                    .map(|_| created += 1),
            };

            if let Err(e) = result {
                warn!(
                    "Briefing field '{}' failed to mirror for {}: {}",
                    field.key,
                    project.id,
                    e.message()
                );
            }
        }

        (created, updated)
    }

    #[allow(clippy::too_many_arguments)]
    async fn ensure_frame(
        &self,
        client: &dyn BoardApiClient,
        board_id: &str,
        frames: &[Frame],
        title: &str,
        position: atelier_miro::types::Position,
        geometry: atelier_miro::types::Geometry,
        project: &Project,
        item_type: MappingItemType,
    ) -> Result<(Frame, bool), JobError> {
        // Idempotent: re-check by title before creating.
        if let Some(frame) = frames.iter().find(|f| f.title() == title) {
            return Ok((frame.clone(), false));
        }

        let frame = client
            .create_frame(
                board_id,
                CreateFrameRequest {
                    data: FrameData {
                        title: Some(title.to_string()),
                    },
                    position,
                    geometry: Some(geometry),
                },
            )
            .await
            .map_err(JobError::from)?;

        let mut record =
            MappingRecord::new(board_id, &project.id, item_type, &frame.id);
        if item_type == MappingItemType::VersionFrame {
            record = record.with_version(1);
        }
        if let Err(e) = self.deps.mappings.upsert(record).await {
            warn!("Failed to record mapping for frame {}: {}", frame.id, e);
        }

        Ok((frame, true))
    }

    #[allow(clippy::too_many_arguments)]
    async fn create_field_shape(
        &self,
        client: &dyn BoardApiClient,
        board_id: &str,
        briefing_frame: &Frame,
        project: &Project,
        field_key: &str,
        index: usize,
        content: String,
        style: atelier_miro::types::ShapeStyle,
    ) -> Result<(), JobError> {
        let shape = client
            .create_shape(
                board_id,
                CreateShapeRequest {
                    data: ShapeData {
                        content: Some(content),
                        shape: Some("round_rectangle".to_string()),
                    },
                    style: Some(style),
                    position: briefing::field_position(index),
                    geometry: Some(briefing::field_geometry()),
                    parent: Some(Parent {
                        id: briefing_frame.id.clone(),
                    }),
                },
            )
            .await
            .map_err(JobError::from)?;

        self.deps
            .mappings
            .upsert(
                MappingRecord::new(
                    board_id,
                    &project.id,
                    MappingItemType::BriefingField,
                    &shape.id,
                )
                .with_field_key(field_key),
            )
            .await
            .map_err(JobError::from)?;

        Ok(())
    }

    async fn close_log(
        &self,
        log_id: &str,
        status: SyncLogStatus,
        created: i32,
        updated: i32,
        error: Option<String>,
    ) {
        if let Err(e) = self
            .deps
            .logs
            .complete_sync_log(log_id, status, created, updated, error)
            .await
        {
            warn!("Failed to close sync log {}: {}", log_id, e);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // master_board_sync
    // ─────────────────────────────────────────────────────────────────────

    async fn master_board_sync(
        &self,
        job: &SyncJob,
        token: Option<&str>,
    ) -> Result<JobSuccess, JobError> {
        let board_id = job
            .board_id
            .as_deref()
            .ok_or_else(|| JobError::Terminal("job has no board id".to_string()))?;

        let client = self.board_client(token)?;
        client.get_board(board_id).await.map_err(JobError::from)?;

        let projects = self
            .deps
            .projects
            .list_for_board(board_id)
            .map_err(JobError::from)?;

        if projects.is_empty() {
            return Ok(JobSuccess::Skipped("no projects linked to board".to_string()));
        }

        let log = self
            .deps
            .logs
            .create_sync_log(NewSyncLog {
                job_id: Some(job.id.clone()),
                project_id: None,
                board_id: Some(board_id.to_string()),
                operation: job.job_type.as_str().to_string(),
            })
            .await
            .map_err(JobError::from)?;

        let total = projects.len();
        let outcomes = self
            .batch
            .run(projects, |project| {
                let client = client.clone();
                async move {
                    let project = self
                        .deps
                        .projects
                        .mark_sync_started(&project.id)
                        .await
                        .map_err(JobError::from)?;
                    match self.mirror_project(client.as_ref(), &project, board_id).await {
                        Ok(outcome) => {
                            self.deps
                                .projects
                                .mark_sync_succeeded(&project.id, &outcome.card_id)
                                .await
                                .map_err(JobError::from)?;
                            Ok(outcome)
                        }
                        Err(err) => {
                            let _ = self
                                .deps
                                .projects
                                .mark_sync_failed(&project.id, err.message())
                                .await;
                            Err(err)
                        }
                    }
                }
            })
            .await;

        let mut created = 0;
        let mut updated = 0;
        let mut failed = 0;
        let mut retryable_failure = false;
        for outcome in &outcomes {
            match outcome {
                Ok(result) => {
                    created += result.items_created;
                    updated += result.items_updated;
                }
                Err(JobError::Retryable(_)) => {
                    failed += 1;
                    retryable_failure = true;
                }
                Err(JobError::Terminal(_)) => failed += 1,
            }
        }
        let synced = total - failed;

        let status = if failed == 0 {
            SyncLogStatus::Succeeded
        } else {
            SyncLogStatus::Failed
        };
        self.close_log(
            &log.id,
            status,
            created,
            updated,
            (failed > 0).then(|| format!("{} of {} projects failed", failed, total)),
        )
        .await;

        if synced == 0 && retryable_failure {
            return Err(JobError::Retryable(format!(
                "all {} projects failed to sync",
                total
            )));
        }

        Ok(JobSuccess::Done(format!(
            "{} of {} projects synced ({} created, {} updated)",
            synced, total, created, updated
        )))
    }

    // ─────────────────────────────────────────────────────────────────────
    // canvas_item_sync (inbound)
    // ─────────────────────────────────────────────────────────────────────

    async fn canvas_item_sync(
        &self,
        job: &SyncJob,
        token: Option<&str>,
    ) -> Result<JobSuccess, JobError> {
        let board_id = job
            .board_id
            .as_deref()
            .ok_or_else(|| JobError::Terminal("job has no board id".to_string()))?;
        let event = inbound::parse_event(&job.payload)
            .ok_or_else(|| JobError::Terminal("malformed canvas event payload".to_string()))?;

        let mapping = self
            .deps
            .mappings
            .get_by_item(board_id, &event.item_id)
            .map_err(JobError::from)?;

        // Resolve the owning project: mapping row, then stored card id, then
        // the embedded identity marker on the live item.
        let mut project = match &mapping {
            Some(m) => match self.deps.projects.get_by_id(&m.project_id) {
                Ok(p) => Some(p),
                Err(e) if e.is_not_found() => None,
                Err(e) => return Err(e.into()),
            },
            None => self
                .deps
                .projects
                .find_by_card(board_id, &event.item_id)
                .map_err(JobError::from)?,
        };

        if project.is_none() && event.event_type != CanvasEventType::Deleted {
            project = self
                .resolve_by_marker(board_id, &event, token)
                .await?;
        }

        let Some(project) = project else {
            // Not one of ours.
            return Ok(JobSuccess::Skipped("unrecognized canvas item".to_string()));
        };

        // Drop our own writes echoing back through the notification channel.
        if self
            .echo
            .is_echo(event.timestamp, project.last_miro_outbound_at)
        {
            debug!(
                "Suppressing echo for item {} on board {}",
                event.item_id, board_id
            );
            return Ok(JobSuccess::Skipped("echo suppressed".to_string()));
        }

        match event.event_type {
            CanvasEventType::Deleted => {
                self.handle_inbound_delete(board_id, &event, &project, mapping.as_ref())
                    .await
            }
            CanvasEventType::Created | CanvasEventType::Updated => {
                self.handle_inbound_edit(board_id, &event, &project, mapping.as_ref(), token)
                    .await
            }
        }
    }

    /// Fetch the live item and read the identity marker off its description.
    async fn resolve_by_marker(
        &self,
        board_id: &str,
        event: &CanvasEvent,
        token: Option<&str>,
    ) -> Result<Option<Project>, JobError> {
        let client = self.board_client(token)?;
        let item = match client.get_item(board_id, &event.item_id).await {
            Ok(item) => item,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let Some(project_id) =
            inbound::card_description(&item).and_then(identity::extract_project_id)
        else {
            return Ok(None);
        };

        match self.deps.projects.get_by_id(&project_id) {
            Ok(project) => Ok(Some(project)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn handle_inbound_delete(
        &self,
        board_id: &str,
        event: &CanvasEvent,
        project: &Project,
        mapping: Option<&MappingRecord>,
    ) -> Result<JobSuccess, JobError> {
        self.deps
            .mappings
            .delete_by_item(board_id, &event.item_id)
            .await
            .map_err(JobError::from)?;

        let was_timeline_card = project.miro_card_id.as_deref() == Some(event.item_id.as_str())
            || mapping.map(|m| m.item_type) == Some(MappingItemType::TimelineCard);

        if was_timeline_card {
            self.deps
                .projects
                .clear_card_link(&project.id, "Timeline card was deleted on the board")
                .await
                .map_err(JobError::from)?;
            Ok(JobSuccess::Done(
                "card deleted on board; project queued for re-sync".to_string(),
            ))
        } else {
            Ok(JobSuccess::Done("canvas object mapping removed".to_string()))
        }
    }

    async fn handle_inbound_edit(
        &self,
        board_id: &str,
        event: &CanvasEvent,
        project: &Project,
        mapping: Option<&MappingRecord>,
        token: Option<&str>,
    ) -> Result<JobSuccess, JobError> {
        let client = self.board_client(token)?;
        let item = match client.get_item(board_id, &event.item_id).await {
            Ok(item) => item,
            Err(err) if err.is_not_found() => {
                return Ok(JobSuccess::Skipped("item no longer exists".to_string()))
            }
            Err(err) => return Err(err.into()),
        };

        let is_timeline_card = project.miro_card_id.as_deref() == Some(event.item_id.as_str())
            || mapping.map(|m| m.item_type) == Some(MappingItemType::TimelineCard);

        if is_timeline_card {
            // Infer the new status from the card's horizontal position.
            let status = inbound::item_x(&item)
                .map(layout::nearest_column)
                .and_then(|column| column.to_status())
                .unwrap_or(project.status);
            let due_date = inbound::card_due_date(&item);

            self.deps
                .projects
                .apply_inbound_move(&project.id, status, due_date)
                .await
                .map_err(JobError::from)?;

            return Ok(JobSuccess::Done(format!(
                "card edit applied (status {})",
                status.as_str()
            )));
        }

        if let Some(mapping) = mapping {
            if mapping.item_type == MappingItemType::BriefingField {
                let Some(field_key) = mapping.field_key.as_deref() else {
                    return Ok(JobSuccess::Skipped(
                        "briefing mapping has no field key".to_string(),
                    ));
                };
                let label = BRIEFING_FIELDS
                    .iter()
                    .find(|f| f.key == field_key)
                    .map(|f| f.label)
                    .unwrap_or(field_key);
                let content = inbound::item_content(&item).unwrap_or("");
                let value = briefing::field_value_from_content(content, label);

                self.deps
                    .projects
                    .apply_inbound_briefing_field(&project.id, field_key, &value)
                    .await
                    .map_err(JobError::from)?;

                return Ok(JobSuccess::Done(format!(
                    "briefing field '{}' updated from board",
                    field_key
                )));
            }
        }

        Ok(JobSuccess::Skipped(
            "no inbound handling for this item type".to_string(),
        ))
    }
}
