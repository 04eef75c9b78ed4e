//! Project domain models.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// Workflow status of a project, as stored on the record.
///
/// `overdue` is never stored; it is derived from the due date at sync time
/// (see [`super::derive_timeline_column`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    InProgress,
    Review,
    Done,
    OnHold,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Review => "review",
            ProjectStatus::Done => "done",
            ProjectStatus::OnHold => "on_hold",
        }
    }

    /// Parse a stored status string. Unknown values map to `None` so callers
    /// can apply their own default.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in_progress" => Some(ProjectStatus::InProgress),
            "review" => Some(ProjectStatus::Review),
            "done" => Some(ProjectStatus::Done),
            "on_hold" => Some(ProjectStatus::OnHold),
            _ => None,
        }
    }
}

/// Board synchronization status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// No board is linked; nothing to sync.
    #[default]
    NotRequired,
    /// A sync has been requested but not yet run.
    Pending,
    /// A worker is currently syncing this project.
    Syncing,
    /// The board mirror is up to date.
    Synced,
    /// The last sync attempt failed.
    SyncError,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::NotRequired => "not_required",
            SyncStatus::Pending => "pending",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::SyncError => "sync_error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "not_required" => Some(SyncStatus::NotRequired),
            "pending" => Some(SyncStatus::Pending),
            "syncing" => Some(SyncStatus::Syncing),
            "synced" => Some(SyncStatus::Synced),
            "sync_error" => Some(SyncStatus::SyncError),
            _ => None,
        }
    }
}

/// One entry in the briefing field catalog.
#[derive(Debug, Clone, Copy)]
pub struct BriefingFieldDef {
    pub key: &'static str,
    pub label: &'static str,
}

/// The structured briefing fields mirrored onto a project's briefing frame.
pub const BRIEFING_FIELDS: &[BriefingFieldDef] = &[
    BriefingFieldDef { key: "objective", label: "Objective" },
    BriefingFieldDef { key: "audience", label: "Target Audience" },
    BriefingFieldDef { key: "deliverables", label: "Deliverables" },
    BriefingFieldDef { key: "tone", label: "Tone & Style" },
    BriefingFieldDef { key: "budget", label: "Budget" },
    BriefingFieldDef { key: "references", label: "References" },
];

/// Structured briefing data, keyed by the field catalog.
///
/// Persisted as a JSON column; unknown keys are preserved on round-trip so an
/// older build never drops data written by a newer one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct BriefingData {
    pub fields: BTreeMap<String, String>,
}

impl BriefingData {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str).filter(|v| !v.trim().is_empty())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// True when the key belongs to the briefing field catalog.
    pub fn is_known_field(key: &str) -> bool {
        BRIEFING_FIELDS.iter().any(|f| f.key == key)
    }
}

/// Domain model representing a studio client project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub client_name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub due_date: Option<NaiveDate>,
    /// Tri-state approval: `None` means not reviewed yet and counts as
    /// approved for overdue derivation; only an explicit `false` rejects
    /// the due date.
    pub due_date_approved: Option<bool>,
    pub briefing: BriefingData,
    pub miro_board_id: Option<String>,
    pub miro_card_id: Option<String>,
    pub sync_status: SyncStatus,
    pub sync_retry_count: i32,
    pub last_sync_attempt: Option<DateTime<Utc>>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub last_miro_outbound_at: Option<DateTime<Utc>>,
    pub last_miro_inbound_at: Option<DateTime<Utc>>,
    pub sync_error_message: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Project {
    /// True when the project has a board to mirror onto.
    pub fn has_board(&self) -> bool {
        self.miro_board_id.as_deref().map(|b| !b.is_empty()).unwrap_or(false)
    }
}

/// Input model for creating a new project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub id: Option<String>,
    pub name: String,
    pub client_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    pub due_date: Option<NaiveDate>,
    pub due_date_approved: Option<bool>,
    #[serde(default)]
    pub briefing: BriefingData,
    pub miro_board_id: Option<String>,
}

impl NewProject {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()).into());
        }
        if self.client_name.trim().is_empty() {
            return Err(ValidationError::MissingField("clientName".to_string()).into());
        }
        Ok(())
    }
}

/// Input model for updating an existing project's editable fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    pub id: String,
    pub name: String,
    pub client_name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub due_date: Option<NaiveDate>,
    pub due_date_approved: Option<bool>,
    pub briefing: BriefingData,
    pub miro_board_id: Option<String>,
}

impl ProjectUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::MissingField("id".to_string()).into());
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()).into());
        }
        Ok(())
    }
}
