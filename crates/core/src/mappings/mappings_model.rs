//! Mapping record domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of domain entity a canvas object mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingItemType {
    /// The project's card on the master timeline frame.
    TimelineCard,
    /// The project's briefing frame.
    BriefingFrame,
    /// A numbered version frame.
    VersionFrame,
    /// A shape mirroring one structured briefing field.
    BriefingField,
}

impl MappingItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingItemType::TimelineCard => "timeline_card",
            MappingItemType::BriefingFrame => "briefing_frame",
            MappingItemType::VersionFrame => "version_frame",
            MappingItemType::BriefingField => "briefing_field",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "timeline_card" => Some(MappingItemType::TimelineCard),
            "briefing_frame" => Some(MappingItemType::BriefingFrame),
            "version_frame" => Some(MappingItemType::VersionFrame),
            "briefing_field" => Some(MappingItemType::BriefingField),
            _ => None,
        }
    }
}

/// Durable correlation between a domain entity and a canvas object, scoped to
/// one board.
///
/// `(board_id, canvas_item_id)` is unique: one canvas object maps to exactly
/// one domain entity. The canvas item id is stable for the life of the
/// mapping; rows are deleted when the canvas object is removed or the project
/// is unsynced, never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRecord {
    pub board_id: String,
    pub project_id: String,
    pub item_type: MappingItemType,
    pub canvas_item_id: String,
    /// Briefing field key, for `briefing_field` mappings.
    pub field_key: Option<String>,
    /// Version number, for `version_frame` mappings.
    pub version_number: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl MappingRecord {
    pub fn new(
        board_id: impl Into<String>,
        project_id: impl Into<String>,
        item_type: MappingItemType,
        canvas_item_id: impl Into<String>,
    ) -> Self {
        Self {
            board_id: board_id.into(),
            project_id: project_id.into(),
            item_type,
            canvas_item_id: canvas_item_id.into(),
            field_key: None,
            version_number: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_field_key(mut self, field_key: impl Into<String>) -> Self {
        self.field_key = Some(field_key.into());
        self
    }

    pub fn with_version(mut self, version_number: i32) -> Self {
        self.version_number = Some(version_number);
        self
    }
}
