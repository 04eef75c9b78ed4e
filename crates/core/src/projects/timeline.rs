//! Timeline column derivation.
//!
//! The column a project card lands in on the master timeline frame is a
//! computed fact, recomputed on every sync. `overdue` in particular is never
//! stored on the project record.

use chrono::NaiveDate;

use super::projects_model::ProjectStatus;

/// The workflow column a project card occupies on the timeline frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineColumn {
    Overdue,
    InProgress,
    Review,
    Done,
    OnHold,
}

impl TimelineColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimelineColumn::Overdue => "overdue",
            TimelineColumn::InProgress => "in_progress",
            TimelineColumn::Review => "review",
            TimelineColumn::Done => "done",
            TimelineColumn::OnHold => "on_hold",
        }
    }

    /// Display label used for column headers on the board.
    pub fn label(&self) -> &'static str {
        match self {
            TimelineColumn::Overdue => "Overdue",
            TimelineColumn::InProgress => "In Progress",
            TimelineColumn::Review => "Review",
            TimelineColumn::Done => "Done",
            TimelineColumn::OnHold => "On Hold",
        }
    }

    /// The stored status a card in this column implies.
    ///
    /// `overdue` is derived, never stored, so a card dragged into that
    /// column implies no status change.
    pub fn to_status(&self) -> Option<ProjectStatus> {
        match self {
            TimelineColumn::Overdue => None,
            TimelineColumn::InProgress => Some(ProjectStatus::InProgress),
            TimelineColumn::Review => Some(ProjectStatus::Review),
            TimelineColumn::Done => Some(ProjectStatus::Done),
            TimelineColumn::OnHold => Some(ProjectStatus::OnHold),
        }
    }
}

/// Derive the timeline column for a project.
///
/// Rules, in order:
/// 1. `done` is terminal and always maps to the done column.
/// 2. A due date that has passed (and has not been explicitly rejected via
///    `due_date_approved == Some(false)`) derives `overdue` regardless of the
///    stored status. A date-only due date means end of that day: it becomes
///    overdue the day after.
/// 3. Otherwise the stored status picks the column.
pub fn derive_timeline_column(
    status: ProjectStatus,
    due_date: Option<NaiveDate>,
    due_date_approved: Option<bool>,
    today: NaiveDate,
) -> TimelineColumn {
    if status == ProjectStatus::Done {
        return TimelineColumn::Done;
    }

    if let Some(due) = due_date {
        let rejected = due_date_approved == Some(false);
        if !rejected && due < today {
            return TimelineColumn::Overdue;
        }
    }

    match status {
        ProjectStatus::InProgress => TimelineColumn::InProgress,
        ProjectStatus::Review => TimelineColumn::Review,
        ProjectStatus::OnHold => TimelineColumn::OnHold,
        ProjectStatus::Done => TimelineColumn::Done,
    }
}
