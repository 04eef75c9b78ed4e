//! Projects module - domain models, traits, and the timeline deriver.

mod projects_model;
mod projects_traits;
mod timeline;

pub use projects_model::{
    BriefingData, NewProject, Project, ProjectStatus, ProjectUpdate, SyncStatus, BRIEFING_FIELDS,
};
pub use projects_traits::ProjectRepositoryTrait;
pub use timeline::{derive_timeline_column, TimelineColumn};
