//! Mappings module - correlation between domain entities and canvas objects.

mod mappings_model;
mod mappings_traits;

pub use mappings_model::{MappingItemType, MappingRecord};
pub use mappings_traits::MappingRepositoryTrait;
