mod model;
mod repository;

pub use model::MappingRecordDB;
pub use repository::MappingRepository;
