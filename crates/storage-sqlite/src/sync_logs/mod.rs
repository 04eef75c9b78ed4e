mod model;
mod repository;

pub use model::SyncLogDB;
pub use repository::SyncLogRepository;
