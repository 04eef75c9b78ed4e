mod model;
mod repository;

pub use model::ProjectDB;
pub use repository::ProjectRepository;
