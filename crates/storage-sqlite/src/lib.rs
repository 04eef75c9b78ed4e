//! SQLite storage implementation for Atelier.
//!
//! This crate provides all database-related functionality using Diesel ORM
//! with SQLite. It implements the repository traits defined in
//! `atelier-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for projects, sync jobs, mappings, and
//!   sync logs
//! - Database-specific model types (with Diesel derives)
//!
//! This crate is the only place in the application where Diesel dependencies
//! exist. All other crates are database-agnostic and work with traits.

pub mod db;
pub mod errors;
pub mod schema;
mod utils;

// Repository implementations
pub mod mappings;
pub mod projects;
pub mod sync_jobs;
pub mod sync_logs;

// Re-export database utilities
pub use db::{create_pool, get_connection, init, run_migrations, DbConnection, DbPool, WriteHandle};

// Re-export storage errors
pub use errors::StorageError;

// Re-export from atelier-core for convenience
pub use atelier_core::errors::{DatabaseError, Error, Result};
