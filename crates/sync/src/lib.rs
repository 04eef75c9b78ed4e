//! Atelier Sync - the bidirectional board synchronization engine.
//!
//! Outbound: a durable job queue propagates project changes onto board
//! objects (frames, cards, shapes, text). Inbound: user edits made directly
//! on the board flow back into the project store, with the engine's own
//! writes filtered out by the echo suppressor.
//!
//! The engine is database-agnostic (repository traits from `atelier-core`)
//! and board-transport-agnostic (the [`BoardApiClient`] trait, implemented
//! over the rate-limited Miro client in [`api`]).

pub mod api;
pub mod echo;
pub mod identity;
pub mod inbound;
pub mod layout;
pub mod service;
pub mod session_lock;
pub mod traits;
pub mod worker;

pub mod briefing;

pub use api::{MiroBoardClientFactory, RateLimitedBoardClient};
pub use echo::EchoSuppressor;
pub use service::SyncService;
pub use session_lock::{InMemoryLockStore, LockEntry, LockStore, SessionLockService};
pub use traits::{BoardApiClient, BoardClientFactory};
pub use worker::{JobOutcome, JobResultKind, SyncWorker, SyncWorkerDeps, WorkerReport};
