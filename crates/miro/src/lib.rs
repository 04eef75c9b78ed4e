//! Atelier Miro - typed wire client for the Miro board REST API.
//!
//! This crate owns everything that talks HTTP to the board platform:
//! - [`MiroClient`]: typed endpoint methods for boards, frames, cards,
//!   shapes, and text items
//! - [`MiroError`] / [`RetryClass`]: transport error classification
//! - [`RateLimiter`]: token-bucket admission control plus the retry wrapper
//!   every board call runs under
//! - [`BatchQueue`]: paced fan-out for bulk operations
//!
//! It is storage-agnostic and knows nothing about projects or jobs.

pub mod batch;
pub mod client;
pub mod error;
pub mod rate_limiter;
pub mod token;
pub mod types;

pub use batch::BatchQueue;
pub use client::MiroClient;
pub use error::{MiroError, RetryClass};
pub use rate_limiter::{RateLimiter, RateLimiterStats};
pub use token::sanitize_access_token;
