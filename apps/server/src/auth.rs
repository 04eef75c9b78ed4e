//! Bearer authentication resolving to the administrator identity.
//!
//! The server carries a single static administrator credential. Tokens are
//! compared as SHA-256 digests so the comparison does not leak length or
//! prefix timing.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};

use crate::error::ApiError;
use crate::main_lib::AppState;

/// Marker for a request that authenticated as the administrator.
#[derive(Debug, Clone, Copy)]
pub struct AdminIdentity;

fn digest(value: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hasher.finalize().into()
}

/// Check the `Authorization: Bearer` header against the admin credential.
pub fn verify_bearer(headers: &HeaderMap, admin_token: &str) -> Result<AdminIdentity, ApiError> {
    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(ApiError::Unauthorized)?;

    if digest(presented) == digest(admin_token) {
        Ok(AdminIdentity)
    } else {
        Err(ApiError::Unauthorized)
    }
}

/// Middleware guarding the API surface.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    verify_bearer(request.headers(), &state.config.admin_token)?;
    Ok(next.run(request).await)
}
