//! Error types and retry classification for the Miro client.

use thiserror::Error;

/// Result type alias for board API operations.
pub type Result<T> = std::result::Result<T, MiroError>;

/// Classification for retry policy.
///
/// Determines how callers respond to a failed board API call: give up
/// immediately, or retry with exponential backoff.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - the request is fundamentally invalid (bad credential,
    /// bad input) and retrying cannot help.
    Never,

    /// Retry with exponential backoff - the failure is transient (rate
    /// limit, timeout, server error) and may self-heal.
    WithBackoff,
}

/// Errors that can occur when talking to the board API.
#[derive(Error, Debug)]
pub enum MiroError {
    /// The access token failed sanitization before it ever reached the wire.
    #[error("Invalid access token: {0}")]
    InvalidToken(String),

    /// The platform rejected the credential (HTTP 401/403).
    /// Permanent - surfaced to the operator, never retried.
    #[error("Board API authorization failed ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// The requested object does not exist (HTTP 404).
    /// Callers treat a stale id as self-healing (fall back to create).
    #[error("Board object not found: {message}")]
    NotFound { message: String },

    /// The platform rate limited the request (HTTP 429).
    #[error("Board API rate limited: {message}")]
    RateLimited { message: String },

    /// The request timed out (HTTP 408 or transport timeout).
    #[error("Board API timeout: {0}")]
    Timeout(String),

    /// The platform failed server-side (HTTP 5xx).
    #[error("Board API server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Any other non-success response.
    #[error("Board API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A transport-level error below the HTTP status layer.
    #[error("Network error: {0}")]
    Network(String),

    /// The response body did not parse as the expected shape.
    #[error("Failed to parse board API response: {0}")]
    Parse(String),
}

impl MiroError {
    /// Classify a non-success HTTP response.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Unauthorized { status, message },
            404 => Self::NotFound { message },
            408 => Self::Timeout(message),
            429 => Self::RateLimited { message },
            500..=599 => Self::Server { status, message },
            _ => Self::Api { status, message },
        }
    }

    /// The HTTP status carried by this error, when there is one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status, .. } | Self::Server { status, .. } | Self::Api { status, .. } => {
                Some(*status)
            }
            Self::NotFound { .. } => Some(404),
            Self::RateLimited { .. } => Some(429),
            Self::Timeout(_) => Some(408),
            _ => None,
        }
    }

    /// Returns the retry classification for this error.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            // Transient - retry with backoff
            Self::RateLimited { .. } | Self::Timeout(_) | Self::Server { .. } | Self::Network(_) => {
                RetryClass::WithBackoff
            }

            // Terminal - bad credential, bad input, stale object, bad body
            Self::InvalidToken(_)
            | Self::Unauthorized { .. }
            | Self::NotFound { .. }
            | Self::Api { .. }
            | Self::Parse(_) => RetryClass::Never,
        }
    }

    /// True when this error represents a missing object (stale id).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<reqwest::Error> for MiroError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
