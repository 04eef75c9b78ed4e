//! Access-token sanitization.
//!
//! Tokens arrive from job payloads, environment variables, and request
//! bodies, and copy/paste readily smuggles in whitespace, zero-width
//! characters, and other control bytes. A malformed token placed in an
//! `Authorization` header produces opaque transport failures, so the token is
//! normalized and validated once, before any request is built.

use crate::error::{MiroError, Result};

/// Zero-width and BOM code points that survive a visual inspection but break
/// header encoding.
const ZERO_WIDTH: [char; 4] = ['\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}'];

/// Sanitize a bearer token for use in a transport header.
///
/// Strips surrounding whitespace, embedded whitespace/control characters, and
/// zero-width characters. Rejects tokens that are empty after stripping or
/// that contain non-ASCII characters (never valid in a Miro token, and not
/// representable in a header without escaping).
pub fn sanitize_access_token(raw: &str) -> Result<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control() && !ZERO_WIDTH.contains(c))
        .collect();

    if cleaned.is_empty() {
        return Err(MiroError::InvalidToken(
            "token is empty after removing whitespace".to_string(),
        ));
    }

    if let Some(bad) = cleaned.chars().find(|c| !c.is_ascii()) {
        return Err(MiroError::InvalidToken(format!(
            "token contains non-ASCII character U+{:04X}",
            bad as u32
        )));
    }

    Ok(cleaned)
}
