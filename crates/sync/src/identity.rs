//! The card-to-project identity channel.
//!
//! The board API offers no custom fields on cards, so the durable identity
//! link is a `projectId:<id>` marker embedded in the card's description text.
//! This is a fragile channel by nature (it survives only as long as nobody
//! strips it from the text), so every encode/decode goes through this module
//! and nothing else in the engine knows the marker syntax.

use regex::Regex;
use std::sync::OnceLock;

const MARKER_PREFIX: &str = "projectId:";

fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Ids are UUIDs or similar opaque tokens; stop at whitespace, tag
    // boundaries, or end of text.
    RE.get_or_init(|| Regex::new(r"projectId:([A-Za-z0-9_-]+)").expect("valid marker regex"))
}

/// Append the identity marker to a card description.
///
/// The marker rides on its own paragraph so user edits above it are
/// preserved on re-sync.
pub fn embed_project_marker(description: &str, project_id: &str) -> String {
    let body = description.trim_end();
    if body.is_empty() {
        format!("<p>{}{}</p>", MARKER_PREFIX, project_id)
    } else {
        format!("{}<p>{}{}</p>", body, MARKER_PREFIX, project_id)
    }
}

/// Extract the project id from free text, scanning anywhere in the content.
///
/// Tolerates the marker being wrapped in markup or surrounded by user text.
pub fn extract_project_id(text: &str) -> Option<String> {
    marker_regex()
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// True when the text carries a marker for this specific project.
pub fn carries_marker(text: &str, project_id: &str) -> bool {
    extract_project_id(text).as_deref() == Some(project_id)
}
