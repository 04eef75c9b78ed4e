//! Briefing mirror content: companion frames and per-field shapes.

use atelier_core::projects::{Project, BRIEFING_FIELDS};
use atelier_miro::types::{Geometry, Position, ShapeStyle};
use regex::Regex;
use std::sync::OnceLock;

/// Title of the master timeline frame, shared by every project on a board.
pub const MASTER_FRAME_TITLE: &str = "Project Timeline";

/// Fill for a briefing field that has a value.
const FIELD_FILL: &str = "#f5f6f8";

/// Fill for the "needs attention" placeholder.
const MISSING_FIELD_FILL: &str = "#ffcdd2";

/// Shape dimensions for a briefing field.
pub const FIELD_WIDTH: f64 = 360.0;
pub const FIELD_HEIGHT: f64 = 120.0;
const FIELD_GAP: f64 = 32.0;

/// Briefing frame dimensions.
pub const BRIEFING_FRAME_WIDTH: f64 = FIELD_WIDTH + 120.0;
pub const BRIEFING_FRAME_HEIGHT: f64 =
    (FIELD_HEIGHT + FIELD_GAP) * BRIEFING_FIELDS.len() as f64 + 120.0;

/// Title of a project's briefing frame.
pub fn briefing_frame_title(project: &Project) -> String {
    format!("Briefing: {}", project.name)
}

/// Title of a project's first version frame.
pub fn version_frame_title(project: &Project, version: i32) -> String {
    format!("Version {}: {}", version, project.name)
}

/// Board position of a project's briefing frame, to the right of the
/// timeline frame.
pub fn briefing_frame_position() -> Position {
    Position::new(
        crate::layout::FRAME_WIDTH + BRIEFING_FRAME_WIDTH / 2.0 + 240.0,
        0.0,
    )
}

/// Board position of the first version frame, right of the briefing frame.
pub fn version_frame_position() -> Position {
    Position::new(
        crate::layout::FRAME_WIDTH + BRIEFING_FRAME_WIDTH * 1.5 + 480.0,
        0.0,
    )
}

pub fn briefing_frame_geometry() -> Geometry {
    Geometry::new(BRIEFING_FRAME_WIDTH, BRIEFING_FRAME_HEIGHT)
}

/// Position of the n-th briefing field shape inside the briefing frame.
pub fn field_position(index: usize) -> Position {
    Position::new(
        BRIEFING_FRAME_WIDTH / 2.0,
        100.0 + (index as f64 + 0.5) * (FIELD_HEIGHT + FIELD_GAP),
    )
}

pub fn field_geometry() -> Geometry {
    Geometry::new(FIELD_WIDTH, FIELD_HEIGHT)
}

/// Shape content for one briefing field. A missing value renders as a
/// visually distinct placeholder instead of being skipped, so gaps in the
/// briefing are obvious on the board.
pub fn field_content(label: &str, value: Option<&str>) -> String {
    match value {
        Some(v) => format!("<p><strong>{}</strong></p><p>{}</p>", label, v),
        None => format!("<p><strong>{}</strong></p><p>Needs input</p>", label),
    }
}

/// Style for one briefing field shape.
pub fn field_style(has_value: bool) -> ShapeStyle {
    ShapeStyle {
        fill_color: Some(
            if has_value { FIELD_FILL } else { MISSING_FIELD_FILL }.to_string(),
        ),
        text_align: Some("left".to_string()),
    }
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag regex"))
}

/// Strip board markup down to plain text (inbound briefing-field edits).
///
/// Block-level closings become newlines so multi-paragraph content keeps its
/// line structure.
pub fn strip_formatting(content: &str) -> String {
    let with_breaks = content
        .replace("</p>", "\n")
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n");
    let stripped = tag_regex().replace_all(&with_breaks, "");
    stripped
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .trim()
        .to_string()
}

/// The field value behind a shape's content, with the label line removed.
pub fn field_value_from_content(content: &str, label: &str) -> String {
    let plain = strip_formatting(content);
    plain
        .strip_prefix(label)
        .map(|rest| rest.trim().to_string())
        .unwrap_or(plain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_renders_placeholder() {
        let content = field_content("Objective", None);
        assert!(content.contains("Needs input"));
        assert_eq!(
            field_style(false).fill_color.as_deref(),
            Some(MISSING_FIELD_FILL)
        );
    }

    #[test]
    fn present_field_renders_value() {
        let content = field_content("Objective", Some("Launch the spring line"));
        assert!(content.contains("Launch the spring line"));
        assert!(!content.contains("Needs input"));
        assert_eq!(field_style(true).fill_color.as_deref(), Some(FIELD_FILL));
    }

    #[test]
    fn strip_formatting_flattens_markup() {
        let plain = strip_formatting("<p><strong>Budget</strong></p><p>12k&nbsp;&amp; stretch</p>");
        assert_eq!(plain, "Budget\n12k & stretch");
    }

    #[test]
    fn field_value_drops_the_label_line() {
        let content = "<p><strong>Budget</strong></p><p>12k</p>";
        assert_eq!(field_value_from_content(content, "Budget"), "12k");
    }

    #[test]
    fn field_positions_do_not_overlap() {
        let a = field_position(0);
        let b = field_position(1);
        assert!((b.y - a.y).abs() >= FIELD_HEIGHT);
    }
}
