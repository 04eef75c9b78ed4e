//! Inbound board event payloads and extraction helpers.
//!
//! `canvas_item_sync` jobs carry a change notification from the board
//! platform. This module owns the payload shape and the pure extraction of
//! the fields the worker acts on; the orchestration lives in
//! [`crate::worker`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use atelier_miro::types::BoardItem;

/// What happened to the canvas item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanvasEventType {
    Created,
    Updated,
    Deleted,
}

/// One inbound change notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEvent {
    /// Canvas item the event refers to.
    pub item_id: String,
    pub event_type: CanvasEventType,
    /// When the change happened, per the platform's clock.
    pub timestamp: DateTime<Utc>,
    /// Item type hint ("card", "shape", ...), when the notifier includes it.
    #[serde(default)]
    pub item_type: Option<String>,
}

/// Parse a job payload into an event. `None` means the payload is not a
/// well-formed event and the job cannot be processed.
pub fn parse_event(payload: &Value) -> Option<CanvasEvent> {
    serde_json::from_value(payload.clone()).ok()
}

/// The x coordinate of an item, when the platform included a position.
pub fn item_x(item: &BoardItem) -> Option<f64> {
    item.position.map(|p| p.x)
}

/// Description text carried by a card item.
pub fn card_description(item: &BoardItem) -> Option<&str> {
    item.data.get("description").and_then(Value::as_str)
}

/// Due date carried in a card item's body, as a date.
pub fn card_due_date(item: &BoardItem) -> Option<NaiveDate> {
    let raw = item.data.get("dueDate").and_then(Value::as_str)?;
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}

/// Content text carried by a shape or text item.
pub fn item_content(item: &BoardItem) -> Option<&str> {
    item.data.get("content").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_well_formed_event() {
        let payload = json!({
            "itemId": "card-9",
            "eventType": "updated",
            "timestamp": "2026-03-01T12:00:00Z",
            "itemType": "card",
        });
        let event = parse_event(&payload).unwrap();
        assert_eq!(event.item_id, "card-9");
        assert_eq!(event.event_type, CanvasEventType::Updated);
        assert_eq!(event.item_type.as_deref(), Some("card"));
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(parse_event(&json!({"itemId": "card-9"})).is_none());
        assert!(parse_event(&Value::Null).is_none());
    }

    #[test]
    fn extracts_card_fields() {
        let item = BoardItem {
            id: "card-9".to_string(),
            item_type: "card".to_string(),
            data: json!({
                "description": "<p>projectId:prj-1</p>",
                "dueDate": "2026-04-01T23:59:00Z",
            }),
            position: Some(atelier_miro::types::Position::new(480.0, 140.0)),
        };

        assert_eq!(card_description(&item), Some("<p>projectId:prj-1</p>"));
        assert_eq!(
            card_due_date(&item),
            Some(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap())
        );
        assert_eq!(item_x(&item), Some(480.0));
    }

    #[test]
    fn accepts_date_only_due_dates() {
        let item = BoardItem {
            id: "card-9".to_string(),
            item_type: "card".to_string(),
            data: json!({"dueDate": "2026-04-01"}),
            position: None,
        };
        assert_eq!(
            card_due_date(&item),
            Some(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap())
        );
    }
}
