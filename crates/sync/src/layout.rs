//! Timeline frame geometry.
//!
//! Card positions are parent-relative to the master timeline frame: one
//! column per workflow stage, cards stacked top to bottom within a column.
//! The same geometry runs both directions - outbound placement picks the
//! column's x and stacks below the lowest existing card, inbound moves map
//! an x coordinate back to the nearest column.

use atelier_core::projects::TimelineColumn;
use atelier_miro::types::{Card, Geometry, Position};

/// Column order across the timeline frame, left to right.
pub const COLUMN_ORDER: [TimelineColumn; 5] = [
    TimelineColumn::Overdue,
    TimelineColumn::InProgress,
    TimelineColumn::Review,
    TimelineColumn::Done,
    TimelineColumn::OnHold,
];

/// Width of one column.
pub const COLUMN_WIDTH: f64 = 320.0;

/// Card dimensions.
pub const CARD_WIDTH: f64 = 280.0;
pub const CARD_HEIGHT: f64 = 96.0;

/// Vertical gap between stacked cards.
const CARD_GAP: f64 = 24.0;

/// Y of the first card row, below the column header strip.
const FIRST_ROW_Y: f64 = 140.0;

/// Master frame dimensions.
pub const FRAME_WIDTH: f64 = COLUMN_WIDTH * COLUMN_ORDER.len() as f64;
pub const FRAME_HEIGHT: f64 = 1400.0;

/// Board position of the master timeline frame.
pub fn master_frame_position() -> Position {
    Position::new(0.0, 0.0)
}

pub fn master_frame_geometry() -> Geometry {
    Geometry::new(FRAME_WIDTH, FRAME_HEIGHT)
}

/// Index of a column in the frame, left to right.
pub fn column_index(column: TimelineColumn) -> usize {
    COLUMN_ORDER
        .iter()
        .position(|c| *c == column)
        .unwrap_or(1)
}

/// Center x of a column, in frame coordinates.
pub fn column_center_x(column: TimelineColumn) -> f64 {
    (column_index(column) as f64 + 0.5) * COLUMN_WIDTH
}

/// True when a card's x coordinate falls inside the column.
fn in_column(card: &Card, column: TimelineColumn) -> bool {
    match card.position {
        Some(pos) => (pos.x - column_center_x(column)).abs() <= COLUMN_WIDTH / 2.0,
        None => false,
    }
}

/// Target position for a project's card in the given column: below the
/// lowest existing card so cards never overlap. `exclude_card_id` skips the
/// project's own card when re-deriving its position.
pub fn card_position(
    column: TimelineColumn,
    existing_cards: &[Card],
    exclude_card_id: Option<&str>,
) -> Position {
    let lowest_bottom = existing_cards
        .iter()
        .filter(|c| Some(c.id.as_str()) != exclude_card_id)
        .filter(|c| in_column(c, column))
        .filter_map(|c| {
            let pos = c.position?;
            let height = c
                .geometry
                .and_then(|g| g.height)
                .unwrap_or(CARD_HEIGHT);
            Some(pos.y + height / 2.0)
        })
        .fold(None::<f64>, |acc, bottom| {
            Some(acc.map_or(bottom, |a| a.max(bottom)))
        });

    let y = match lowest_bottom {
        Some(bottom) => bottom + CARD_GAP + CARD_HEIGHT / 2.0,
        None => FIRST_ROW_Y,
    };

    Position::new(column_center_x(column), y)
}

/// Default geometry for a project card.
pub fn card_geometry() -> Geometry {
    Geometry::new(CARD_WIDTH, CARD_HEIGHT)
}

/// Map an x coordinate back to the nearest column (inbound card moves).
pub fn nearest_column(x: f64) -> TimelineColumn {
    COLUMN_ORDER
        .iter()
        .copied()
        .min_by(|a, b| {
            let da = (x - column_center_x(*a)).abs();
            let db = (x - column_center_x(*b)).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(TimelineColumn::InProgress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_miro::types::CardData;

    fn card(id: &str, x: f64, y: f64) -> Card {
        Card {
            id: id.to_string(),
            data: CardData::default(),
            position: Some(Position::new(x, y)),
            geometry: Some(card_geometry()),
        }
    }

    #[test]
    fn columns_have_distinct_centers() {
        let mut centers: Vec<f64> = COLUMN_ORDER.iter().map(|c| column_center_x(*c)).collect();
        centers.dedup();
        assert_eq!(centers.len(), COLUMN_ORDER.len());
    }

    #[test]
    fn first_card_lands_on_the_first_row() {
        let pos = card_position(TimelineColumn::Review, &[], None);
        assert_eq!(pos.x, column_center_x(TimelineColumn::Review));
        assert_eq!(pos.y, FIRST_ROW_Y);
    }

    #[test]
    fn new_card_stacks_below_the_lowest_in_column() {
        let review_x = column_center_x(TimelineColumn::Review);
        let existing = vec![
            card("a", review_x, FIRST_ROW_Y),
            card("b", review_x, FIRST_ROW_Y + 200.0),
            // A card in a different column must not affect stacking.
            card("c", column_center_x(TimelineColumn::Done), FIRST_ROW_Y + 900.0),
        ];

        let pos = card_position(TimelineColumn::Review, &existing, None);
        let expected_y = (FIRST_ROW_Y + 200.0) + CARD_HEIGHT / 2.0 + CARD_GAP + CARD_HEIGHT / 2.0;
        assert_eq!(pos.y, expected_y);
    }

    #[test]
    fn own_card_is_excluded_when_repositioning() {
        let review_x = column_center_x(TimelineColumn::Review);
        let existing = vec![card("mine", review_x, FIRST_ROW_Y)];

        let pos = card_position(TimelineColumn::Review, &existing, Some("mine"));
        assert_eq!(pos.y, FIRST_ROW_Y);
    }

    #[test]
    fn nearest_column_round_trips_centers() {
        for column in COLUMN_ORDER {
            assert_eq!(nearest_column(column_center_x(column)), column);
        }
    }

    #[test]
    fn nearest_column_tolerates_drag_offsets() {
        let x = column_center_x(TimelineColumn::Done) + 70.0;
        assert_eq!(nearest_column(x), TimelineColumn::Done);

        // Far off the frame still snaps to the closest edge column.
        assert_eq!(nearest_column(-5000.0), TimelineColumn::Overdue);
        assert_eq!(nearest_column(50_000.0), TimelineColumn::OnHold);
    }
}
