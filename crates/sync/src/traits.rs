//! Board API abstraction consumed by the sync worker.
//!
//! The worker never talks to the Miro client directly; it goes through these
//! traits so tests can substitute an in-memory board.

use std::sync::Arc;

use async_trait::async_trait;

use atelier_miro::error::Result as MiroResult;
use atelier_miro::types::{
    Board, BoardItem, Card, CreateCardRequest, CreateFrameRequest, CreateShapeRequest,
    CreateTextRequest, Frame, Shape, TextItem, UpdateCardRequest, UpdateShapeRequest,
};

/// The board operations the sync engine consumes.
#[async_trait]
pub trait BoardApiClient: Send + Sync {
    /// Fetch board metadata; also serves as the connectivity probe.
    async fn get_board(&self, board_id: &str) -> MiroResult<Board>;

    async fn list_frames(&self, board_id: &str) -> MiroResult<Vec<Frame>>;

    async fn create_frame(&self, board_id: &str, request: CreateFrameRequest) -> MiroResult<Frame>;

    async fn list_cards(&self, board_id: &str) -> MiroResult<Vec<Card>>;

    async fn create_card(&self, board_id: &str, request: CreateCardRequest) -> MiroResult<Card>;

    async fn update_card(
        &self,
        board_id: &str,
        card_id: &str,
        request: UpdateCardRequest,
    ) -> MiroResult<Card>;

    async fn create_shape(&self, board_id: &str, request: CreateShapeRequest) -> MiroResult<Shape>;

    async fn update_shape(
        &self,
        board_id: &str,
        shape_id: &str,
        request: UpdateShapeRequest,
    ) -> MiroResult<Shape>;

    async fn create_text(&self, board_id: &str, request: CreateTextRequest)
        -> MiroResult<TextItem>;

    async fn get_item(&self, board_id: &str, item_id: &str) -> MiroResult<BoardItem>;
}

/// Builds a board client for a given access credential.
///
/// One sync job may carry its own token; the factory turns whichever
/// credential wins into a ready-to-use client.
pub trait BoardClientFactory: Send + Sync {
    fn create(&self, access_token: &str) -> MiroResult<Arc<dyn BoardApiClient>>;
}
