//! Rate-limited implementation of [`BoardApiClient`] over the Miro client.
//!
//! Every call acquires a token from the shared rate limiter and runs under
//! its retry policy, so no caller can bypass admission control.

use std::sync::Arc;

use async_trait::async_trait;

use atelier_miro::error::Result as MiroResult;
use atelier_miro::types::{
    Board, BoardItem, Card, CreateCardRequest, CreateFrameRequest, CreateShapeRequest,
    CreateTextRequest, Frame, Shape, TextItem, UpdateCardRequest, UpdateShapeRequest,
};
use atelier_miro::{MiroClient, RateLimiter};

use crate::traits::{BoardApiClient, BoardClientFactory};

/// [`BoardApiClient`] backed by [`MiroClient`] with shared rate limiting.
pub struct RateLimitedBoardClient {
    client: MiroClient,
    limiter: Arc<RateLimiter>,
}

impl RateLimitedBoardClient {
    pub fn new(client: MiroClient, limiter: Arc<RateLimiter>) -> Self {
        Self { client, limiter }
    }
}

#[async_trait]
impl BoardApiClient for RateLimitedBoardClient {
    async fn get_board(&self, board_id: &str) -> MiroResult<Board> {
        self.limiter.execute(|| self.client.get_board(board_id)).await
    }

    async fn list_frames(&self, board_id: &str) -> MiroResult<Vec<Frame>> {
        self.limiter.execute(|| self.client.list_frames(board_id)).await
    }

    async fn create_frame(&self, board_id: &str, request: CreateFrameRequest) -> MiroResult<Frame> {
        self.limiter
            .execute(|| self.client.create_frame(board_id, &request))
            .await
    }

    async fn list_cards(&self, board_id: &str) -> MiroResult<Vec<Card>> {
        self.limiter.execute(|| self.client.list_cards(board_id)).await
    }

    async fn create_card(&self, board_id: &str, request: CreateCardRequest) -> MiroResult<Card> {
        self.limiter
            .execute(|| self.client.create_card(board_id, &request))
            .await
    }

    async fn update_card(
        &self,
        board_id: &str,
        card_id: &str,
        request: UpdateCardRequest,
    ) -> MiroResult<Card> {
        self.limiter
            .execute(|| self.client.update_card(board_id, card_id, &request))
            .await
    }

    async fn create_shape(&self, board_id: &str, request: CreateShapeRequest) -> MiroResult<Shape> {
        self.limiter
            .execute(|| self.client.create_shape(board_id, &request))
            .await
    }

    async fn update_shape(
        &self,
        board_id: &str,
        shape_id: &str,
        request: UpdateShapeRequest,
    ) -> MiroResult<Shape> {
        self.limiter
            .execute(|| self.client.update_shape(board_id, shape_id, &request))
            .await
    }

    async fn create_text(
        &self,
        board_id: &str,
        request: CreateTextRequest,
    ) -> MiroResult<TextItem> {
        self.limiter
            .execute(|| self.client.create_text(board_id, &request))
            .await
    }

    async fn get_item(&self, board_id: &str, item_id: &str) -> MiroResult<BoardItem> {
        self.limiter
            .execute(|| self.client.get_item(board_id, item_id))
            .await
    }
}

/// Factory producing rate-limited Miro clients that share one limiter.
pub struct MiroBoardClientFactory {
    limiter: Arc<RateLimiter>,
}

impl MiroBoardClientFactory {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}

impl BoardClientFactory for MiroBoardClientFactory {
    fn create(&self, access_token: &str) -> MiroResult<Arc<dyn BoardApiClient>> {
        let client = MiroClient::new(access_token)?;
        Ok(Arc::new(RateLimitedBoardClient::new(
            client,
            self.limiter.clone(),
        )))
    }
}
