//! Typed REST client for the Miro v2 API.

use std::time::Duration;

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{MiroError, Result};
use crate::token::sanitize_access_token;
use crate::types::*;

const DEFAULT_BASE_URL: &str = "https://api.miro.com/v2";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Page size for list endpoints.
const PAGE_LIMIT: usize = 50;

/// Client for the Miro board REST API.
///
/// One client instance wraps one access token. The token is sanitized at
/// construction so a malformed credential fails loudly here instead of as an
/// opaque transport error later.
#[derive(Debug, Clone)]
pub struct MiroClient {
    client: reqwest::Client,
    base_url: String,
}

impl MiroClient {
    /// Create a client for the given access token.
    pub fn new(access_token: &str) -> Result<Self> {
        Self::with_base_url(access_token, DEFAULT_BASE_URL)
    }

    /// Create a client against a non-default API base (tests, proxies).
    pub fn with_base_url(access_token: &str, base_url: &str) -> Result<Self> {
        let token = sanitize_access_token(access_token)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| MiroError::InvalidToken("token not representable in header".into()))?;
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .default_headers(headers)
            .build()
            .map_err(MiroError::from)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Parse a response body, classifying non-success statuses.
    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        debug!("Board API response ({}): {} bytes", status, body.len());

        if !status.is_success() {
            // The platform's error body has a "message" field when it is JSON
            // at all; fall back to the raw body.
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or(body);
            return Err(MiroError::from_status(status.as_u16(), message));
        }

        serde_json::from_str(&body).map_err(|e| MiroError::Parse(format!("{}: {}", e, body)))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.client.get(url).send().await?;
        Self::parse_response(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        let response = self.client.post(url).json(body).send().await?;
        Self::parse_response(response).await
    }

    async fn patch_json<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        let response = self.client.patch(url).json(body).send().await?;
        Self::parse_response(response).await
    }

    /// Drain a cursor-paginated item listing.
    async fn list_all<T: DeserializeOwned>(&self, base: String) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let url = match &cursor {
                Some(c) => format!("{}&cursor={}", base, urlencoding::encode(c)),
                None => base.clone(),
            };
            let page: ItemPage<T> = self.get_json(&url).await?;
            items.extend(page.data);

            match page.cursor {
                Some(c) if !c.is_empty() => cursor = Some(c),
                _ => return Ok(items),
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Boards
    // ─────────────────────────────────────────────────────────────────────

    /// Fetch board metadata. Doubles as the connectivity/credential probe.
    ///
    /// GET /boards/{board_id}
    pub async fn get_board(&self, board_id: &str) -> Result<Board> {
        let url = format!("{}/boards/{}", self.base_url, urlencoding::encode(board_id));
        self.get_json(&url).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Frames
    // ─────────────────────────────────────────────────────────────────────

    /// GET /boards/{board_id}/items?type=frame
    pub async fn list_frames(&self, board_id: &str) -> Result<Vec<Frame>> {
        let base = format!(
            "{}/boards/{}/items?type=frame&limit={}",
            self.base_url,
            urlencoding::encode(board_id),
            PAGE_LIMIT
        );
        self.list_all(base).await
    }

    /// POST /boards/{board_id}/frames
    pub async fn create_frame(&self, board_id: &str, request: &CreateFrameRequest) -> Result<Frame> {
        let url = format!("{}/boards/{}/frames", self.base_url, urlencoding::encode(board_id));
        self.post_json(&url, request).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cards
    // ─────────────────────────────────────────────────────────────────────

    /// GET /boards/{board_id}/items?type=card
    pub async fn list_cards(&self, board_id: &str) -> Result<Vec<Card>> {
        let base = format!(
            "{}/boards/{}/items?type=card&limit={}",
            self.base_url,
            urlencoding::encode(board_id),
            PAGE_LIMIT
        );
        self.list_all(base).await
    }

    /// POST /boards/{board_id}/cards
    pub async fn create_card(&self, board_id: &str, request: &CreateCardRequest) -> Result<Card> {
        let url = format!("{}/boards/{}/cards", self.base_url, urlencoding::encode(board_id));
        self.post_json(&url, request).await
    }

    /// PATCH /boards/{board_id}/cards/{card_id}
    pub async fn update_card(
        &self,
        board_id: &str,
        card_id: &str,
        request: &UpdateCardRequest,
    ) -> Result<Card> {
        let url = format!(
            "{}/boards/{}/cards/{}",
            self.base_url,
            urlencoding::encode(board_id),
            urlencoding::encode(card_id)
        );
        self.patch_json(&url, request).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Shapes
    // ─────────────────────────────────────────────────────────────────────

    /// POST /boards/{board_id}/shapes
    pub async fn create_shape(&self, board_id: &str, request: &CreateShapeRequest) -> Result<Shape> {
        let url = format!("{}/boards/{}/shapes", self.base_url, urlencoding::encode(board_id));
        self.post_json(&url, request).await
    }

    /// PATCH /boards/{board_id}/shapes/{shape_id}
    pub async fn update_shape(
        &self,
        board_id: &str,
        shape_id: &str,
        request: &UpdateShapeRequest,
    ) -> Result<Shape> {
        let url = format!(
            "{}/boards/{}/shapes/{}",
            self.base_url,
            urlencoding::encode(board_id),
            urlencoding::encode(shape_id)
        );
        self.patch_json(&url, request).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Text
    // ─────────────────────────────────────────────────────────────────────

    /// POST /boards/{board_id}/texts
    pub async fn create_text(&self, board_id: &str, request: &CreateTextRequest) -> Result<TextItem> {
        let url = format!("{}/boards/{}/texts", self.base_url, urlencoding::encode(board_id));
        self.post_json(&url, request).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Generic items
    // ─────────────────────────────────────────────────────────────────────

    /// GET /boards/{board_id}/items/{item_id}
    pub async fn get_item(&self, board_id: &str, item_id: &str) -> Result<BoardItem> {
        let url = format!(
            "{}/boards/{}/items/{}",
            self.base_url,
            urlencoding::encode(board_id),
            urlencoding::encode(item_id)
        );
        self.get_json(&url).await
    }
}
