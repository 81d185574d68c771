//! Cursor pagination for the post listing.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use crate::util::timestamp;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PostCursorPayload {
    #[serde(with = "timestamp::millis")]
    last_updated: OffsetDateTime,
    slug: String,
}

/// Cursor identifying the last row of a listing page.
///
/// Listings are ordered by `last_updated` descending with the slug as tie
/// breaker, so the pair pins an exact position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCursor {
    last_updated: OffsetDateTime,
    slug: String,
}

impl PostCursor {
    pub fn new(last_updated: OffsetDateTime, slug: impl Into<String>) -> Self {
        Self {
            last_updated,
            slug: slug.into(),
        }
    }

    pub fn last_updated(&self) -> OffsetDateTime {
        self.last_updated
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn encode(&self) -> String {
        let payload = PostCursorPayload {
            last_updated: self.last_updated,
            slug: self.slug.clone(),
        };
        let serialized =
            serde_json::to_vec(&payload).expect("serializing post cursor payload should succeed");
        URL_SAFE_NO_PAD.encode(serialized)
    }

    pub fn decode(cursor: &str) -> Result<Self, PaginationError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(cursor)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        let payload: PostCursorPayload = serde_json::from_slice(&bytes)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        Ok(Self {
            last_updated: payload.last_updated,
            slug: payload.slug,
        })
    }
}

/// Cursor-aware pagination request.
#[derive(Debug, Clone)]
pub struct PageRequest<C> {
    pub limit: u32,
    pub cursor: Option<C>,
}

impl<C> PageRequest<C> {
    pub fn new(limit: u32, cursor: Option<C>) -> Self {
        Self { limit, cursor }
    }

    pub fn first(limit: u32) -> Self {
        Self {
            limit,
            cursor: None,
        }
    }
}

/// Cursor-aware page result.
#[derive(Debug, Clone)]
pub struct CursorPage<T, C> {
    pub items: Vec<T>,
    pub next_cursor: Option<C>,
    pub has_more: bool,
}

impl<T, C> CursorPage<T, C> {
    pub fn new(items: Vec<T>, next_cursor: Option<C>) -> Self {
        let has_more = next_cursor.is_some();
        Self {
            items,
            next_cursor,
            has_more,
        }
    }
}

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
}
