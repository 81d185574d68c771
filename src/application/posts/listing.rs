//! Dashboard listing session: a first page plus "load more" batches.

use tracing::warn;

use crate::application::pagination::{PageRequest, PostCursor};

use super::service::PostService;
use super::types::{PostError, PostSummary};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_LOAD_MORE_SIZE: u32 = 15;

/// Result of one fetch. A failed fetch carries no rows and its error.
#[derive(Debug)]
pub struct ListingBatch {
    pub items: Vec<PostSummary>,
    pub has_more: bool,
    pub error: Option<PostError>,
}

impl ListingBatch {
    fn failed(error: PostError, has_more: bool) -> Self {
        Self {
            items: Vec::new(),
            has_more,
            error: Some(error),
        }
    }
}

/// Accumulates rows across pages; the cursor only advances on success.
pub struct DashboardListing {
    service: PostService,
    page_size: u32,
    load_more_size: u32,
    cursor: Option<PostCursor>,
    rows: Vec<PostSummary>,
    has_more: bool,
}

impl DashboardListing {
    pub fn new(service: PostService, page_size: u32, load_more_size: u32) -> Self {
        Self {
            service,
            page_size,
            load_more_size,
            cursor: None,
            rows: Vec::new(),
            has_more: false,
        }
    }

    pub fn with_defaults(service: PostService) -> Self {
        Self::new(service, DEFAULT_PAGE_SIZE, DEFAULT_LOAD_MORE_SIZE)
    }

    pub fn rows(&self) -> &[PostSummary] {
        &self.rows
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn cursor(&self) -> Option<&PostCursor> {
        self.cursor.as_ref()
    }

    /// Start over from the most recently updated post.
    pub async fn load_first(&mut self) -> ListingBatch {
        match self
            .service
            .list_posts(PageRequest::first(self.page_size))
            .await
        {
            Ok(page) => {
                self.rows = page.items.clone();
                self.cursor = page.next_cursor;
                self.has_more = page.has_more;
                ListingBatch {
                    items: page.items,
                    has_more: page.has_more,
                    error: None,
                }
            }
            Err(err) => {
                warn!(
                    target = "application::posts::listing::load_first",
                    error = %err,
                    "failed to load posts"
                );
                ListingBatch::failed(err, self.has_more)
            }
        }
    }

    /// Append the next batch. Does nothing once the listing is exhausted.
    pub async fn load_more(&mut self) -> ListingBatch {
        let Some(cursor) = self.cursor.clone() else {
            return ListingBatch {
                items: Vec::new(),
                has_more: false,
                error: None,
            };
        };

        match self
            .service
            .list_posts(PageRequest::new(self.load_more_size, Some(cursor)))
            .await
        {
            Ok(page) => {
                self.rows.extend(page.items.iter().cloned());
                self.cursor = page.next_cursor;
                self.has_more = page.has_more;
                ListingBatch {
                    items: page.items,
                    has_more: page.has_more,
                    error: None,
                }
            }
            Err(err) => {
                warn!(
                    target = "application::posts::listing::load_more",
                    error = %err,
                    "failed to load more posts"
                );
                ListingBatch::failed(err, self.has_more)
            }
        }
    }
}
