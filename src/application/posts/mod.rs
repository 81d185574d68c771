//! Post persistence and publication engine.
//!
//! Commands fan one logical change out across the meta, source, rendered and
//! counter views; queries read the meta view back as cursor pages joined with
//! read counts.

mod commands;
mod listing;
mod queries;
mod service;
mod types;

pub use listing::{DEFAULT_LOAD_MORE_SIZE, DEFAULT_PAGE_SIZE, DashboardListing, ListingBatch};
pub use queries::{MAX_PAGE_SIZE, join_read_counts};
pub use service::PostService;
pub use types::{CreatePostCommand, PostEditorState, PostError, PostSummary};

pub const METRIC_POST_WRITE_TOTAL: &str = "folio_post_write_total";
pub const METRIC_POST_WRITE_STEP_FAILED_TOTAL: &str = "folio_post_write_step_failed_total";
