use serde::Serialize;
use thiserror::Error;

use crate::application::pagination::PaginationError;
use crate::application::render::RenderError;
use crate::application::store::StoreError;
use crate::domain::error::DomainError;
use crate::domain::posts::{PostDraft, PostMeta};
use crate::domain::slug::SlugError;
use crate::domain::types::{View, WriteOperation};

#[derive(Debug, Error)]
pub enum PostError {
    #[error("post `{slug}` not found")]
    NotFound { slug: String },
    #[error("post `{slug}` already exists")]
    AlreadyExists { slug: String },
    #[error("validation failed for `{field}`: {reason}")]
    ValidationFailed { field: &'static str, reason: String },
    #[error("{operation} of post `{slug}` failed at the {step} view")]
    WriteStepFailed {
        operation: WriteOperation,
        slug: String,
        step: View,
        /// Views already written before the failing step; these are not rolled back.
        completed: Vec<View>,
        #[source]
        source: StoreError,
    },
    #[error("failed to read post `{slug}`")]
    ReadFailed {
        slug: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to encode the {view} document")]
    Encoding {
        view: View,
        #[source]
        source: StoreError,
    },
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to load posts")]
    ListFailed(#[source] StoreError),
    #[error("failed to aggregate read counts")]
    AggregateQueryFailed(#[source] StoreError),
    #[error(transparent)]
    Pagination(#[from] PaginationError),
}

impl PostError {
    pub fn not_found(slug: &str) -> Self {
        Self::NotFound {
            slug: slug.to_string(),
        }
    }

    /// Message suitable for showing to the author.
    pub fn user_message(&self) -> &'static str {
        match self {
            PostError::NotFound { .. } => "Post not found",
            PostError::AlreadyExists { .. } => "A post with this slug already exists",
            PostError::ValidationFailed { .. } | PostError::Render(_) => {
                "Post could not be saved: check the highlighted fields"
            }
            PostError::WriteStepFailed { operation, .. } => match operation {
                WriteOperation::Create => "Failed to save post",
                WriteOperation::Edit => "Failed to update post",
                WriteOperation::SetVisibility => "Failed to update post status",
                WriteOperation::Delete => "Failed to delete post",
            },
            PostError::ReadFailed { .. } | PostError::Encoding { .. } => "Failed to load post",
            PostError::ListFailed(_) | PostError::Pagination(_) => "Failed to load posts",
            PostError::AggregateQueryFailed(_) => "Failed to load read statistics",
        }
    }
}

impl From<DomainError> for PostError {
    fn from(error: DomainError) -> Self {
        let DomainError::Validation { field, reason } = error;
        PostError::ValidationFailed { field, reason }
    }
}

impl From<SlugError> for PostError {
    fn from(error: SlugError) -> Self {
        PostError::ValidationFailed {
            field: "slug",
            reason: error.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    /// Explicit slug; derived from the title when absent.
    pub slug: Option<String>,
    pub draft: PostDraft,
}

/// Meta view joined with the matching counter view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    #[serde(flatten)]
    pub meta: PostMeta,
    /// Absent when the post has no counter row.
    pub read_count: Option<i64>,
}

/// What an editor needs to populate its form for an existing post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEditorState {
    pub meta: PostMeta,
    pub mdx_source: String,
}

impl PostEditorState {
    /// Draft pre-filled with the stored values, ready to be modified and resubmitted.
    pub fn to_draft(&self) -> PostDraft {
        PostDraft {
            title: self.meta.title.clone(),
            author: self.meta.author.clone(),
            featured_image: self.meta.featured_image.clone(),
            mdx_source: self.mdx_source.clone(),
            requested_public: self.meta.is_public,
        }
    }
}
