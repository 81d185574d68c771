//! The logical post entity and the views it is persisted as.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::Url;

use crate::domain::error::DomainError;
use crate::domain::publication::{PublicationOutcome, PublicationState};
use crate::util::timestamp;

pub const TITLE_MAX_CHARS: usize = 100;

/// Listing/dashboard record; the source of truth for whether a post exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMeta {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub featured_image: Option<String>,
    pub slug: String,
    pub is_public: bool,
    pub is_published: bool,
    #[serde(default, with = "timestamp::option_millis")]
    pub published_date: Option<OffsetDateTime>,
    #[serde(with = "timestamp::millis")]
    pub last_updated: OffsetDateTime,
}

impl PostMeta {
    pub fn publication(&self) -> PublicationState {
        PublicationState {
            is_published: self.is_published,
            published_date: self.published_date,
        }
    }
}

/// Editable source form read back into the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSource {
    pub mdx_source: String,
}

/// Public-facing rendering of the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRendered {
    pub rendered_content: String,
}

/// Read counter, owned by the read-tracking collaborator after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCounter {
    pub read_count: i64,
}

/// Partial meta update written when only visibility changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityPatch {
    pub is_public: bool,
    pub is_published: bool,
    #[serde(with = "timestamp::option_millis")]
    pub published_date: Option<OffsetDateTime>,
    #[serde(with = "timestamp::millis")]
    pub last_updated: OffsetDateTime,
}

/// Author input for creating or editing a post, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub author: String,
    pub featured_image: Option<String>,
    pub mdx_source: String,
    pub requested_public: bool,
}

/// A draft whose fields satisfy the post constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDraft {
    pub title: String,
    pub author: String,
    pub featured_image: Option<String>,
    pub mdx_source: String,
    pub requested_public: bool,
}

impl PostDraft {
    pub fn validate(self) -> Result<ValidatedDraft, DomainError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::validation("title", "title is required"));
        }
        if title.chars().count() > TITLE_MAX_CHARS {
            return Err(DomainError::validation(
                "title",
                format!("title must be at most {TITLE_MAX_CHARS} characters"),
            ));
        }

        let author = self.author.trim().to_string();
        if author.is_empty() {
            return Err(DomainError::validation("author", "author is required"));
        }

        let featured_image = normalize_featured_image(self.featured_image)?;

        Ok(ValidatedDraft {
            title,
            author,
            featured_image,
            mdx_source: self.mdx_source,
            requested_public: self.requested_public,
        })
    }
}

fn normalize_featured_image(value: Option<String>) -> Result<Option<String>, DomainError> {
    let Some(raw) = value else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    Url::parse(trimmed).map_err(|err| {
        DomainError::validation("featured_image", format!("`{trimmed}` is not a URL: {err}"))
    })?;

    Ok(Some(trimmed.to_string()))
}

/// The logical post assembled from validated input, ready to fan out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub slug: String,
    pub title: String,
    pub author: String,
    pub featured_image: Option<String>,
    pub mdx_source: String,
    pub rendered_content: String,
    pub is_public: bool,
    pub is_published: bool,
    pub published_date: Option<OffsetDateTime>,
    pub last_updated: OffsetDateTime,
}

impl Post {
    pub fn assemble(
        slug: String,
        draft: ValidatedDraft,
        rendered_content: String,
        publication: PublicationOutcome,
        last_updated: OffsetDateTime,
    ) -> Self {
        Self {
            slug,
            title: draft.title,
            author: draft.author,
            featured_image: draft.featured_image,
            mdx_source: draft.mdx_source,
            rendered_content,
            is_public: publication.is_public,
            is_published: publication.is_published,
            published_date: publication.published_date,
            last_updated,
        }
    }

    pub fn meta(&self) -> PostMeta {
        PostMeta {
            title: self.title.clone(),
            author: self.author.clone(),
            featured_image: self.featured_image.clone(),
            slug: self.slug.clone(),
            is_public: self.is_public,
            is_published: self.is_published,
            published_date: self.published_date,
            last_updated: self.last_updated,
        }
    }

    pub fn source(&self) -> PostSource {
        PostSource {
            mdx_source: self.mdx_source.clone(),
        }
    }

    pub fn rendered(&self) -> PostRendered {
        PostRendered {
            rendered_content: self.rendered_content.clone(),
        }
    }
}

/// Remove newline characters from rendered output before it is stored.
pub fn strip_line_breaks(html: &str) -> String {
    html.replace('\n', "")
}
