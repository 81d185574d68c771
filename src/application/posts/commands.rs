use metrics::counter;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::application::render::render_content;
use crate::application::store::{Document, StoreError, from_document, to_document};
use crate::domain::posts::{Post, PostCounter, PostDraft, PostMeta, VisibilityPatch};
use crate::domain::publication::{PublicationMode, PublicationState, next_publication_state};
use crate::domain::slug::{derive_slug, validate_slug};
use crate::domain::types::{View, WriteOperation};

use super::service::PostService;
use super::types::{CreatePostCommand, PostError};
use super::{METRIC_POST_WRITE_STEP_FAILED_TOTAL, METRIC_POST_WRITE_TOTAL};

/// Sequential, non-transactional write across the views of one post.
///
/// Each step is awaited before the next is issued. The first failing step ends
/// the sequence and completed steps stay applied; every step is an
/// overwrite-by-key so rerunning the whole operation converges.
struct FanOut<'a> {
    service: &'a PostService,
    operation: WriteOperation,
    slug: &'a str,
    completed: Vec<View>,
}

impl<'a> FanOut<'a> {
    fn new(service: &'a PostService, operation: WriteOperation, slug: &'a str) -> Self {
        Self {
            service,
            operation,
            slug,
            completed: Vec::with_capacity(View::ALL.len()),
        }
    }

    async fn set(&mut self, view: View, document: Document) -> Result<(), PostError> {
        let result = self
            .service
            .store
            .set(view.collection(), self.slug, document)
            .await;
        self.record(view, result)
    }

    async fn update(&mut self, view: View, fields: Document) -> Result<(), PostError> {
        let result = self
            .service
            .store
            .update(view.collection(), self.slug, fields)
            .await;
        self.record(view, result)
    }

    async fn delete(&mut self, view: View) -> Result<(), PostError> {
        let result = self
            .service
            .store
            .delete(view.collection(), self.slug)
            .await;
        self.record(view, result)
    }

    fn record(&mut self, view: View, result: Result<(), StoreError>) -> Result<(), PostError> {
        match result {
            Ok(()) => {
                debug!(
                    target = "application::posts::fan_out",
                    operation = self.operation.as_str(),
                    slug = self.slug,
                    step = view.as_str(),
                    "view written"
                );
                self.completed.push(view);
                Ok(())
            }
            Err(source) => {
                warn!(
                    target = "application::posts::fan_out",
                    operation = self.operation.as_str(),
                    slug = self.slug,
                    step = view.as_str(),
                    completed = ?self.completed,
                    error = %source,
                    "view write failed; completed steps are left in place"
                );
                counter!(
                    METRIC_POST_WRITE_STEP_FAILED_TOTAL,
                    "operation" => self.operation.as_str(),
                    "step" => view.as_str()
                )
                .increment(1);
                Err(PostError::WriteStepFailed {
                    operation: self.operation,
                    slug: self.slug.to_string(),
                    step: view,
                    completed: self.completed.clone(),
                    source,
                })
            }
        }
    }

    fn finish(self) {
        counter!(METRIC_POST_WRITE_TOTAL, "operation" => self.operation.as_str()).increment(1);
        info!(
            target = "application::posts::fan_out",
            operation = self.operation.as_str(),
            slug = self.slug,
            "post views written"
        );
    }
}

impl PostService {
    /// Create a post and write its meta, source, rendered and counter views, in
    /// that order.
    ///
    /// Fails with [`PostError::AlreadyExists`] whenever meta exists for the
    /// slug, including meta left behind by a failed create or delete. Such a
    /// slug is cleared with [`PostService::delete_post`].
    pub async fn create_post(&self, command: CreatePostCommand) -> Result<PostMeta, PostError> {
        let CreatePostCommand { slug, draft } = command;
        let draft = draft.validate()?;
        let slug = match slug {
            Some(explicit) => {
                let explicit = explicit.trim().to_string();
                validate_slug(&explicit)?;
                explicit
            }
            None => derive_slug(&draft.title)?,
        };
        let rendered_content = render_content(self.renderer.as_ref(), &draft.mdx_source)?;

        if self.read_meta(&slug).await?.is_some() {
            return Err(PostError::AlreadyExists { slug });
        }

        let now = self.clock.now();
        let publication = next_publication_state(
            PublicationState::UNPUBLISHED,
            draft.requested_public,
            PublicationMode::Create,
            now,
        );
        let post = Post::assemble(slug, draft, rendered_content, publication, now);
        let meta = post.meta();

        let meta_doc = encode(View::Meta, &meta)?;
        let source_doc = encode(View::Source, &post.source())?;
        let rendered_doc = encode(View::Rendered, &post.rendered())?;
        let counter_doc = encode(View::Counter, &PostCounter { read_count: 0 })?;

        let mut fan_out = FanOut::new(self, WriteOperation::Create, &post.slug);
        fan_out.set(View::Meta, meta_doc).await?;
        fan_out.set(View::Source, source_doc).await?;
        fan_out.set(View::Rendered, rendered_doc).await?;
        fan_out.set(View::Counter, counter_doc).await?;
        fan_out.finish();

        Ok(meta)
    }

    /// Replace the content of an existing post, updating its meta, source and
    /// rendered views. The counter is untouched and missing views are not
    /// recreated.
    pub async fn edit_post(&self, slug: &str, draft: PostDraft) -> Result<PostMeta, PostError> {
        let draft = draft.validate()?;
        let rendered_content = render_content(self.renderer.as_ref(), &draft.mdx_source)?;

        let current = self
            .read_meta(slug)
            .await?
            .ok_or_else(|| PostError::not_found(slug))?;

        let now = self.clock.now();
        let publication = next_publication_state(
            current.publication(),
            draft.requested_public,
            PublicationMode::Edit,
            now,
        );
        let last_updated = monotonic(now, Some(&current));
        let post = Post::assemble(
            current.slug.clone(),
            draft,
            rendered_content,
            publication,
            last_updated,
        );
        let meta = post.meta();

        let meta_doc = encode(View::Meta, &meta)?;
        let source_doc = encode(View::Source, &post.source())?;
        let rendered_doc = encode(View::Rendered, &post.rendered())?;

        let mut fan_out = FanOut::new(self, WriteOperation::Edit, slug);
        fan_out.update(View::Meta, meta_doc).await?;
        fan_out.update(View::Source, source_doc).await?;
        fan_out.update(View::Rendered, rendered_doc).await?;
        fan_out.finish();

        Ok(meta)
    }

    /// Show or hide a post. The first time a post is shown it is published;
    /// hiding it afterwards keeps the publication latch and date.
    pub async fn set_visibility(
        &self,
        slug: &str,
        requested_public: bool,
    ) -> Result<PostMeta, PostError> {
        let current = self
            .read_meta(slug)
            .await?
            .ok_or_else(|| PostError::not_found(slug))?;

        let now = self.clock.now();
        let publication = next_publication_state(
            current.publication(),
            requested_public,
            PublicationMode::Edit,
            now,
        );
        let patch = VisibilityPatch {
            is_public: publication.is_public,
            is_published: publication.is_published,
            published_date: publication.published_date,
            last_updated: monotonic(now, Some(&current)),
        };
        let patch_doc = encode(View::Meta, &patch)?;

        let mut fan_out = FanOut::new(self, WriteOperation::SetVisibility, slug);
        fan_out.update(View::Meta, patch_doc).await?;
        fan_out.finish();

        Ok(PostMeta {
            is_public: patch.is_public,
            is_published: patch.is_published,
            published_date: patch.published_date,
            last_updated: patch.last_updated,
            ..current
        })
    }

    /// Remove every view of a post: rendered, counter, source, then meta.
    ///
    /// Meta goes last so a partially deleted post stays listed and a retry
    /// can find and finish it.
    pub async fn delete_post(&self, slug: &str) -> Result<(), PostError> {
        if self.read_meta(slug).await?.is_none() {
            return Err(PostError::not_found(slug));
        }

        let mut fan_out = FanOut::new(self, WriteOperation::Delete, slug);
        fan_out.delete(View::Rendered).await?;
        fan_out.delete(View::Counter).await?;
        fan_out.delete(View::Source).await?;
        fan_out.delete(View::Meta).await?;
        fan_out.finish();

        Ok(())
    }

    pub(crate) async fn read_meta(&self, slug: &str) -> Result<Option<PostMeta>, PostError> {
        let document = self
            .store
            .get(View::Meta.collection(), slug)
            .await
            .map_err(|source| PostError::ReadFailed {
                slug: slug.to_string(),
                source,
            })?;

        document
            .map(from_document::<PostMeta>)
            .transpose()
            .map_err(|source| PostError::ReadFailed {
                slug: slug.to_string(),
                source,
            })
    }
}

fn encode<T: serde::Serialize>(view: View, value: &T) -> Result<Document, PostError> {
    to_document(value).map_err(|source| PostError::Encoding { view, source })
}

/// `lastUpdated` never moves backwards for a slug, even if the clock does.
fn monotonic(now: OffsetDateTime, previous: Option<&PostMeta>) -> OffsetDateTime {
    match previous {
        Some(meta) if meta.last_updated > now => meta.last_updated,
        _ => now,
    }
}
