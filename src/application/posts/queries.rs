use std::collections::HashMap;

use futures::future::try_join_all;
use serde_json::Value;
use tracing::warn;

use crate::application::pagination::{CursorPage, PageRequest, PostCursor};
use crate::application::store::{
    CollectionQuery, SortDirection, StartAfter, StoreError, from_document,
};
use crate::domain::posts::{PostCounter, PostMeta, PostSource};
use crate::domain::types::View;
use crate::util::timestamp::to_millis;

use super::service::PostService;
use super::types::{PostEditorState, PostError, PostSummary};

pub const MAX_PAGE_SIZE: u32 = 100;

const ORDER_FIELD: &str = "lastUpdated";
const READ_COUNT_FIELD: &str = "readCount";

impl PostService {
    /// One page of posts, most recently updated first, each joined with its
    /// read count.
    ///
    /// `has_more` is exact: one row beyond the page is fetched to decide it.
    pub async fn list_posts(
        &self,
        page: PageRequest<PostCursor>,
    ) -> Result<CursorPage<PostSummary, PostCursor>, PostError> {
        if page.limit == 0 || page.limit > MAX_PAGE_SIZE {
            return Err(PostError::ValidationFailed {
                field: "page_size",
                reason: format!("page size must be between 1 and {MAX_PAGE_SIZE}"),
            });
        }

        let query = CollectionQuery {
            order_by: ORDER_FIELD.to_string(),
            direction: SortDirection::Descending,
            limit: page.limit + 1,
            start_after: page.cursor.as_ref().map(|cursor| StartAfter {
                value: Value::from(to_millis(cursor.last_updated())),
                key: cursor.slug().to_string(),
            }),
        };

        let rows = self
            .store
            .query(View::Meta.collection(), &query)
            .await
            .map_err(PostError::ListFailed)?;

        let mut metas = rows
            .into_iter()
            .map(|row| from_document::<PostMeta>(row.body))
            .collect::<Result<Vec<_>, _>>()
            .map_err(PostError::ListFailed)?;

        let has_more = metas.len() > page.limit as usize;
        metas.truncate(page.limit as usize);
        let next_cursor = if has_more {
            metas
                .last()
                .map(|meta| PostCursor::new(meta.last_updated, meta.slug.clone()))
        } else {
            None
        };

        let counts = self.read_counts(&metas).await?;
        Ok(CursorPage::new(join_read_counts(metas, &counts), next_cursor))
    }

    /// Sum of every post's read count, recomputed on each call.
    pub async fn total_reads(&self) -> Result<i64, PostError> {
        self.store
            .aggregate_sum(View::Counter.collection(), READ_COUNT_FIELD)
            .await
            .map_err(PostError::AggregateQueryFailed)
    }

    /// Meta and source of a post, for populating an editor.
    pub async fn load_post(&self, slug: &str) -> Result<PostEditorState, PostError> {
        let read_failed = |source: StoreError| PostError::ReadFailed {
            slug: slug.to_string(),
            source,
        };

        let (meta, source) = tokio::try_join!(
            self.store.get(View::Meta.collection(), slug),
            self.store.get(View::Source.collection(), slug),
        )
        .map_err(read_failed)?;

        let (Some(meta), Some(source)) = (meta, source) else {
            return Err(PostError::not_found(slug));
        };

        let meta = from_document::<PostMeta>(meta).map_err(read_failed)?;
        let source = from_document::<PostSource>(source).map_err(read_failed)?;

        Ok(PostEditorState {
            meta,
            mdx_source: source.mdx_source,
        })
    }

    async fn read_counts(&self, metas: &[PostMeta]) -> Result<HashMap<String, i64>, PostError> {
        let lookups = metas.iter().map(|meta| async move {
            let document = self
                .store
                .get(View::Counter.collection(), &meta.slug)
                .await?;
            Ok::<_, StoreError>((meta.slug.as_str(), document))
        });

        let documents = try_join_all(lookups).await.map_err(PostError::ListFailed)?;

        let mut counts = HashMap::with_capacity(documents.len());
        for (slug, document) in documents {
            let Some(document) = document else {
                continue;
            };
            match from_document::<PostCounter>(document) {
                Ok(counter) => {
                    counts.insert(slug.to_string(), counter.read_count);
                }
                Err(err) => warn!(
                    target = "application::posts::list_posts",
                    slug,
                    error = %err,
                    "ignoring unreadable read counter"
                ),
            }
        }

        Ok(counts)
    }
}

/// Attach read counts to meta rows by slug. Rows without a count keep `None`.
pub fn join_read_counts(metas: Vec<PostMeta>, counts: &HashMap<String, i64>) -> Vec<PostSummary> {
    metas
        .into_iter()
        .map(|meta| {
            let read_count = counts.get(&meta.slug).copied();
            PostSummary { meta, read_count }
        })
        .collect()
}
