#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use folio::application::clock::FixedClock;
use folio::application::posts::{CreatePostCommand, PostService};
use folio::application::render::ComrakRenderer;
use folio::application::store::{
    CollectionQuery, CollectionStore, Document, StoreError, StoredDocument,
};
use folio::domain::posts::PostDraft;
use folio::domain::types::View;
use folio::infra::store::MemoryStore;
use time::OffsetDateTime;
use time::macros::datetime;

pub const START: OffsetDateTime = datetime!(2024-06-01 09:00 UTC);

/// Memory store whose individual views, or queries, can be made to fail.
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    failing_writes: Arc<Mutex<HashSet<&'static str>>>,
    failing_reads: Arc<Mutex<bool>>,
}

impl FlakyStore {
    pub fn fail_writes_to(&self, view: View) {
        self.failing_writes
            .lock()
            .unwrap()
            .insert(view.collection());
    }

    pub fn fail_reads(&self, failing: bool) {
        *self.failing_reads.lock().unwrap() = failing;
    }

    pub fn heal(&self) {
        self.failing_writes.lock().unwrap().clear();
        self.fail_reads(false);
    }

    fn check_write(&self, collection: &str) -> Result<(), StoreError> {
        if self.failing_writes.lock().unwrap().contains(collection) {
            return Err(StoreError::from_persistence(format!(
                "{collection} is unavailable"
            )));
        }
        Ok(())
    }

    fn check_read(&self) -> Result<(), StoreError> {
        if *self.failing_reads.lock().unwrap() {
            return Err(StoreError::Timeout);
        }
        Ok(())
    }
}

#[async_trait]
impl CollectionStore for FlakyStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        self.inner.get(collection, key).await
    }

    async fn set(&self, collection: &str, key: &str, document: Document) -> Result<(), StoreError> {
        self.check_write(collection)?;
        self.inner.set(collection, key, document).await
    }

    async fn update(
        &self,
        collection: &str,
        key: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        self.check_write(collection)?;
        self.inner.update(collection, key, fields).await
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        self.check_write(collection)?;
        self.inner.delete(collection, key).await
    }

    async fn query(
        &self,
        collection: &str,
        query: &CollectionQuery,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        self.check_read()?;
        self.inner.query(collection, query).await
    }

    async fn aggregate_sum(&self, collection: &str, field: &str) -> Result<i64, StoreError> {
        self.check_read()?;
        self.inner.aggregate_sum(collection, field).await
    }
}

pub struct Harness {
    pub service: PostService,
    pub store: FlakyStore,
    pub clock: Arc<FixedClock>,
}

pub fn harness() -> Harness {
    let store = FlakyStore::default();
    let clock = Arc::new(FixedClock::new(START));
    let service = PostService::new(
        Arc::new(store.clone()),
        Arc::new(ComrakRenderer::new()),
        clock.clone(),
    );
    Harness {
        service,
        store,
        clock,
    }
}

pub fn draft(title: &str, public: bool) -> PostDraft {
    PostDraft {
        title: title.to_string(),
        author: "Shivam".to_string(),
        featured_image: Some("https://images.example.com/cover.webp".to_string()),
        mdx_source: format!("# {title}\n\nFirst paragraph.\n\n- one\n- two\n"),
        requested_public: public,
    }
}

pub fn create_command(slug: &str, public: bool) -> CreatePostCommand {
    CreatePostCommand {
        slug: Some(slug.to_string()),
        draft: draft(&slug.replace('-', " "), public),
    }
}

pub async fn view(store: &FlakyStore, view: View, slug: &str) -> Option<Document> {
    store
        .inner
        .get(view.collection(), slug)
        .await
        .expect("memory store reads succeed")
}
