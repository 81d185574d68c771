use std::sync::Arc;

use crate::application::clock::{Clock, SystemClock};
use crate::application::render::{ComrakRenderer, MarkdownRenderer};
use crate::application::store::CollectionStore;

/// Post persistence and publication engine over a collection store.
#[derive(Clone)]
pub struct PostService {
    pub(crate) store: Arc<dyn CollectionStore>,
    pub(crate) renderer: Arc<dyn MarkdownRenderer>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl PostService {
    pub fn new(
        store: Arc<dyn CollectionStore>,
        renderer: Arc<dyn MarkdownRenderer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            renderer,
            clock,
        }
    }

    /// Service using the comrak renderer and the system clock.
    pub fn with_store(store: Arc<dyn CollectionStore>) -> Self {
        Self::new(store, Arc::new(ComrakRenderer::new()), Arc::new(SystemClock))
    }
}
