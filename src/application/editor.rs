//! Editor buffer holding the live source text of the post being written.
//!
//! The buffer outlives any particular view of it. Handles are cheap clones of
//! the same buffer; live views subscribe and are resynchronized whenever the
//! text is replaced wholesale (for example after loading a post to edit).

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct EditorBuffer {
    sender: Arc<watch::Sender<String>>,
}

/// A live view of the buffer, notified of every replacement.
#[derive(Debug)]
pub struct EditorView {
    receiver: watch::Receiver<String>,
}

impl EditorBuffer {
    pub fn new(initial: impl Into<String>) -> Self {
        let (sender, _receiver) = watch::channel(initial.into());
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn get(&self) -> String {
        self.sender.borrow().clone()
    }

    /// Replace the text and resynchronize every live view.
    pub fn set(&self, value: impl Into<String>) {
        self.sender.send_replace(value.into());
    }

    /// Apply an in-place edit typed into a view.
    pub fn edit(&self, apply: impl FnOnce(&mut String)) {
        self.sender.send_modify(apply);
    }

    pub fn subscribe(&self) -> EditorView {
        EditorView {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for EditorBuffer {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl EditorView {
    /// Text currently shown by this view.
    pub fn text(&self) -> String {
        self.receiver.borrow().clone()
    }

    /// Whether the buffer changed since this view last synchronized.
    pub fn is_stale(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Mark the current text as seen and return it.
    pub fn sync(&mut self) -> String {
        self.receiver.borrow_and_update().clone()
    }

    /// Wait until the buffer is replaced; returns `None` once the buffer is gone.
    pub async fn changed(&mut self) -> Option<String> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}
