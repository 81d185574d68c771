//! Shared domain enumerations aligned with persisted collections.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the denormalized views a logical post is fanned out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Meta,
    Source,
    Rendered,
    Counter,
}

impl View {
    pub const ALL: [View; 4] = [View::Meta, View::Source, View::Rendered, View::Counter];

    pub fn as_str(self) -> &'static str {
        match self {
            View::Meta => "meta",
            View::Source => "source",
            View::Rendered => "rendered",
            View::Counter => "counter",
        }
    }

    /// Name of the store collection backing this view.
    pub fn collection(self) -> &'static str {
        match self {
            View::Meta => "blogMetaCollection",
            View::Source => "blogMDXContentCollection",
            View::Rendered => "blogContentCollection",
            View::Counter => "blogReadCountCollection",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical write operations that fan out across views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOperation {
    Create,
    Edit,
    SetVisibility,
    Delete,
}

impl WriteOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            WriteOperation::Create => "create",
            WriteOperation::Edit => "edit",
            WriteOperation::SetVisibility => "set_visibility",
            WriteOperation::Delete => "delete",
        }
    }
}

impl fmt::Display for WriteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
