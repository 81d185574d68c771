//! Application services layer.

pub mod clock;
pub mod editor;
pub mod error;
pub mod pagination;
pub mod posts;
pub mod render;
pub mod store;
