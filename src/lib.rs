//! Folio: post persistence and publication-state engine for a single-author blog.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod util;
