//! Markdown rendering seam for the rendered view.

use std::collections::HashSet;

use ammonia::Builder as AmmoniaBuilder;
use comrak::{Arena, format_html, options::Options, parse_document};
use thiserror::Error;

use crate::domain::posts::strip_line_breaks;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("markdown rendering failed: {message}")]
    Markdown { message: String },
}

pub trait MarkdownRenderer: Send + Sync {
    /// Render author source to HTML.
    fn render(&self, source: &str) -> Result<String, RenderError>;
}

/// Render `source` and strip newlines, producing the stored `renderedContent`.
pub fn render_content(
    renderer: &dyn MarkdownRenderer,
    source: &str,
) -> Result<String, RenderError> {
    renderer.render(source).map(|html| strip_line_breaks(&html))
}

/// CommonMark/GFM renderer with HTML sanitization.
pub struct ComrakRenderer {
    options: Options<'static>,
    sanitizer: AmmoniaBuilder<'static>,
}

impl ComrakRenderer {
    pub fn new() -> Self {
        Self {
            options: default_options(),
            sanitizer: build_sanitizer(),
        }
    }
}

impl Default for ComrakRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer for ComrakRenderer {
    fn render(&self, source: &str) -> Result<String, RenderError> {
        let arena = Arena::new();
        let root = parse_document(&arena, source, &self.options);

        let mut html = String::new();
        format_html(root, &self.options, &mut html).map_err(|err| RenderError::Markdown {
            message: err.to_string(),
        })?;

        Ok(self.sanitizer.clean(&html).to_string())
    }
}

fn default_options() -> Options<'static> {
    let mut options = Options::default();

    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.footnotes = true;

    let render = &mut options.render;
    render.github_pre_lang = true;
    render.r#unsafe = true;

    options
}

fn build_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    let generic: HashSet<&'static str> = HashSet::from(["class", "id", "title", "lang", "dir"]);
    builder.generic_attributes(generic);
    builder.add_tag_attributes("img", &["title", "width", "height", "alt", "loading"]);
    builder.add_tag_attributes("input", &["type", "checked", "disabled"]);
    builder.add_tags(&["input"]);
    builder.add_url_schemes(["http", "https", "mailto", "tel"].iter().copied());

    builder
}
