//! Markdown conversion seam.
//!
//! The actual converter is an external collaborator supplied by the
//! embedding; the widget only needs something that turns message and article
//! markdown into HTML.

pub trait MarkdownConverter: Send + Sync {
    fn to_html(&self, source: &str) -> String;
}

/// Renders the source text unchanged, for embeddings without a converter.
pub struct PassthroughMarkdown;

impl MarkdownConverter for PassthroughMarkdown {
    fn to_html(&self, source: &str) -> String {
        source.to_owned()
    }
}
