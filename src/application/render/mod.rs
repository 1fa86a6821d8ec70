//! HTML assembly for a single document.
//!
//! Rendering is pure: the same Markdown, metadata and stylesheet text always
//! produce byte-identical HTML. Title and language are escaped by the template;
//! the body, stylesheets and extra head markup are trusted and inserted as-is.

mod markdown;
mod summary;

use askama::Template;
use comrak::options::Options;

pub use summary::{RunSummary, SummaryRow};

/// Inputs for one document. `stylesheets` are CSS texts in resolution order.
#[derive(Debug, Clone, Copy)]
pub struct DocumentParts<'a> {
    pub title: &'a str,
    pub lang: &'a str,
    pub markdown: &'a str,
    pub stylesheets: &'a [&'a str],
}

#[derive(Template)]
#[template(path = "document.html")]
struct DocumentTemplate<'a> {
    lang: &'a str,
    title: &'a str,
    extra_head: &'a str,
    css: &'a str,
    body: &'a str,
}

pub struct DocumentRenderer {
    options: Options<'static>,
    extra_head: Option<String>,
}

impl DocumentRenderer {
    pub fn new(extra_head: Option<String>) -> Self {
        Self {
            options: markdown::default_options(),
            extra_head,
        }
    }

    pub fn render(&self, parts: &DocumentParts<'_>) -> Result<String, askama::Error> {
        let body = markdown::render_body(parts.markdown, &self.options);
        let css = parts.stylesheets.join("\n\n");
        DocumentTemplate {
            lang: parts.lang,
            title: parts.title,
            extra_head: self.extra_head.as_deref().unwrap_or_default(),
            css: &css,
            body: &body,
        }
        .render()
    }
}
