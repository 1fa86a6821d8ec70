use askama::Template;

use crate::domain::manifest::{ConversionResult, Manifest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub markdown: String,
    pub pdf: String,
    /// Empty when no HTML was kept for the document.
    pub html: String,
    pub css: Vec<String>,
}

impl From<&ConversionResult> for SummaryRow {
    fn from(result: &ConversionResult) -> Self {
        Self {
            markdown: result.markdown.clone(),
            pdf: result.pdf.clone(),
            html: result.html.clone().unwrap_or_default(),
            css: result.css.clone(),
        }
    }
}

/// Run report written to the host's step summary.
#[derive(Debug, Template)]
#[template(path = "summary.html")]
pub struct RunSummary {
    count: usize,
    show_html: bool,
    rows: Vec<SummaryRow>,
}

impl RunSummary {
    pub fn from_manifest(manifest: &Manifest, show_html: bool) -> Self {
        Self {
            count: manifest.len(),
            show_html,
            rows: manifest.entries().iter().map(SummaryRow::from).collect(),
        }
    }

    pub fn to_html(&self) -> Result<String, askama::Error> {
        self.render()
    }
}
