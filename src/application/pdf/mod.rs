//! Printing assembled HTML documents to PDF.

mod chrome;
mod discovery;

use std::{io, path::PathBuf, time::Duration};

use async_trait::async_trait;
use thiserror::Error;

pub use chrome::ChromeCli;
pub use discovery::discover;

#[derive(Debug, Clone)]
pub struct PdfRequest {
    /// HTML file already on disk; it is opened through a `file://` URL.
    pub html_path: PathBuf,
    pub pdf_path: PathBuf,
    pub disable_sandbox: bool,
    pub timeout: Duration,
}

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Provided chrome_path does not exist: {path}")]
    ExplicitMissing { path: String },
    #[error(
        "Could not locate a Chrome or Chromium executable. Provide chrome_path input to specify it explicitly."
    )]
    NotFound,
    #[error("failed to launch `{path}`: {source}")]
    Spawn {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("renderer I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("cannot address `{path}` as a file URL")]
    Url { path: String },
    #[error("renderer exited with status {exit_code:?}: {stderr}")]
    Exited {
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("renderer exited successfully but produced no PDF: {stderr}")]
    MissingOutput { stderr: String },
    #[error("renderer timed out after {timeout_ms} ms: {stderr}")]
    Timeout { timeout_ms: u64, stderr: String },
}

/// Something that can turn an HTML file into a PDF file.
#[async_trait]
pub trait PdfEngine: Send + Sync {
    async fn render(&self, request: &PdfRequest) -> Result<(), PdfError>;
}
