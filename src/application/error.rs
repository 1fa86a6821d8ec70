use std::{io, path::Path};

use thiserror::Error;

use crate::{application::pdf::PdfError, domain::error::DomainError, infra::error::InfraError};

/// Top-level failure of a batch run. Every variant is fatal.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("{0}")]
    Configuration(String),
    #[error("{message}")]
    Validation { document: String, message: String },
    #[error("failed to render {document}: {source}")]
    Render {
        document: String,
        #[source]
        source: PdfError,
    },
    #[error("failed to assemble HTML for {document}: {source}")]
    Template {
        document: String,
        #[source]
        source: askama::Error,
    },
    #[error("{action} `{path}`: {source}")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },
}

impl AppError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn validation(document: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            document: document.into(),
            message: message.into(),
        }
    }

    /// Attribute a domain rule violation to the document that triggered it.
    pub fn document(document: impl Into<String>, error: DomainError) -> Self {
        let document = document.into();
        let message = format!("{document}: {error}");
        Self::Validation { document, message }
    }

    pub fn render(document: impl Into<String>, source: PdfError) -> Self {
        Self::Render {
            document: document.into(),
            source,
        }
    }

    pub fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.display().to_string(),
            source,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            AppError::Render {
                source: PdfError::Timeout { .. },
                ..
            }
        )
    }
}
