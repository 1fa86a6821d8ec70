use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("front matter is not valid YAML: {message}")]
    FrontMatter { message: String },
    #[error("cannot use {label} outside workspace: {path}")]
    OutsideWorkspace { label: &'static str, path: String },
}

impl DomainError {
    pub fn front_matter(message: impl Into<String>) -> Self {
        Self::FrontMatter {
            message: message.into(),
        }
    }

    pub fn outside_workspace(label: &'static str, path: impl Into<String>) -> Self {
        Self::OutsideWorkspace {
            label,
            path: path.into(),
        }
    }
}
