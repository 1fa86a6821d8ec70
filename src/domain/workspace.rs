//! Workspace root and the containment rules every resolved path must satisfy.
//!
//! Resolution here is lexical, mirroring how CI tooling resolves relative
//! inputs: `..` segments are collapsed without touching the file system.
//! Callers that hand paths to external tools additionally canonicalise existing
//! files through [`Workspace::ensure_canonical`] so symlinks cannot escape.

use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

use super::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Canonicalise `root` and adopt it as the workspace.
    pub fn open(root: &Path) -> io::Result<Self> {
        let root = fs::canonicalize(root)?;
        if !root.is_dir() {
            return Err(io::Error::other(format!(
                "workspace `{}` is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn contains(&self, path: &Path) -> bool {
        normalize_lexically(path).starts_with(&self.root)
    }

    /// Resolve `candidate` against `base` the way a shell would, without
    /// consulting the file system.
    pub fn resolve(&self, base: &Path, candidate: impl AsRef<Path>) -> PathBuf {
        normalize_lexically(&base.join(candidate))
    }

    /// Lexically resolve and reject anything that lands outside the root.
    pub fn ensure_contained(
        &self,
        base: &Path,
        candidate: impl AsRef<Path>,
        label: &'static str,
    ) -> Result<PathBuf, DomainError> {
        let candidate = candidate.as_ref();
        let resolved = self.resolve(base, candidate);
        if self.contains(&resolved) {
            Ok(resolved)
        } else {
            Err(DomainError::outside_workspace(
                label,
                candidate.display().to_string(),
            ))
        }
    }

    /// Follow symlinks of an existing path and check the real location.
    pub fn ensure_canonical(&self, path: &Path, label: &'static str) -> Result<(), DomainError> {
        match fs::canonicalize(path) {
            Ok(real) if real.starts_with(&self.root) => Ok(()),
            Ok(real) => Err(DomainError::outside_workspace(
                label,
                real.display().to_string(),
            )),
            Err(_) => Ok(()),
        }
    }

    /// Workspace-relative, forward-slash path; `.` for the root itself.
    pub fn display_relative(&self, path: &Path) -> String {
        let normalized = normalize_lexically(path);
        match normalized.strip_prefix(&self.root) {
            Ok(relative) if relative.as_os_str().is_empty() => ".".to_string(),
            Ok(relative) => forward_slashes(relative),
            Err(_) => forward_slashes(&normalized),
        }
    }

    pub fn relative_dir(&self, path: &Path) -> PathBuf {
        path.parent()
            .and_then(|parent| parent.strip_prefix(&self.root).ok())
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }
}

/// Collapse `.` and `..` components. `..` at the root stays at the root.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}

pub fn forward_slashes(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
