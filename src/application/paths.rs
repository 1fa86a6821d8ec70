//! Expansion of include/exclude patterns into workspace files.
//!
//! Patterns are evaluated in order and the last matching pattern decides;
//! `!pattern` excludes. A pattern that matches a directory also matches every
//! file below it, so `docs` selects the whole `docs/` tree.

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use globset::{GlobBuilder, GlobMatcher};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::workspace::{Workspace, forward_slashes};

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid pattern `{pattern}`: {source}")]
    Invalid {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

#[derive(Debug)]
struct CompiledPattern {
    matcher: GlobMatcher,
    negated: bool,
}

#[derive(Debug, Clone)]
pub struct PathResolver {
    workspace: Workspace,
}

impl PathResolver {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }

    /// Expand `patterns` to sorted, de-duplicated absolute file paths inside
    /// the workspace. Directories are never returned.
    pub fn expand(&self, patterns: &[String]) -> Result<Vec<PathBuf>, PatternError> {
        let compiled = self.compile(patterns)?;
        if !compiled.iter().any(|pattern| !pattern.negated) {
            return Ok(Vec::new());
        }

        let root = self.workspace.root();
        let mut matches = BTreeSet::new();
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(
                        target = "application::paths",
                        op = "paths::expand",
                        error = %err,
                        "Skipping unreadable entry"
                    );
                    continue;
                }
            };

            let path = entry.path();
            let file_type = entry.file_type();
            let eligible = if file_type.is_file() {
                true
            } else if file_type.is_symlink() {
                self.symlink_stays_inside(path)
            } else {
                false
            };
            if !eligible || !self.workspace.contains(path) {
                continue;
            }

            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            if is_selected(&compiled, &forward_slashes(relative)) {
                matches.insert(path.to_path_buf());
            }
        }

        Ok(matches.into_iter().collect())
    }

    fn compile(&self, patterns: &[String]) -> Result<Vec<CompiledPattern>, PatternError> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let trimmed = pattern.trim();
            if trimmed.is_empty() {
                continue;
            }
            let (negated, body) = match trimmed.strip_prefix('!') {
                Some(rest) => (true, rest.trim_start()),
                None => (false, trimmed),
            };

            let Some(relative) = self.root_relative(body) else {
                warn!(
                    target = "application::paths",
                    op = "paths::compile",
                    pattern = %pattern,
                    "Ignoring pattern that points outside the workspace"
                );
                continue;
            };
            let glob = if relative.is_empty() {
                "**".to_string()
            } else {
                relative
            };

            let matcher = GlobBuilder::new(&glob)
                .literal_separator(true)
                .build()
                .map_err(|source| PatternError::Invalid {
                    pattern: pattern.clone(),
                    source,
                })?
                .compile_matcher();
            compiled.push(CompiledPattern { matcher, negated });
        }

        debug!(
            target = "application::paths",
            op = "paths::compile",
            patterns = compiled.len(),
            "Compiled patterns"
        );
        Ok(compiled)
    }

    /// Rewrite a pattern relative to the workspace root, collapsing `.` and
    /// `..` segments. `None` when the pattern escapes the root.
    fn root_relative(&self, pattern: &str) -> Option<String> {
        let pattern = if cfg!(windows) {
            pattern.replace('\\', "/")
        } else {
            pattern.to_string()
        };

        let rooted = if Path::new(&pattern).is_absolute() {
            let stripped = Path::new(&pattern).strip_prefix(self.workspace.root()).ok()?;
            forward_slashes(stripped)
        } else {
            pattern
        };

        let mut segments: Vec<&str> = Vec::new();
        for segment in rooted.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop()?;
                }
                other => segments.push(other),
            }
        }
        Some(segments.join("/"))
    }

    fn symlink_stays_inside(&self, path: &Path) -> bool {
        match fs::canonicalize(path) {
            Ok(real) => real.starts_with(self.workspace.root()) && real.is_file(),
            Err(_) => false,
        }
    }
}

/// Last matching pattern wins; a match on any ancestor directory counts.
fn is_selected(patterns: &[CompiledPattern], relative: &str) -> bool {
    let candidates = ancestors_and_self(relative);
    let mut selected = false;
    for pattern in patterns {
        if candidates
            .iter()
            .any(|candidate| pattern.matcher.is_match(candidate))
        {
            selected = !pattern.negated;
        }
    }
    selected
}

fn ancestors_and_self(relative: &str) -> Vec<&str> {
    let mut candidates: Vec<&str> = relative
        .match_indices('/')
        .map(|(index, _)| &relative[..index])
        .collect();
    candidates.push(relative);
    candidates
}
