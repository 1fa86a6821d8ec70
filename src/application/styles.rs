//! Stylesheet selection for a document and the batch-wide CSS text cache.

use std::{
    collections::{BTreeMap, HashMap},
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::debug;

use crate::{
    application::error::AppError,
    domain::{front_matter::FrontMatter, workspace::Workspace},
};

const GLOBAL_CSS: &str = "global css";
const FRONT_MATTER_CSS: &str = "frontmatter css";
const DIRECTORY_CSS: &str = "directory css";

#[derive(Debug, Clone)]
pub struct StyleResolver {
    workspace: Workspace,
    global: Vec<PathBuf>,
    fail_on_missing: bool,
}

impl StyleResolver {
    /// `global` holds the already expanded global stylesheet paths.
    pub fn new(workspace: Workspace, global: Vec<PathBuf>, fail_on_missing: bool) -> Self {
        Self {
            workspace,
            global,
            fail_on_missing,
        }
    }

    /// Ordered, de-duplicated stylesheets for `document`.
    ///
    /// Declared `css` entries replace the scan of the document's directory; an
    /// explicitly empty declaration therefore means "globals only".
    pub async fn resolve(
        &self,
        document: &Path,
        front_matter: &FrontMatter,
    ) -> Result<Vec<PathBuf>, AppError> {
        let label = self.workspace.display_relative(document);
        let doc_dir = document.parent().unwrap_or(self.workspace.root());

        // Path to the origin it was first selected from.
        let mut styles: BTreeMap<PathBuf, &'static str> = self
            .global
            .iter()
            .map(|path| (path.clone(), GLOBAL_CSS))
            .collect();
        match front_matter.css() {
            Some(declared) => {
                for entry in declared {
                    let resolved = self
                        .workspace
                        .ensure_contained(doc_dir, &entry, FRONT_MATTER_CSS)
                        .map_err(|err| AppError::document(&label, err))?;
                    styles.entry(resolved).or_insert(FRONT_MATTER_CSS);
                }
            }
            None => {
                for sibling in scan_directory(doc_dir).await.map_err(|err| {
                    AppError::io("failed to list stylesheets in", doc_dir, err)
                })? {
                    styles.entry(sibling).or_insert(DIRECTORY_CSS);
                }
            }
        }

        if styles.is_empty() && self.fail_on_missing {
            return Err(AppError::validation(
                &label,
                format!("No CSS files found for {label}"),
            ));
        }

        for (style, origin) in &styles {
            if !is_file(style).await {
                return Err(AppError::validation(
                    &label,
                    format!(
                        "CSS file referenced for {label} does not exist: {}",
                        self.workspace.display_relative(style)
                    ),
                ));
            }
            self.workspace
                .ensure_canonical(style, *origin)
                .map_err(|err| AppError::document(&label, err))?;
        }

        debug!(
            target = "application::styles",
            op = "styles::resolve",
            document = %label,
            stylesheets = styles.len(),
            "Resolved stylesheets"
        );
        Ok(styles.into_keys().collect())
    }
}

/// Regular `.css` files directly inside `dir`; subdirectories are not visited.
async fn scan_directory(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_css = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("css"));
        if is_css && is_file(&path).await {
            found.push(path);
        }
    }
    Ok(found)
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}

/// Stylesheet contents read at most once per batch.
#[derive(Debug, Default)]
pub struct CssCache {
    entries: HashMap<PathBuf, Arc<str>>,
}

impl CssCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&mut self, path: &Path) -> io::Result<Arc<str>> {
        if let Some(text) = self.entries.get(path) {
            return Ok(Arc::clone(text));
        }
        let text: Arc<str> = tokio::fs::read_to_string(path).await?.into();
        self.entries.insert(path.to_path_buf(), Arc::clone(&text));
        Ok(text)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
