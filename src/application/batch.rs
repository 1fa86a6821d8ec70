//! Sequential conversion of every selected document.
//!
//! Documents are processed one at a time in sorted path order. The first
//! failure aborts the batch, so a returned [`BatchReport`] always describes a
//! complete run.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::{debug, info};

use crate::{
    application::{
        context::{ExecutionContext, LogGroup},
        error::AppError,
        paths::PathResolver,
        pdf::{PdfEngine, PdfRequest},
        render::{DocumentParts, DocumentRenderer, RunSummary},
        styles::{CssCache, StyleResolver},
    },
    config::{BatchSettings, PdfSettings},
    domain::{
        front_matter,
        manifest::{ConversionResult, Manifest},
        workspace::Workspace,
    },
};

const NO_MATCHES: &str = "No markdown files matched the requested patterns.";
const DEFAULT_LANG: &str = "en";

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub manifest: Manifest,
    /// Workspace-relative output root; `.` for the workspace itself.
    pub output_dir: String,
    pub generate_html: bool,
}

pub struct BatchOrchestrator {
    workspace: Workspace,
    settings: BatchSettings,
    disable_sandbox: bool,
    timeout: Duration,
    engine: Arc<dyn PdfEngine>,
    context: Arc<dyn ExecutionContext>,
}

/// Per-batch collaborators shared by every document.
struct Toolkit {
    styles: StyleResolver,
    css: CssCache,
    renderer: DocumentRenderer,
    output_root: PathBuf,
}

impl BatchOrchestrator {
    pub fn new(
        workspace: Workspace,
        settings: BatchSettings,
        pdf: &PdfSettings,
        engine: Arc<dyn PdfEngine>,
        context: Arc<dyn ExecutionContext>,
    ) -> Self {
        Self {
            workspace,
            settings,
            disable_sandbox: pdf.disable_sandbox,
            timeout: pdf.timeout,
            engine,
            context,
        }
    }

    pub async fn run(&self) -> Result<BatchReport, AppError> {
        let documents = select_documents(&self.workspace, &self.settings).await?;
        self.run_documents(documents).await
    }

    /// Convert an already selected, non-empty document list.
    pub async fn run_documents(&self, documents: Vec<PathBuf>) -> Result<BatchReport, AppError> {
        let started_at = Instant::now();

        let output_root = self
            .workspace
            .ensure_contained(self.workspace.root(), &self.settings.output_dir, "output_dir")
            .map_err(|err| AppError::configuration(err.to_string()))?;
        tokio::fs::create_dir_all(&output_root)
            .await
            .map_err(|err| AppError::io("failed to create output directory", &output_root, err))?;

        let global_css = expand(&self.workspace, self.settings.global_css.clone()).await?;
        info!(
            target = "application::batch",
            op = "batch::run",
            documents = documents.len(),
            global_css = global_css.len(),
            output_dir = %output_root.display(),
            "Starting conversion"
        );

        let mut toolkit = Toolkit {
            styles: StyleResolver::new(
                self.workspace.clone(),
                global_css,
                self.settings.fail_on_missing_css,
            ),
            css: CssCache::new(),
            renderer: DocumentRenderer::new(self.settings.extra_html_head.clone()),
            output_root: output_root.clone(),
        };

        let mut manifest = Manifest::new();
        for document in &documents {
            if let Some(result) = self.convert(document, &mut toolkit).await? {
                manifest.push(result);
            }
        }

        info!(
            target = "application::batch",
            op = "batch::run",
            result = "ok",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            converted = manifest.len(),
            skipped = documents.len() - manifest.len(),
            stylesheets_read = toolkit.css.len(),
            "Conversion finished"
        );

        Ok(BatchReport {
            manifest,
            output_dir: self.workspace.display_relative(&output_root),
            generate_html: self.settings.generate_html,
        })
    }

    async fn convert(
        &self,
        document: &Path,
        toolkit: &mut Toolkit,
    ) -> Result<Option<ConversionResult>, AppError> {
        let started_at = Instant::now();
        let label = self.workspace.display_relative(document);
        let _group = LogGroup::open(self.context.as_ref(), &format!("Processing {label}"));

        let raw = tokio::fs::read_to_string(document)
            .await
            .map_err(|err| AppError::io("failed to read", document, err))?;
        let split = front_matter::split(&raw).map_err(|err| AppError::document(&label, err))?;
        let metadata = split.front_matter;
        if metadata.should_skip() {
            info!(
                target = "application::batch",
                op = "batch::convert",
                result = "skipped",
                document = %label,
                "Skipping unpublished document"
            );
            return Ok(None);
        }

        let stylesheets = toolkit.styles.resolve(document, &metadata).await?;
        let mut css_texts = Vec::with_capacity(stylesheets.len());
        for stylesheet in &stylesheets {
            let text = toolkit
                .css
                .load(stylesheet)
                .await
                .map_err(|err| AppError::io("failed to read stylesheet", stylesheet, err))?;
            css_texts.push(text);
        }
        let css_refs: Vec<&str> = css_texts.iter().map(|text| &**text).collect();

        let stem = document
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| label.clone());
        let title = metadata.title().unwrap_or_else(|| stem.clone());
        let lang = metadata.lang().unwrap_or_else(|| DEFAULT_LANG.to_string());
        let base = base_name(metadata.output_name().or_else(|| metadata.title()), &stem);

        let html = toolkit
            .renderer
            .render(&DocumentParts {
                title: &title,
                lang: &lang,
                markdown: &split.body,
                stylesheets: &css_refs,
            })
            .map_err(|source| AppError::Template {
                document: label.clone(),
                source,
            })?;

        let out_dir = toolkit
            .output_root
            .join(self.workspace.relative_dir(document));
        tokio::fs::create_dir_all(&out_dir)
            .await
            .map_err(|err| AppError::io("failed to create output directory", &out_dir, err))?;
        let pdf_path = out_dir.join(format!("{base}.pdf"));

        let html_output = if self.settings.generate_html {
            let html_path = out_dir.join(format!("{base}.html"));
            tokio::fs::write(&html_path, html.as_bytes())
                .await
                .map_err(|err| AppError::io("failed to write", &html_path, err))?;
            self.print(&label, &html_path, &pdf_path).await?;
            Some(self.workspace.display_relative(&html_path))
        } else {
            let scratch = tempfile::Builder::new()
                .prefix(&format!(".{base}."))
                .suffix(".tmp.html")
                .tempfile_in(&out_dir)
                .map_err(|err| AppError::io("failed to create temporary HTML in", &out_dir, err))?
                .into_temp_path();
            tokio::fs::write(&scratch, html.as_bytes())
                .await
                .map_err(|err| AppError::io("failed to write", &scratch, err))?;
            self.print(&label, &scratch, &pdf_path).await?;
            if let Err(err) = scratch.close() {
                debug!(
                    target = "application::batch",
                    op = "batch::convert",
                    error = %err,
                    "Failed to remove temporary HTML"
                );
            }
            None
        };

        let result = ConversionResult {
            markdown: label.clone(),
            html: html_output,
            pdf: self.workspace.display_relative(&pdf_path),
            css: stylesheets
                .iter()
                .map(|path| self.workspace.display_relative(path))
                .collect(),
        };
        info!(
            target = "application::batch",
            op = "batch::convert",
            result = "ok",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            document = %label,
            pdf = %result.pdf,
            stylesheets = result.css.len(),
            "Converted document"
        );
        Ok(Some(result))
    }

    async fn print(&self, label: &str, html_path: &Path, pdf_path: &Path) -> Result<(), AppError> {
        let request = PdfRequest {
            html_path: html_path.to_path_buf(),
            pdf_path: pdf_path.to_path_buf(),
            disable_sandbox: self.disable_sandbox,
            timeout: self.timeout,
        };
        self.engine
            .render(&request)
            .await
            .map_err(|err| AppError::render(label, err))
    }
}

/// Markdown documents matched by the batch patterns, in conversion order.
/// Fails when nothing is left to convert.
pub async fn select_documents(
    workspace: &Workspace,
    settings: &BatchSettings,
) -> Result<Vec<PathBuf>, AppError> {
    let patterns: Vec<String> = settings
        .files
        .iter()
        .chain(settings.exclude.iter())
        .cloned()
        .collect();
    let documents: Vec<PathBuf> = expand(workspace, patterns)
        .await?
        .into_iter()
        .filter(|path| is_markdown(path, settings.include_readme))
        .collect();
    if documents.is_empty() {
        return Err(AppError::configuration(NO_MATCHES));
    }
    Ok(documents)
}

async fn expand(workspace: &Workspace, patterns: Vec<String>) -> Result<Vec<PathBuf>, AppError> {
    let resolver = PathResolver::new(workspace.clone());
    tokio::task::spawn_blocking(move || resolver.expand(&patterns))
        .await
        .map_err(|err| AppError::configuration(format!("pattern expansion failed: {err}")))?
        .map_err(|err| AppError::configuration(err.to_string()))
}

/// Emit the run outputs and the summary through the host context.
pub fn publish(report: &BatchReport, context: &dyn ExecutionContext) -> Result<(), AppError> {
    let files = report
        .manifest
        .to_json()
        .map_err(|err| AppError::configuration(format!("failed to encode manifest: {err}")))?;
    let outputs = [
        ("count", report.manifest.len().to_string()),
        ("output_dir", report.output_dir.clone()),
        ("files", files),
    ];
    for (name, value) in &outputs {
        context
            .set_output(name, value)
            .map_err(|err| AppError::io("failed to publish output", Path::new(name), err))?;
    }

    let summary = RunSummary::from_manifest(&report.manifest, report.generate_html);
    match summary.to_html() {
        Ok(html) => {
            if let Err(err) = context.write_summary(&html) {
                debug!(
                    target = "application::batch",
                    op = "batch::publish",
                    error = %err,
                    "Run summary not written"
                );
            }
        }
        Err(err) => debug!(
            target = "application::batch",
            op = "batch::publish",
            error = %err,
            "Run summary not rendered"
        ),
    }
    Ok(())
}

fn is_markdown(path: &Path, include_readme: bool) -> bool {
    let Some(name) = path.file_name().map(|name| name.to_string_lossy().to_lowercase()) else {
        return false;
    };
    name.ends_with(".md") && (include_readme || name != "readme.md")
}

/// File-system safe output base name, falling back to the source stem.
fn base_name(preferred: Option<String>, stem: &str) -> String {
    preferred
        .map(|name| {
            name.chars()
                .map(|ch| {
                    if ch == '/' || ch == '\\' || ch.is_control() {
                        '-'
                    } else {
                        ch
                    }
                })
                .collect::<String>()
                .trim()
                .to_string()
        })
        .filter(|name| !name.is_empty() && name != "." && name != "..")
        .unwrap_or_else(|| stem.to_string())
}
