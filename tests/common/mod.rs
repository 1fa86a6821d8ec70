#![allow(dead_code)]

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use pressmark::{
    application::{
        batch::BatchOrchestrator,
        context::ExecutionContext,
        pdf::{PdfEngine, PdfError, PdfRequest},
    },
    config::{BatchSettings, PdfSettings},
    domain::workspace::Workspace,
};
use tempfile::TempDir;

/// Context double that records everything the pipeline reports.
#[derive(Default)]
pub struct RecordingContext {
    pub events: Mutex<Vec<String>>,
    pub outputs: Mutex<Vec<(String, String)>>,
    pub summaries: Mutex<Vec<String>>,
    pub failures: Mutex<Vec<String>>,
}

impl RecordingContext {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock").clone()
    }

    pub fn output(&self, name: &str) -> Option<String> {
        self.outputs
            .lock()
            .expect("outputs lock")
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }
}

impl ExecutionContext for RecordingContext {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn input(&self, _name: &str) -> Option<String> {
        None
    }

    fn workspace_hint(&self) -> Option<PathBuf> {
        None
    }

    fn start_group(&self, title: &str) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("start:{title}"));
    }

    fn end_group(&self) {
        self.events
            .lock()
            .expect("events lock")
            .push("end".to_string());
    }

    fn set_output(&self, name: &str, value: &str) -> io::Result<()> {
        self.outputs
            .lock()
            .expect("outputs lock")
            .push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn write_summary(&self, html: &str) -> io::Result<()> {
        self.summaries
            .lock()
            .expect("summaries lock")
            .push(html.to_string());
        Ok(())
    }

    fn set_failed(&self, message: &str) {
        self.failures
            .lock()
            .expect("failures lock")
            .push(message.to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    Print,
    Fail,
    Timeout,
}

/// What the engine observed for one request.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub html_path: PathBuf,
    pub pdf_path: PathBuf,
    pub html: String,
}

/// In-process stand-in for Chrome.
pub struct FakeEngine {
    mode: EngineMode,
    pub seen: Mutex<Vec<SeenRequest>>,
}

impl FakeEngine {
    pub fn new(mode: EngineMode) -> Self {
        Self {
            mode,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().expect("seen lock").clone()
    }
}

#[async_trait]
impl PdfEngine for FakeEngine {
    async fn render(&self, request: &PdfRequest) -> Result<(), PdfError> {
        let html = tokio::fs::read_to_string(&request.html_path).await?;
        self.seen.lock().expect("seen lock").push(SeenRequest {
            html_path: request.html_path.clone(),
            pdf_path: request.pdf_path.clone(),
            html,
        });

        match self.mode {
            EngineMode::Print => {
                tokio::fs::write(&request.pdf_path, b"%PDF-1.4 fake").await?;
                Ok(())
            }
            EngineMode::Fail => Err(PdfError::Exited {
                exit_code: Some(1),
                stderr: "renderer crashed".to_string(),
            }),
            EngineMode::Timeout => Err(PdfError::Timeout {
                timeout_ms: request.timeout.as_millis() as u64,
                stderr: String::new(),
            }),
        }
    }
}

/// Scratch workspace populated with `(relative path, contents)` pairs.
pub fn workspace(files: &[(&str, &str)]) -> (TempDir, Workspace) {
    let dir = TempDir::new().expect("temp dir");
    for (path, contents) in files {
        write(dir.path(), path, contents);
    }
    let workspace = Workspace::open(dir.path()).expect("workspace");
    (dir, workspace)
}

pub fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, contents).expect("write file");
}

pub fn batch_settings() -> BatchSettings {
    BatchSettings {
        files: vec!["**/*.md".to_string()],
        exclude: Vec::new(),
        global_css: Vec::new(),
        output_dir: PathBuf::from("output"),
        generate_html: true,
        fail_on_missing_css: false,
        include_readme: false,
        extra_html_head: None,
    }
}

pub fn pdf_settings() -> PdfSettings {
    PdfSettings {
        chrome_path: None,
        disable_sandbox: true,
        timeout: Duration::from_secs(5),
    }
}

pub fn orchestrator(
    workspace: &Workspace,
    settings: BatchSettings,
    engine: &Arc<FakeEngine>,
    context: &Arc<RecordingContext>,
) -> BatchOrchestrator {
    let engine: Arc<dyn PdfEngine> = engine.clone();
    let context: Arc<dyn ExecutionContext> = context.clone();
    BatchOrchestrator::new(
        workspace.clone(),
        settings,
        &pdf_settings(),
        engine,
        context,
    )
}

/// Every file below `root`, relative and sorted.
pub fn listing(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .ok()
                .map(|path| path.to_string_lossy().replace('\\', "/"))
        })
        .collect();
    files.sort();
    files
}
