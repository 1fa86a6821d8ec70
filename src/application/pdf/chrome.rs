use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::{
    io::AsyncReadExt,
    process::{ChildStderr, Command},
    task::JoinHandle,
};
use tracing::{info, warn};
use url::Url;

use super::{PdfEngine, PdfError, PdfRequest};

/// How long to wait for stderr after the renderer is gone. Helper processes
/// may keep the pipe open after the browser itself exits.
const STDERR_GRACE: Duration = Duration::from_millis(500);
const MAX_SETTLE_BUDGET_MS: u64 = 10_000;

/// One headless Chrome process per document, printing with `--print-to-pdf`.
#[derive(Debug, Clone)]
pub struct ChromeCli {
    executable: PathBuf,
}

impl ChromeCli {
    pub fn new(executable: PathBuf) -> Self {
        Self { executable }
    }

    fn arguments(
        &self,
        request: &PdfRequest,
        profile_dir: &Path,
        scratch_pdf: &Path,
        url: &Url,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "--headless=new",
            "--disable-gpu",
            "--disable-dev-shm-usage",
            "--no-first-run",
            "--no-default-browser-check",
            "--hide-scrollbars",
            "--run-all-compositor-stages-before-draw",
            "--no-pdf-header-footer",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();

        if request.disable_sandbox {
            args.push("--no-sandbox".into());
            args.push("--disable-setuid-sandbox".into());
        }

        args.push(format!("--virtual-time-budget={}", settle_budget_ms(request.timeout)).into());
        args.push(prefixed("--user-data-dir=", profile_dir));
        args.push(prefixed("--print-to-pdf=", scratch_pdf));
        args.push(url.as_str().into());
        args
    }
}

#[async_trait]
impl PdfEngine for ChromeCli {
    async fn render(&self, request: &PdfRequest) -> Result<(), PdfError> {
        let started_at = Instant::now();
        let timeout_ms = u64::try_from(request.timeout.as_millis()).unwrap_or(u64::MAX);

        let url = Url::from_file_path(&request.html_path).map_err(|()| PdfError::Url {
            path: request.html_path.display().to_string(),
        })?;

        let profile = TempDir::with_prefix("pressmark-profile-")?;
        let destination_dir = request
            .pdf_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let scratch = tempfile::Builder::new()
            .prefix(".pressmark-")
            .suffix(".pdf.part")
            .tempfile_in(destination_dir)?
            .into_temp_path();

        let mut command = Command::new(&self.executable);
        command
            .args(self.arguments(request, profile.path(), &scratch, &url))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| {
            warn!(
                target = "application::pdf::chrome",
                op = "chrome::render",
                result = "error",
                error_code = "spawn",
                executable = %self.executable.display(),
                error = %source,
                "Failed to launch renderer"
            );
            PdfError::Spawn {
                path: self.executable.display().to_string(),
                source,
            }
        })?;
        let stderr_task = child.stderr.take().map(collect_stderr);

        let status = match tokio::time::timeout(request.timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                if let Err(err) = child.kill().await {
                    warn!(
                        target = "application::pdf::chrome",
                        op = "chrome::render",
                        error = %err,
                        "Failed to kill timed out renderer"
                    );
                }
                let stderr = drain(stderr_task).await;
                warn!(
                    target = "application::pdf::chrome",
                    op = "chrome::render",
                    result = "timeout",
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    timeout_ms,
                    stderr = %stderr,
                    "Renderer exceeded its deadline"
                );
                return Err(PdfError::Timeout { timeout_ms, stderr });
            }
        };
        let stderr = drain(stderr_task).await;

        if !status.success() {
            let exit_code = status.code();
            warn!(
                target = "application::pdf::chrome",
                op = "chrome::render",
                result = "error",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                exit_code = exit_code.map(i64::from).unwrap_or(-1),
                error_code = "exit_status",
                stderr = %stderr,
                "Renderer invocation failed"
            );
            return Err(PdfError::Exited { exit_code, stderr });
        }

        let pdf_bytes = match tokio::fs::metadata(&scratch).await {
            Ok(metadata) if metadata.len() > 0 => metadata.len(),
            _ => return Err(PdfError::MissingOutput { stderr }),
        };

        scratch
            .persist(&request.pdf_path)
            .map_err(|err| PdfError::Io(err.error))?;

        info!(
            target = "application::pdf::chrome",
            op = "chrome::render",
            result = "ok",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            pdf = %request.pdf_path.display(),
            pdf_bytes,
            "PDF printed"
        );
        Ok(())
    }
}

/// Virtual time handed to the page for network and font loading.
fn settle_budget_ms(timeout: Duration) -> u64 {
    let half = u64::try_from(timeout.as_millis() / 2).unwrap_or(MAX_SETTLE_BUDGET_MS);
    half.clamp(1, MAX_SETTLE_BUDGET_MS)
}

fn prefixed(flag: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(flag);
    arg.push(path.as_os_str());
    arg
}

fn collect_stderr(mut pipe: ChildStderr) -> JoinHandle<String> {
    tokio::spawn(async move {
        let mut buffer = Vec::new();
        let _ = pipe.read_to_end(&mut buffer).await;
        String::from_utf8_lossy(&buffer).trim().to_string()
    })
}

async fn drain(task: Option<JoinHandle<String>>) -> String {
    let Some(mut task) = task else {
        return String::new();
    };
    match tokio::time::timeout(STDERR_GRACE, &mut task).await {
        Ok(Ok(stderr)) => stderr,
        Ok(Err(_)) => String::new(),
        Err(_) => {
            task.abort();
            String::new()
        }
    }
}
