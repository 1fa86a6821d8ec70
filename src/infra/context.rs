//! Host adapters for [`ExecutionContext`].

use std::{
    collections::HashMap,
    env,
    ffi::OsString,
    fs::OpenOptions,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, info};
use uuid::Uuid;

use crate::application::context::ExecutionContext;

/// Pick the adapter for the current process environment.
pub fn detect() -> Arc<dyn ExecutionContext> {
    if env::var("GITHUB_ACTIONS").is_ok_and(|value| value == "true") {
        Arc::new(ActionsContext::from_os_vars(env::vars_os()))
    } else {
        Arc::new(ConsoleContext)
    }
}

/// GitHub Actions: `INPUT_*` variables, workflow commands on stdout and the
/// `GITHUB_OUTPUT` / `GITHUB_STEP_SUMMARY` files.
#[derive(Debug, Clone, Default)]
pub struct ActionsContext {
    inputs: HashMap<String, String>,
    workspace: Option<PathBuf>,
    output_file: Option<PathBuf>,
    summary_file: Option<PathBuf>,
}

impl ActionsContext {
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut context = Self::default();
        for (name, value) in vars {
            if let Some(input) = name.strip_prefix("INPUT_") {
                context.inputs.insert(input.to_string(), value);
                continue;
            }
            let path = (!value.is_empty()).then(|| PathBuf::from(&value));
            match name.as_str() {
                "GITHUB_WORKSPACE" => context.workspace = path,
                "GITHUB_OUTPUT" => context.output_file = path,
                "GITHUB_STEP_SUMMARY" => context.summary_file = path,
                _ => {}
            }
        }
        context
    }

    /// Like [`Self::from_vars`], skipping entries that are not valid UTF-8.
    pub fn from_os_vars(vars: impl IntoIterator<Item = (OsString, OsString)>) -> Self {
        Self::from_vars(vars.into_iter().filter_map(|(name, value)| {
            Some((name.into_string().ok()?, value.into_string().ok()?))
        }))
    }

    fn append(path: &Path, text: &str) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(text.as_bytes())
    }
}

impl ExecutionContext for ActionsContext {
    fn name(&self) -> &'static str {
        "github-actions"
    }

    fn input(&self, name: &str) -> Option<String> {
        let key = name.replace(' ', "_").to_uppercase();
        self.inputs
            .get(&key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn workspace_hint(&self) -> Option<PathBuf> {
        self.workspace.clone()
    }

    fn start_group(&self, title: &str) {
        println!("::group::{}", escape_data(title));
    }

    fn end_group(&self) {
        println!("::endgroup::");
    }

    fn set_output(&self, name: &str, value: &str) -> io::Result<()> {
        match &self.output_file {
            Some(path) => Self::append(path, &output_record(name, value)),
            None => {
                debug!(
                    target = "infra::context",
                    op = "context::set_output",
                    output = name,
                    "GITHUB_OUTPUT not set; printing output instead"
                );
                writeln!(io::stdout().lock(), "{name}={value}")
            }
        }
    }

    fn write_summary(&self, html: &str) -> io::Result<()> {
        let Some(path) = &self.summary_file else {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "GITHUB_STEP_SUMMARY is not set",
            ));
        };
        Self::append(path, &format!("{html}\n"))
    }

    fn set_failed(&self, message: &str) {
        println!("::error::{}", escape_data(message));
    }
}

/// Plain terminal runs: no inputs, outputs as `name=value` lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleContext;

impl ExecutionContext for ConsoleContext {
    fn name(&self) -> &'static str {
        "console"
    }

    fn input(&self, _name: &str) -> Option<String> {
        None
    }

    fn workspace_hint(&self) -> Option<PathBuf> {
        None
    }

    fn start_group(&self, title: &str) {
        info!(target = "infra::context", "{title}");
    }

    fn end_group(&self) {}

    fn set_output(&self, name: &str, value: &str) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{name}={value}")
    }

    fn write_summary(&self, html: &str) -> io::Result<()> {
        debug!(
            target = "infra::context",
            op = "context::write_summary",
            bytes = html.len(),
            "No summary sink outside CI; discarding run summary"
        );
        Ok(())
    }

    fn set_failed(&self, message: &str) {
        eprintln!("error: {message}");
    }
}

/// `name<<delimiter` block understood by `GITHUB_OUTPUT`; safe for multi-line values.
fn output_record(name: &str, value: &str) -> String {
    let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}

/// Workflow command data escaping.
fn escape_data(text: &str) -> String {
    text.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
