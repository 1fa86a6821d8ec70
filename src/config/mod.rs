//! Configuration layer: typed settings with layered precedence
//! (file → environment → host inputs → CLI).

mod cli;

use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::context::ExecutionContext;

pub use cli::{CliArgs, ConvertOverrides};

const LOCAL_CONFIG_BASENAME: &str = "pressmark";
const ENV_PREFIX: &str = "PRESSMARK";
pub const DEFAULT_MARKDOWN_PATTERN: &str = "**/*.md";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_PDF_TIMEOUT_MS: u64 = 20_000;

/// Fully-resolved run settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub workspace: Option<PathBuf>,
    pub batch: BatchSettings,
    pub pdf: PdfSettings,
    pub logging: LoggingSettings,
    /// Recoverable oddities found while loading, logged once telemetry is up.
    pub notices: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub files: Vec<String>,
    /// Exclude patterns, already in `!pattern` form.
    pub exclude: Vec<String>,
    pub global_css: Vec<String>,
    pub output_dir: PathBuf,
    pub generate_html: bool,
    pub fail_on_missing_css: bool,
    pub include_readme: bool,
    pub extra_html_head: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PdfSettings {
    pub chrome_path: Option<PathBuf>,
    pub disable_sandbox: bool,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence
/// (file → environment → host inputs → CLI).
pub fn load(cli: &CliArgs, context: &dyn ExecutionContext) -> Result<Settings, LoadError> {
    let mut builder =
        Config::builder().add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__"),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_inputs(context)?;
    raw.apply_cli_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli(context: &dyn ExecutionContext) -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args, context)?;
    Ok((args, settings))
}

/// Newline-separated string (host inputs, env) or a proper list (config files).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum PatternInput {
    Lines(String),
    List(Vec<String>),
}

impl PatternInput {
    fn into_patterns(self) -> Vec<String> {
        let lines: Vec<String> = match self {
            PatternInput::Lines(text) => text.lines().map(str::to_string).collect(),
            PatternInput::List(items) => items,
        };
        lines
            .into_iter()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    workspace: Option<PathBuf>,
    files: Option<PatternInput>,
    exclude: Option<PatternInput>,
    global_css: Option<PatternInput>,
    output_dir: Option<PathBuf>,
    #[serde(alias = "emit_html")]
    generate_html: Option<bool>,
    fail_on_missing_css: Option<bool>,
    disable_sandbox: Option<bool>,
    include_readme: Option<bool>,
    pdf_timeout_ms: Option<u64>,
    chrome_path: Option<PathBuf>,
    extra_html_head: Option<String>,
    logging: RawLoggingSettings,
    #[serde(skip)]
    notices: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

impl RawSettings {
    fn apply_inputs(&mut self, context: &dyn ExecutionContext) -> Result<(), LoadError> {
        if let Some(files) = context.input("files") {
            self.files = Some(PatternInput::Lines(files));
        }
        if let Some(exclude) = context.input("exclude") {
            self.exclude = Some(PatternInput::Lines(exclude));
        }
        if let Some(global_css) = context.input("global_css") {
            self.global_css = Some(PatternInput::Lines(global_css));
        }
        if let Some(dir) = context.input("output_dir") {
            self.output_dir = Some(PathBuf::from(dir));
        }
        if let Some(value) = input_flag(context, "emit_html")? {
            self.generate_html = Some(value);
        }
        if let Some(value) = input_flag(context, "generate_html")? {
            self.generate_html = Some(value);
        }
        if let Some(value) = input_flag(context, "fail_on_missing_css")? {
            self.fail_on_missing_css = Some(value);
        }
        if let Some(value) = input_flag(context, "disable_sandbox")? {
            self.disable_sandbox = Some(value);
        }
        if let Some(value) = input_flag(context, "include_readme")? {
            self.include_readme = Some(value);
        }
        if let Some(raw) = context.input("pdf_timeout_ms") {
            match raw.parse::<u64>() {
                Ok(ms) => self.pdf_timeout_ms = Some(ms),
                Err(_) => self.notices.push(format!(
                    "ignoring pdf_timeout_ms input `{raw}`: not an integer"
                )),
            }
        }
        if let Some(path) = context.input("chrome_path") {
            self.chrome_path = Some(PathBuf::from(path));
        }
        if let Some(head) = context.input("extra_html_head") {
            self.extra_html_head = Some(head);
        }
        Ok(())
    }

    fn apply_cli_overrides(&mut self, overrides: &ConvertOverrides) {
        if let Some(workspace) = overrides.workspace.as_ref() {
            self.workspace = Some(workspace.clone());
        }
        if !overrides.files.is_empty() {
            self.files = Some(PatternInput::List(overrides.files.clone()));
        }
        if !overrides.exclude.is_empty() {
            self.exclude = Some(PatternInput::List(overrides.exclude.clone()));
        }
        if !overrides.global_css.is_empty() {
            self.global_css = Some(PatternInput::List(overrides.global_css.clone()));
        }
        if let Some(dir) = overrides.output_dir.as_ref() {
            self.output_dir = Some(dir.clone());
        }
        if let Some(value) = overrides.generate_html {
            self.generate_html = Some(value);
        }
        if let Some(value) = overrides.fail_on_missing_css {
            self.fail_on_missing_css = Some(value);
        }
        if let Some(value) = overrides.disable_sandbox {
            self.disable_sandbox = Some(value);
        }
        if let Some(value) = overrides.include_readme {
            self.include_readme = Some(value);
        }
        if let Some(ms) = overrides.pdf_timeout_ms {
            self.pdf_timeout_ms = Some(ms);
        }
        if let Some(path) = overrides.chrome_path.as_ref() {
            self.chrome_path = Some(path.clone());
        }
        if let Some(head) = overrides.extra_html_head.as_ref() {
            self.extra_html_head = Some(head.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

fn input_flag(context: &dyn ExecutionContext, key: &'static str) -> Result<Option<bool>, LoadError> {
    let Some(raw) = context.input(key) else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" => Ok(Some(true)),
        "false" => Ok(Some(false)),
        _ => Err(LoadError::invalid(
            key,
            format!("expected `true` or `false`, got `{raw}`"),
        )),
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            workspace,
            files,
            exclude,
            global_css,
            output_dir,
            generate_html,
            fail_on_missing_css,
            disable_sandbox,
            include_readme,
            pdf_timeout_ms,
            chrome_path,
            extra_html_head,
            logging,
            notices,
        } = raw;

        let batch = build_batch_settings(BatchInputs {
            files,
            exclude,
            global_css,
            output_dir,
            generate_html,
            fail_on_missing_css,
            include_readme,
            extra_html_head,
        })?;
        let pdf = build_pdf_settings(chrome_path, disable_sandbox, pdf_timeout_ms)?;
        let logging = build_logging_settings(logging)?;
        let workspace = workspace.filter(|path| !path.as_os_str().is_empty());

        Ok(Self {
            workspace,
            batch,
            pdf,
            logging,
            notices,
        })
    }
}

struct BatchInputs {
    files: Option<PatternInput>,
    exclude: Option<PatternInput>,
    global_css: Option<PatternInput>,
    output_dir: Option<PathBuf>,
    generate_html: Option<bool>,
    fail_on_missing_css: Option<bool>,
    include_readme: Option<bool>,
    extra_html_head: Option<String>,
}

fn build_batch_settings(inputs: BatchInputs) -> Result<BatchSettings, LoadError> {
    let files = inputs
        .files
        .map(PatternInput::into_patterns)
        .filter(|patterns| !patterns.is_empty())
        .unwrap_or_else(|| vec![DEFAULT_MARKDOWN_PATTERN.to_string()]);

    let exclude = inputs
        .exclude
        .map(PatternInput::into_patterns)
        .unwrap_or_default()
        .into_iter()
        .map(|pattern| {
            if pattern.starts_with('!') {
                pattern
            } else {
                format!("!{pattern}")
            }
        })
        .collect();

    let global_css = inputs
        .global_css
        .map(PatternInput::into_patterns)
        .unwrap_or_default();

    let output_dir = inputs
        .output_dir
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let extra_html_head = inputs
        .extra_html_head
        .filter(|head| !head.trim().is_empty());

    Ok(BatchSettings {
        files,
        exclude,
        global_css,
        output_dir,
        generate_html: inputs.generate_html.unwrap_or(true),
        fail_on_missing_css: inputs.fail_on_missing_css.unwrap_or(false),
        include_readme: inputs.include_readme.unwrap_or(false),
        extra_html_head,
    })
}

fn build_pdf_settings(
    chrome_path: Option<PathBuf>,
    disable_sandbox: Option<bool>,
    timeout_ms: Option<u64>,
) -> Result<PdfSettings, LoadError> {
    let timeout_ms = timeout_ms.unwrap_or(DEFAULT_PDF_TIMEOUT_MS);
    if timeout_ms == 0 {
        return Err(LoadError::invalid(
            "pdf_timeout_ms",
            "must be greater than zero",
        ));
    }

    Ok(PdfSettings {
        chrome_path: chrome_path.filter(|path| !path.as_os_str().is_empty()),
        disable_sandbox: disable_sandbox.unwrap_or(cfg!(target_os = "linux")),
        timeout: Duration::from_millis(timeout_ms),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}
