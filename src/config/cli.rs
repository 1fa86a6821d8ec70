use std::path::PathBuf;

use clap::{Args, Parser, builder::BoolishValueParser};

/// Command-line arguments for the pressmark binary.
#[derive(Debug, Default, Parser)]
#[command(
    name = "pressmark",
    version,
    about = "Convert Markdown documents into styled PDF (and HTML) files"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "PRESSMARK_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ConvertOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ConvertOverrides {
    /// Override the workspace root (defaults to GITHUB_WORKSPACE or the current directory).
    #[arg(long = "workspace", value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Include pattern for Markdown files; repeat for several patterns.
    #[arg(long = "files", value_name = "PATTERN")]
    pub files: Vec<String>,

    /// Exclude pattern; repeat for several patterns.
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Stylesheet pattern applied to every document; repeat for several patterns.
    #[arg(long = "global-css", value_name = "PATTERN")]
    pub global_css: Vec<String>,

    /// Override the output directory, relative to the workspace.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Persist generated HTML next to the PDF.
    #[arg(
        long = "generate-html",
        visible_alias = "emit-html",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub generate_html: Option<bool>,

    /// Fail when a document resolves no stylesheet.
    #[arg(
        long = "fail-on-missing-css",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub fail_on_missing_css: Option<bool>,

    /// Launch Chrome without its OS sandbox.
    #[arg(
        long = "disable-sandbox",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub disable_sandbox: Option<bool>,

    /// Treat files named README.md as regular documents.
    #[arg(
        long = "include-readme",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub include_readme: Option<bool>,

    /// Deadline for printing one document, in milliseconds.
    #[arg(long = "pdf-timeout-ms", value_name = "MS")]
    pub pdf_timeout_ms: Option<u64>,

    /// Explicit Chrome or Chromium executable.
    #[arg(long = "chrome-path", value_name = "PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Markup inserted verbatim into every document head.
    #[arg(long = "extra-html-head", value_name = "HTML")]
    pub extra_html_head: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}
