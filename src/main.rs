use std::{env, process, sync::Arc};

use pressmark::{
    application::{
        batch::{self, BatchOrchestrator},
        context::ExecutionContext,
        error::AppError,
        pdf::{self, ChromeCli},
    },
    config,
    domain::workspace::Workspace,
    infra::{context, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    let context = context::detect();
    if let Err(error) = run(Arc::clone(&context)).await {
        report_application_error(&error);
        context.set_failed(&error.to_string());
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, timeout = error.is_timeout(), "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, timeout = error.is_timeout(), "application error");
    });
}

async fn run(context: Arc<dyn ExecutionContext>) -> Result<(), AppError> {
    let (_cli_args, settings) = config::load_with_cli(context.as_ref())
        .map_err(|err| AppError::configuration(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging)?;
    for notice in &settings.notices {
        warn!(target = "pressmark", op = "config::load", "{notice}");
    }

    let root = match settings.workspace.clone().or_else(|| context.workspace_hint()) {
        Some(root) => root,
        None => env::current_dir()
            .map_err(|err| AppError::configuration(format!("cannot determine workspace: {err}")))?,
    };
    let workspace = Workspace::open(&root)
        .map_err(|err| AppError::io("failed to open workspace", &root, err))?;

    let documents = batch::select_documents(&workspace, &settings.batch).await?;
    let chrome = pdf::discover(settings.pdf.chrome_path.as_deref(), workspace.root())
        .map_err(|err| AppError::configuration(err.to_string()))?;
    info!(
        target = "pressmark",
        op = "main::run",
        context = context.name(),
        workspace = %workspace.root().display(),
        chrome = %chrome.display(),
        timeout_ms = settings.pdf.timeout.as_millis() as u64,
        documents = documents.len(),
        "Starting batch"
    );

    let orchestrator = BatchOrchestrator::new(
        workspace,
        settings.batch.clone(),
        &settings.pdf,
        Arc::new(ChromeCli::new(chrome)),
        Arc::clone(&context),
    );
    let report = orchestrator.run_documents(documents).await?;
    batch::publish(&report, context.as_ref())
}
