mod common;

use std::{fs, path::PathBuf, sync::Arc};

use common::{EngineMode, FakeEngine, RecordingContext, batch_settings, listing, orchestrator};
use pressmark::{
    application::{batch, error::AppError},
    domain::manifest::ConversionResult,
};
use serde_json::{Value, json};

#[tokio::test]
async fn converts_document_with_sibling_stylesheet() {
    let (dir, workspace) = common::workspace(&[
        ("docs/a.md", "# Hi\n"),
        ("docs/a.css", "h1 { color:red; }"),
    ]);
    let engine = Arc::new(FakeEngine::new(EngineMode::Print));
    let context = Arc::new(RecordingContext::default());

    let report = orchestrator(&workspace, batch_settings(), &engine, &context)
        .run()
        .await
        .expect("batch succeeds");

    assert_eq!(
        report.manifest.entries(),
        &[ConversionResult {
            markdown: "docs/a.md".to_string(),
            html: Some("output/docs/a.html".to_string()),
            pdf: "output/docs/a.pdf".to_string(),
            css: vec!["docs/a.css".to_string()],
        }]
    );
    assert_eq!(report.output_dir, "output");

    let html = fs::read_to_string(dir.path().join("output/docs/a.html")).expect("html kept");
    assert!(html.contains("color:red"));
    assert!(html.contains("<h1>Hi</h1>"));
    assert!(html.contains("<title>a</title>"));

    let pdf = fs::read(dir.path().join("output/docs/a.pdf")).expect("pdf written");
    assert!(!pdf.is_empty());

    assert_eq!(
        context.events(),
        vec!["start:Processing docs/a.md".to_string(), "end".to_string()]
    );
}

#[tokio::test]
async fn publish_emits_outputs_and_summary() {
    let (_dir, workspace) = common::workspace(&[("docs/a.md", "# Hi\n"), ("docs/a.css", "h1{}")]);
    let engine = Arc::new(FakeEngine::new(EngineMode::Print));
    let context = Arc::new(RecordingContext::default());

    let report = orchestrator(&workspace, batch_settings(), &engine, &context)
        .run()
        .await
        .expect("batch succeeds");
    batch::publish(&report, context.as_ref()).expect("publish");

    assert_eq!(context.output("count").as_deref(), Some("1"));
    assert_eq!(context.output("output_dir").as_deref(), Some("output"));
    let files: Value =
        serde_json::from_str(&context.output("files").expect("files output")).expect("json");
    assert_eq!(
        files,
        json!([{
            "markdown": "docs/a.md",
            "html": "output/docs/a.html",
            "pdf": "output/docs/a.pdf",
            "css": ["docs/a.css"]
        }])
    );

    let summaries = context.summaries.lock().expect("summaries lock").clone();
    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].contains("Converted 1 document."));
}

#[tokio::test]
async fn unpublished_documents_are_skipped_silently() {
    let (dir, workspace) = common::workspace(&[
        ("docs/a.md", "# Kept\n"),
        ("docs/b.md", "---\npublish: false\n---\n# Hidden\n"),
        ("docs/c.md", "---\ndraft: \"YES\"\n---\n# Draft\n"),
    ]);
    let engine = Arc::new(FakeEngine::new(EngineMode::Print));
    let context = Arc::new(RecordingContext::default());

    let report = orchestrator(&workspace, batch_settings(), &engine, &context)
        .run()
        .await
        .expect("batch succeeds");

    assert_eq!(report.manifest.len(), 1);
    assert_eq!(report.manifest.entries()[0].markdown, "docs/a.md");
    assert_eq!(
        listing(&dir.path().join("output")),
        vec!["docs/a.html", "docs/a.pdf"]
    );
    assert_eq!(engine.seen().len(), 1);
}

#[tokio::test]
async fn html_can_stay_temporary() {
    let (dir, workspace) = common::workspace(&[("cv.md", "---\ntitle: Jane Doe\n---\nBody\n")]);
    let engine = Arc::new(FakeEngine::new(EngineMode::Print));
    let context = Arc::new(RecordingContext::default());
    let mut settings = batch_settings();
    settings.generate_html = false;

    let report = orchestrator(&workspace, settings, &engine, &context)
        .run()
        .await
        .expect("batch succeeds");

    let entry = &report.manifest.entries()[0];
    assert_eq!(entry.html, None);
    assert_eq!(entry.pdf, "output/Jane Doe.pdf");
    assert_eq!(listing(&dir.path().join("output")), vec!["Jane Doe.pdf"]);

    let seen = engine.seen();
    let scratch_name = seen[0]
        .html_path
        .file_name()
        .expect("file name")
        .to_string_lossy()
        .into_owned();
    assert!(scratch_name.starts_with(".Jane Doe."));
    assert!(scratch_name.ends_with(".tmp.html"));
    assert!(seen[0].html.contains("<title>Jane Doe</title>"));
    assert!(!seen[0].html_path.exists());
}

#[tokio::test]
async fn output_name_wins_over_title_and_tree_is_mirrored() {
    let (dir, workspace) = common::workspace(&[(
        "people/jane/resume.md",
        "---\ntitle: Jane Doe\noutput_name: jane-resume\nlang: fr\n---\n# CV\n",
    )]);
    let engine = Arc::new(FakeEngine::new(EngineMode::Print));
    let context = Arc::new(RecordingContext::default());
    let mut settings = batch_settings();
    settings.output_dir = PathBuf::from("dist/pdf");

    let report = orchestrator(&workspace, settings, &engine, &context)
        .run()
        .await
        .expect("batch succeeds");

    assert_eq!(report.output_dir, "dist/pdf");
    assert_eq!(
        report.manifest.entries()[0].pdf,
        "dist/pdf/people/jane/jane-resume.pdf"
    );
    let html = fs::read_to_string(dir.path().join("dist/pdf/people/jane/jane-resume.html"))
        .expect("html");
    assert!(html.contains("<html lang=\"fr\">"));
    assert!(html.contains("<title>Jane Doe</title>"));
}

#[tokio::test]
async fn documents_are_processed_in_sorted_order() {
    let (_dir, workspace) = common::workspace(&[
        ("z.md", "z"),
        ("b/a.md", "ba"),
        ("a.md", "a"),
        ("b/README.md", "readme"),
    ]);
    let engine = Arc::new(FakeEngine::new(EngineMode::Print));
    let context = Arc::new(RecordingContext::default());

    let report = orchestrator(&workspace, batch_settings(), &engine, &context)
        .run()
        .await
        .expect("batch succeeds");

    let order: Vec<&str> = report
        .manifest
        .entries()
        .iter()
        .map(|entry| entry.markdown.as_str())
        .collect();
    assert_eq!(order, vec!["a.md", "b/a.md", "z.md"]);
}

#[tokio::test]
async fn readme_files_are_opt_in() {
    let (_dir, workspace) = common::workspace(&[("README.md", "# Readme"), ("guide.md", "# Guide")]);
    let engine = Arc::new(FakeEngine::new(EngineMode::Print));
    let context = Arc::new(RecordingContext::default());
    let mut settings = batch_settings();
    settings.include_readme = true;

    let report = orchestrator(&workspace, settings, &engine, &context)
        .run()
        .await
        .expect("batch succeeds");

    assert_eq!(report.manifest.len(), 2);
    assert_eq!(report.manifest.entries()[0].markdown, "README.md");
}

#[tokio::test]
async fn exclusions_and_global_css_apply() {
    let (_dir, workspace) = common::workspace(&[
        ("docs/a.md", "# A"),
        ("docs/private/b.md", "# B"),
        ("styles/base.css", "body{}"),
        ("styles/print.css", "@page{}"),
    ]);
    let engine = Arc::new(FakeEngine::new(EngineMode::Print));
    let context = Arc::new(RecordingContext::default());
    let mut settings = batch_settings();
    settings.exclude = vec!["!docs/private/**".to_string()];
    settings.global_css = vec!["styles/*.css".to_string()];

    let report = orchestrator(&workspace, settings, &engine, &context)
        .run()
        .await
        .expect("batch succeeds");

    assert_eq!(report.manifest.len(), 1);
    assert_eq!(
        report.manifest.entries()[0].css,
        vec!["styles/base.css".to_string(), "styles/print.css".to_string()]
    );
    let html = &engine.seen()[0].html;
    let base = html.find("body{}").expect("base css");
    let print = html.find("@page{}").expect("print css");
    assert!(base < print);
}

#[tokio::test]
async fn nothing_matched_is_a_configuration_error() {
    let (_dir, workspace) = common::workspace(&[("notes.txt", "plain")]);
    let engine = Arc::new(FakeEngine::new(EngineMode::Print));
    let context = Arc::new(RecordingContext::default());

    let err = orchestrator(&workspace, batch_settings(), &engine, &context)
        .run()
        .await
        .expect_err("no documents");

    assert!(matches!(err, AppError::Configuration(_)));
    assert_eq!(
        err.to_string(),
        "No markdown files matched the requested patterns."
    );
}

#[tokio::test]
async fn output_directory_must_stay_inside_workspace() {
    let (_dir, workspace) = common::workspace(&[("a.md", "# A")]);
    let engine = Arc::new(FakeEngine::new(EngineMode::Print));
    let context = Arc::new(RecordingContext::default());
    let mut settings = batch_settings();
    settings.output_dir = PathBuf::from("../escape");

    let err = orchestrator(&workspace, settings, &engine, &context)
        .run()
        .await
        .expect_err("escape");

    assert!(err.to_string().contains("outside workspace"));
    assert!(engine.seen().is_empty());
}

#[tokio::test]
async fn missing_css_policy_aborts_the_batch() {
    let (_dir, workspace) = common::workspace(&[("docs/a.md", "# A"), ("docs/b.md", "# B")]);
    let engine = Arc::new(FakeEngine::new(EngineMode::Print));
    let context = Arc::new(RecordingContext::default());
    let mut settings = batch_settings();
    settings.fail_on_missing_css = true;

    let err = orchestrator(&workspace, settings, &engine, &context)
        .run()
        .await
        .expect_err("missing css");

    assert_eq!(err.to_string(), "No CSS files found for docs/a.md");
    assert!(engine.seen().is_empty());
    assert_eq!(
        context.events(),
        vec!["start:Processing docs/a.md".to_string(), "end".to_string()]
    );
}

#[tokio::test]
async fn malformed_front_matter_names_the_document() {
    let (_dir, workspace) = common::workspace(&[("bad.md", "---\ntitle: [unclosed\n---\nBody")]);
    let engine = Arc::new(FakeEngine::new(EngineMode::Print));
    let context = Arc::new(RecordingContext::default());

    let err = orchestrator(&workspace, batch_settings(), &engine, &context)
        .run()
        .await
        .expect_err("invalid yaml");

    assert!(matches!(err, AppError::Validation { ref document, .. } if document == "bad.md"));
    assert!(err.to_string().starts_with("bad.md: front matter is not valid YAML"));
}

#[tokio::test]
async fn renderer_failure_stops_before_later_documents() {
    let (dir, workspace) = common::workspace(&[("a.md", "# A"), ("b.md", "# B")]);
    let engine = Arc::new(FakeEngine::new(EngineMode::Fail));
    let context = Arc::new(RecordingContext::default());

    let err = orchestrator(&workspace, batch_settings(), &engine, &context)
        .run()
        .await
        .expect_err("renderer failure");

    assert!(err.to_string().starts_with("failed to render a.md"));
    assert!(err.to_string().contains("renderer crashed"));
    assert!(!err.is_timeout());
    assert_eq!(engine.seen().len(), 1);
    assert!(!dir.path().join("output/a.pdf").exists());
}

#[tokio::test]
async fn renderer_timeout_is_distinguishable_and_cleans_scratch_html() {
    let (dir, workspace) = common::workspace(&[("a.md", "# A")]);
    let engine = Arc::new(FakeEngine::new(EngineMode::Timeout));
    let context = Arc::new(RecordingContext::default());
    let mut settings = batch_settings();
    settings.generate_html = false;

    let err = orchestrator(&workspace, settings, &engine, &context)
        .run()
        .await
        .expect_err("timeout");

    assert!(err.is_timeout());
    assert!(err.to_string().contains("timed out"));
    assert!(listing(&dir.path().join("output")).is_empty());
}
