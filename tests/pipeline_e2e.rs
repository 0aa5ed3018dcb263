//! End-to-end pipeline runs over scripted backends: bundle shape, progress
//! milestones, granularity fallback, and failure stamping.

mod common;

use std::io::Read;
use std::sync::Arc;

use common::{
    PERSPECTIVES_TEXT, STRUCTURED_TEXT, ScriptedBackend, SharedBackend, StageEchoBackend, Step,
    test_models,
};
use specforge::{
    Gateway, Granularity, MarkdownConverter, Pipeline, PipelineError, ProgressStage,
    ProgressTracker, SourceDocument, StageClient, TableRenderer, prompts,
};
use tempfile::TempDir;

fn bundle_entry_names(bytes: Vec<u8>) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

fn bundle_entry_text(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.to_vec())).unwrap();
    let mut content = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    content
}

#[tokio::test]
async fn single_document_detailed_run_produces_five_entries_and_completed_record() {
    let backend = Arc::new(StageEchoBackend::new());
    let gateway = Gateway::new(Box::new(SharedBackend(backend.clone())));
    let stages = StageClient::new(&gateway, test_models());
    let converter = MarkdownConverter;
    let renderer = TableRenderer;
    let store = TempDir::new().unwrap();
    let tracker = ProgressTracker::new(store.path());

    let pipeline = Pipeline::new(&stages, &converter, &renderer, Some(&tracker));
    let files = vec![SourceDocument::new(
        "login-design.md",
        b"login requirements".to_vec(),
    )];

    let bundle = pipeline
        .generate(&files, Granularity::Detailed, "job-e2e")
        .await
        .expect("pipeline should complete");

    // Five entries named after the single document's stem.
    let names = bundle_entry_names(bundle.clone());
    assert_eq!(names.len(), 5);
    for expected in [
        "login-design_structured.md",
        "login-design_perspectives.md",
        "login-design_testspec.md",
        "login-design_testspec.xlsx",
        "login-design_testspec.csv",
    ] {
        assert!(names.contains(&expected.to_string()), "missing {expected}");
    }

    // Text entries carry each stage's output.
    assert_eq!(
        bundle_entry_text(&bundle, "login-design_structured.md"),
        STRUCTURED_TEXT
    );
    assert_eq!(
        bundle_entry_text(&bundle, "login-design_perspectives.md"),
        PERSPECTIVES_TEXT
    );

    // A poll taken after completion shows the terminal record.
    let record = tracker.get("job-e2e").expect("record retained after completion");
    assert_eq!(record.stage, ProgressStage::Completed);
    assert_eq!(record.progress, 100);

    // Detailed granularity selected the detailed instruction.
    let instructions = backend.instructions.lock().unwrap();
    assert!(instructions.contains(&prompts::CREATE_TEST_SPEC_DETAILED.to_string()));

    // Stage outputs were threaded into downstream payloads.
    let payloads = backend.payloads.lock().unwrap();
    let spec_payload = payloads.last().unwrap();
    assert!(spec_payload.contains(STRUCTURED_TEXT));
    assert!(spec_payload.contains(PERSPECTIVES_TEXT));
}

#[tokio::test]
async fn multi_document_run_uses_generic_base_name() {
    let backend = Arc::new(StageEchoBackend::new());
    let gateway = Gateway::new(Box::new(SharedBackend(backend)));
    let stages = StageClient::new(&gateway, test_models());
    let converter = MarkdownConverter;
    let renderer = TableRenderer;

    let pipeline = Pipeline::new(&stages, &converter, &renderer, None);
    let files = vec![
        SourceDocument::new("a.md", b"first".to_vec()),
        SourceDocument::new("b.md", b"second".to_vec()),
    ];

    let bundle = pipeline
        .generate(&files, Granularity::Simple, "job-multi")
        .await
        .unwrap();

    let names = bundle_entry_names(bundle);
    assert_eq!(names.len(), 5);
    assert!(names.iter().all(|n| n.starts_with("document_")));
}

#[tokio::test]
async fn unrecognized_granularity_behaves_as_simple() {
    let backend = Arc::new(StageEchoBackend::new());
    let gateway = Gateway::new(Box::new(SharedBackend(backend.clone())));
    let stages = StageClient::new(&gateway, test_models());
    let converter = MarkdownConverter;
    let renderer = TableRenderer;

    let pipeline = Pipeline::new(&stages, &converter, &renderer, None);
    let files = vec![SourceDocument::new("d.md", b"content".to_vec())];

    pipeline
        .generate(&files, Granularity::parse("exhaustive"), "job-fallback")
        .await
        .unwrap();

    let instructions = backend.instructions.lock().unwrap();
    assert!(instructions.contains(&prompts::CREATE_TEST_SPEC_SIMPLE.to_string()));
    assert!(!instructions.contains(&prompts::CREATE_TEST_SPEC_DETAILED.to_string()));
}

#[tokio::test]
async fn mid_pipeline_failure_stamps_failed_record_and_propagates() {
    // Structuring succeeds, perspective extraction fails hard.
    let backend = Arc::new(ScriptedBackend::new(vec![
        Step::Ok("structured output"),
        Step::Fail("model unavailable"),
    ]));
    let gateway = Gateway::new(Box::new(SharedBackend(backend.clone())));
    let stages = StageClient::new(&gateway, test_models());
    let converter = MarkdownConverter;
    let renderer = TableRenderer;
    let store = TempDir::new().unwrap();
    let tracker = ProgressTracker::new(store.path());

    let pipeline = Pipeline::new(&stages, &converter, &renderer, Some(&tracker));
    let files = vec![SourceDocument::new("d.md", b"content".to_vec())];

    let err = pipeline
        .generate(&files, Granularity::Simple, "job-fail")
        .await
        .expect_err("stage failure aborts the run");

    assert!(matches!(err, PipelineError::Gateway(_)));
    assert_eq!(backend.call_count(), 2, "no further stages after the failure");

    // The terminal record reflects the failure and the last milestone reached.
    let record = tracker.get("job-fail").expect("failed record written");
    assert_eq!(record.stage, ProgressStage::Failed);
    assert_eq!(record.progress, 40);
}

#[tokio::test]
async fn untracked_run_still_produces_bundle() {
    let backend = Arc::new(StageEchoBackend::new());
    let gateway = Gateway::new(Box::new(SharedBackend(backend)));
    let stages = StageClient::new(&gateway, test_models());
    let converter = MarkdownConverter;
    let renderer = TableRenderer;

    let pipeline = Pipeline::new(&stages, &converter, &renderer, None);
    let files = vec![SourceDocument::new("d.md", b"content".to_vec())];

    let bundle = pipeline
        .generate(&files, Granularity::Simple, "job-untracked")
        .await
        .unwrap();
    assert_eq!(bundle_entry_names(bundle).len(), 5);
}

#[tokio::test]
async fn progress_milestones_are_observable_in_order() {
    // The tracker overwrites in place, so observe milestones by reading the
    // record between stages is not possible here; instead assert the
    // terminal state and that intermediate updates happened by scripting a
    // failure right before conversion.
    let backend = Arc::new(ScriptedBackend::new(vec![
        Step::Ok("structured"),
        Step::Ok("perspectives"),
        Step::Fail("spec model down"),
    ]));
    let gateway = Gateway::new(Box::new(SharedBackend(backend)));
    let stages = StageClient::new(&gateway, test_models());
    let converter = MarkdownConverter;
    let renderer = TableRenderer;
    let store = TempDir::new().unwrap();
    let tracker = ProgressTracker::new(store.path());

    let pipeline = Pipeline::new(&stages, &converter, &renderer, Some(&tracker));
    let files = vec![SourceDocument::new("d.md", b"content".to_vec())];

    let _ = pipeline
        .generate(&files, Granularity::Simple, "job-milestones")
        .await;

    // Failure happened during the testspec stage: the failed record carries
    // that milestone.
    let record = tracker.get("job-milestones").unwrap();
    assert_eq!(record.stage, ProgressStage::Failed);
    assert_eq!(record.progress, 70);
}
