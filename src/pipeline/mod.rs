//! Pipeline orchestration: sequences the stage functions, threads each
//! stage's text into the next stage's payload, reports progress milestones,
//! and packages the final artifact bundle.
//!
//! Each job runs synchronously start to finish inside its invocation; there
//! is no orchestrator-level retry (retry is entirely the gateway's concern)
//! and no cancellation. Concurrency across jobs comes from the hosting
//! environment running multiple invocations in parallel; the orchestrator
//! keeps no shared mutable state between jobs.

mod diff;
mod normal;

use std::io::Write;

use zip::write::SimpleFileOptions;

use crate::convert::{DocumentConverter, SourceDocument, SpecRenderer};
use crate::error::PipelineError;
use crate::llm::StageClient;
use crate::progress::{ProgressStage, ProgressTracker};

/// Base name for bundle entries when more than one file was uploaded.
const GENERIC_BASE_NAME: &str = "document";

/// Progress milestone before perspective extraction.
pub(crate) const MILESTONE_PERSPECTIVES: u8 = 40;
/// Progress milestone before specification generation.
pub(crate) const MILESTONE_TESTSPEC: u8 = 70;
/// Progress milestone before artifact conversion.
pub(crate) const MILESTONE_CONVERTING: u8 = 90;
/// Diff-aware path: milestone before diff detection.
pub(crate) const MILESTONE_DIFF: u8 = 50;
/// Diff-aware path: milestone before diff-aware perspective extraction.
pub(crate) const MILESTONE_DIFF_PERSPECTIVES: u8 = 60;

/// Orchestrator over the stage functions, the progress tracker, and the
/// external format converters.
pub struct Pipeline<'a> {
    pub(crate) stages: &'a StageClient<'a>,
    pub(crate) converter: &'a dyn DocumentConverter,
    pub(crate) renderer: &'a dyn SpecRenderer,
    pub(crate) tracker: Option<&'a ProgressTracker>,
}

impl<'a> Pipeline<'a> {
    #[must_use]
    pub fn new(
        stages: &'a StageClient<'a>,
        converter: &'a dyn DocumentConverter,
        renderer: &'a dyn SpecRenderer,
        tracker: Option<&'a ProgressTracker>,
    ) -> Self {
        Self {
            stages,
            converter,
            renderer,
            tracker,
        }
    }

    pub(crate) fn report(&self, job_id: &str, stage: ProgressStage, message: &str, progress: u8) {
        if let Some(tracker) = self.tracker {
            tracker.update(job_id, stage, message, progress);
        }
    }

    /// Terminal record for an aborted run, carrying the last milestone
    /// reached. Best-effort like every other progress write.
    pub(crate) fn report_failed(&self, job_id: &str, reached: u8) {
        self.report(
            job_id,
            ProgressStage::Failed,
            "Generation failed",
            reached,
        );
    }
}

/// Entry base name: the single uploaded file's stem, or the generic label.
pub(crate) fn bundle_base_name(files: &[SourceDocument]) -> String {
    if let [only] = files {
        only.stem().to_string()
    } else {
        GENERIC_BASE_NAME.to_string()
    }
}

/// Package the five artifacts into one deflated zip archive.
pub(crate) fn bundle_artifacts(
    base: &str,
    structured: &str,
    perspectives: &str,
    spec: &str,
    sheet: &[u8],
    tabular: &[u8],
) -> Result<Vec<u8>, PipelineError> {
    let cursor = std::io::Cursor::new(Vec::new());
    let mut archive = zip::ZipWriter::new(cursor);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let entries: [(String, &[u8]); 5] = [
        (format!("{base}_structured.md"), structured.as_bytes()),
        (format!("{base}_perspectives.md"), perspectives.as_bytes()),
        (format!("{base}_testspec.md"), spec.as_bytes()),
        (format!("{base}_testspec.xlsx"), sheet),
        (format!("{base}_testspec.csv"), tabular),
    ];

    for (name, content) in entries {
        archive
            .start_file(&name, options)
            .map_err(|e| PipelineError::Bundle(format!("entry '{name}': {e}")))?;
        archive
            .write_all(content)
            .map_err(|e| PipelineError::Bundle(format!("entry '{name}': {e}")))?;
    }

    let cursor = archive
        .finish()
        .map_err(|e| PipelineError::Bundle(format!("archive finalize: {e}")))?;
    Ok(cursor.into_inner())
}
