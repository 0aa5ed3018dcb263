//! Diff-aware pipeline: new documents plus two prior artifacts in, bundle
//! out. Structurally the single-version pipeline with a diff-detection
//! stage inserted between structuring and perspective extraction, and the
//! diff-aware stage variants fed the prior context.

use tracing::info;

use super::{MILESTONE_DIFF, MILESTONE_DIFF_PERSPECTIVES, MILESTONE_TESTSPEC, Pipeline};
use crate::convert::SourceDocument;
use crate::error::PipelineError;
use crate::progress::ProgressStage;

impl Pipeline<'_> {
    /// Run the diff-aware pipeline for one job.
    ///
    /// `old_structured` and `old_spec` are the prior-version artifacts the
    /// caller retained from an earlier run. Granularity is fixed by the
    /// diff-aware instruction, which reuses unchanged cases from the prior
    /// specification.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` from the first stage that fails; a terminal
    /// `failed` record is written best-effort first.
    pub async fn generate_diff(
        &self,
        files: &[SourceDocument],
        old_structured: &str,
        old_spec: &str,
        job_id: &str,
    ) -> Result<Vec<u8>, PipelineError> {
        info!(job_id, file_count = files.len(), "Starting diff-aware test spec generation");
        let mut reached = 0u8;
        match self
            .generate_diff_inner(files, old_structured, old_spec, job_id, &mut reached)
            .await
        {
            Ok(bundle) => Ok(bundle),
            Err(e) => {
                self.report_failed(job_id, reached);
                Err(e)
            }
        }
    }

    async fn generate_diff_inner(
        &self,
        files: &[SourceDocument],
        old_structured: &str,
        old_spec: &str,
        job_id: &str,
        reached: &mut u8,
    ) -> Result<Vec<u8>, PipelineError> {
        let structured = self.structure_documents(files, job_id).await?;

        *reached = MILESTONE_DIFF;
        self.report(
            job_id,
            ProgressStage::Structuring,
            "Detecting differences from the previous version...",
            MILESTONE_DIFF,
        );
        let diff_payload = format!(
            "--- Previous Design Document ---\n{old_structured}\n\n--- New Design Document ---\n{structured}"
        );
        let diff = self.stages.detect_diff(&diff_payload).await?;
        info!(job_id, "Diff detection complete");

        *reached = MILESTONE_DIFF_PERSPECTIVES;
        self.report(
            job_id,
            ProgressStage::Perspectives,
            "Extracting test perspectives for changed behavior...",
            MILESTONE_DIFF_PERSPECTIVES,
        );
        let perspectives_payload = format!(
            "--- Design Document ---\n{structured}\n\n--- Differences ---\n{diff}"
        );
        let (perspectives, _) = self
            .stages
            .extract_perspectives_with_diff(&perspectives_payload)
            .await?;
        info!(job_id, "Diff-aware perspective extraction complete");

        *reached = MILESTONE_TESTSPEC;
        self.report(
            job_id,
            ProgressStage::Testspec,
            "Generating updated test specification...",
            MILESTONE_TESTSPEC,
        );
        let spec_payload = format!(
            "--- Design Document ---\n{structured}\n\n--- Test Perspectives ---\n{perspectives}\n\n\
             --- Differences ---\n{diff}\n\n--- Previous Test Specification ---\n{old_spec}"
        );
        let (spec, _) = self.stages.create_test_spec_with_diff(&spec_payload).await?;
        info!(job_id, "Diff-aware test specification generation complete");

        self.finish(job_id, files, &structured, &perspectives, &spec, reached)
    }
}
