//! Single-version pipeline: documents in, five-artifact bundle out.

use tracing::info;

use super::{MILESTONE_CONVERTING, MILESTONE_PERSPECTIVES, MILESTONE_TESTSPEC, Pipeline};
use crate::convert::SourceDocument;
use crate::error::PipelineError;
use crate::llm::Granularity;
use crate::progress::ProgressStage;

impl Pipeline<'_> {
    /// Run the single-version pipeline for one job.
    ///
    /// The whole run is synchronous within this call; a poller observes the
    /// milestones through the progress tracker under the same job id. On
    /// success the returned bytes are the complete artifact bundle; on
    /// failure a terminal `failed` record is written best-effort and the
    /// error propagates with no partial bundle.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` from the first stage that fails.
    pub async fn generate(
        &self,
        files: &[SourceDocument],
        granularity: Granularity,
        job_id: &str,
    ) -> Result<Vec<u8>, PipelineError> {
        info!(job_id, file_count = files.len(), "Starting test spec generation");
        let mut reached = 0u8;
        match self.generate_inner(files, granularity, job_id, &mut reached).await {
            Ok(bundle) => Ok(bundle),
            Err(e) => {
                self.report_failed(job_id, reached);
                Err(e)
            }
        }
    }

    async fn generate_inner(
        &self,
        files: &[SourceDocument],
        granularity: Granularity,
        job_id: &str,
        reached: &mut u8,
    ) -> Result<Vec<u8>, PipelineError> {
        let structured = self.structure_documents(files, job_id).await?;

        *reached = MILESTONE_PERSPECTIVES;
        self.report(
            job_id,
            ProgressStage::Perspectives,
            "Extracting test perspectives...",
            MILESTONE_PERSPECTIVES,
        );
        let perspectives_payload = format!("--- Design Document ---\n{structured}");
        let (perspectives, _) = self
            .stages
            .extract_test_perspectives(&perspectives_payload)
            .await?;
        info!(job_id, "Test perspective extraction complete");

        *reached = MILESTONE_TESTSPEC;
        self.report(
            job_id,
            ProgressStage::Testspec,
            "Generating test specification...",
            MILESTONE_TESTSPEC,
        );
        let spec_payload = format!(
            "--- Design Document ---\n{structured}\n\n--- Test Perspectives ---\n{perspectives}"
        );
        let (spec, _) = self.stages.create_test_spec(&spec_payload, granularity).await?;
        info!(job_id, "Test specification generation complete");

        self.finish(job_id, files, &structured, &perspectives, &spec, reached)
    }

    /// Convert uploads to one combined text and run the structuring stage.
    /// The converter reports fine-grained progress inside the 0–40 window;
    /// the structuring call itself is the tail of that window.
    pub(crate) async fn structure_documents(
        &self,
        files: &[SourceDocument],
        job_id: &str,
    ) -> Result<String, PipelineError> {
        let on_progress = |message: &str, percent: u8| {
            self.report(job_id, ProgressStage::Structuring, message, percent);
        };
        let combined = self.converter.combine_to_text(files, &on_progress)?;
        info!(job_id, "Document conversion complete");

        self.report(
            job_id,
            ProgressStage::Structuring,
            "Structuring document text...",
            30,
        );
        let (structured, _) = self.stages.structuring(&combined).await?;
        info!(job_id, "Structuring complete");
        Ok(structured)
    }

    /// Shared tail of both pipelines: render, bundle, stamp completion.
    pub(crate) fn finish(
        &self,
        job_id: &str,
        files: &[SourceDocument],
        structured: &str,
        perspectives: &str,
        spec: &str,
        reached: &mut u8,
    ) -> Result<Vec<u8>, PipelineError> {
        *reached = MILESTONE_CONVERTING;
        self.report(
            job_id,
            ProgressStage::Converting,
            "Converting artifacts...",
            MILESTONE_CONVERTING,
        );
        let (sheet, tabular) = self.renderer.render(spec)?;
        info!(job_id, "Artifact conversion complete");

        let base = super::bundle_base_name(files);
        let bundle = super::bundle_artifacts(&base, structured, perspectives, spec, &sheet, &tabular)?;

        self.report(job_id, ProgressStage::Completed, "Completed", 100);
        info!(job_id, bundle_bytes = bundle.len(), "Artifact bundle ready");
        Ok(bundle)
    }
}
