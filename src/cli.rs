//! Command-line interface for specforge.
//!
//! The CLI plays the hosting-environment role around the core pipeline: it
//! validates uploads, assigns job ids, invokes a job synchronously, and
//! writes the resulting bundle to disk. `status` is the independent poller
//! contract: it reads the progress store by job id without touching any
//! pipeline state.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use crate::convert::{MarkdownConverter, SourceDocument, TableRenderer};
use crate::llm::{Gateway, Granularity, StageClient};
use crate::pipeline::Pipeline;
use crate::progress::ProgressTracker;
use crate::{StageModels, logging};

/// Maximum number of uploaded documents per job.
const MAX_FILES: usize = 10;

/// Maximum size per uploaded document (50 MiB).
const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// specforge - test specification generation from design documents
#[derive(Parser)]
#[command(name = "specforge")]
#[command(about = "Generates test specifications from design documents via staged LLM calls")]
#[command(long_about = r#"
specforge converts design documents into a bundle of test-specification
artifacts: a structured copy of the design, extracted test perspectives, and
a generated specification in Markdown, spreadsheet, and CSV forms.

EXAMPLES:
  # Generate from a single document
  specforge generate design.md --granularity detailed --out design.zip

  # Generate from several documents with an explicit job id
  specforge generate a.md b.md --job-id nightly-42

  # Incremental run against prior artifacts
  specforge generate-diff new-design.md \
      --old-structured prior_structured.md --old-spec prior_testspec.md

  # Poll a job's progress from another terminal
  specforge status nightly-42

  # Remove a job's progress record
  specforge clean nightly-42

CONFIGURATION (environment):
  ANTHROPIC_API_KEY            inference service credential (required)
  SPECFORGE_PROGRESS_DIR       progress store endpoint (required for tracking)
  SPECFORGE_MODEL_*            per-stage model overrides (optional)
"#)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a test specification bundle from design documents
    Generate {
        /// Design document files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Test granularity: simple or detailed (unrecognized values fall
        /// back to simple)
        #[arg(long, default_value = "simple")]
        granularity: String,

        /// Job id for progress tracking (generated when omitted)
        #[arg(long)]
        job_id: Option<String>,

        /// Output path for the artifact bundle
        #[arg(long, default_value = "testspec.zip")]
        out: PathBuf,
    },

    /// Generate against a previous version's artifacts
    GenerateDiff {
        /// New design document files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Structured design text from the previous run
        #[arg(long)]
        old_structured: PathBuf,

        /// Test specification text from the previous run
        #[arg(long)]
        old_spec: PathBuf,

        /// Job id for progress tracking (generated when omitted)
        #[arg(long)]
        job_id: Option<String>,

        /// Output path for the artifact bundle
        #[arg(long, default_value = "testspec.zip")]
        out: PathBuf,
    },

    /// Print the current progress record for a job
    Status {
        /// Job id to look up
        job_id: String,
    },

    /// Delete the progress record for a job
    Clean {
        /// Job id to remove
        job_id: String,
    },
}

/// Parse arguments and run the selected command.
///
/// # Errors
///
/// Returns an error for invalid input, configuration problems, or a failed
/// pipeline run; `main` maps it to a nonzero exit.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init_tracing(cli.verbose) {
        eprintln!("warning: failed to initialize logging: {e}");
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    match cli.command {
        Command::Generate {
            files,
            granularity,
            job_id,
            out,
        } => {
            let documents = load_documents(&files)?;
            let job_id = job_id.unwrap_or_else(generate_job_id);
            let granularity = Granularity::parse(&granularity);

            let bundle = runtime.block_on(run_generate(&documents, granularity, &job_id))?;
            std::fs::write(&out, bundle)
                .with_context(|| format!("Failed to write bundle to {}", out.display()))?;
            println!("Job {job_id} complete: {}", out.display());
            Ok(())
        }

        Command::GenerateDiff {
            files,
            old_structured,
            old_spec,
            job_id,
            out,
        } => {
            let documents = load_documents(&files)?;
            let job_id = job_id.unwrap_or_else(generate_job_id);
            let old_structured = read_text(&old_structured)?;
            let old_spec = read_text(&old_spec)?;

            let bundle = runtime.block_on(run_generate_diff(
                &documents,
                &old_structured,
                &old_spec,
                &job_id,
            ))?;
            std::fs::write(&out, bundle)
                .with_context(|| format!("Failed to write bundle to {}", out.display()))?;
            println!("Job {job_id} complete: {}", out.display());
            Ok(())
        }

        Command::Status { job_id } => {
            let tracker = ProgressTracker::from_env()?;
            match tracker.get(&job_id) {
                Some(record) => {
                    println!("{}", serde_json::to_string_pretty(&record)?);
                    Ok(())
                }
                None => bail!("No progress record found for job '{job_id}'"),
            }
        }

        Command::Clean { job_id } => {
            let tracker = ProgressTracker::from_env()?;
            tracker.delete(&job_id);
            println!("Removed progress record for job '{job_id}' (if it existed)");
            Ok(())
        }
    }
}

async fn run_generate(
    documents: &[SourceDocument],
    granularity: Granularity,
    job_id: &str,
) -> Result<Vec<u8>> {
    let gateway = Gateway::shared()?;
    let stages = StageClient::new(gateway, StageModels::from_env());
    let tracker = open_tracker();
    let converter = MarkdownConverter;
    let renderer = TableRenderer;

    let pipeline = Pipeline::new(&stages, &converter, &renderer, tracker.as_ref());
    let bundle = pipeline.generate(documents, granularity, job_id).await?;
    Ok(bundle)
}

async fn run_generate_diff(
    documents: &[SourceDocument],
    old_structured: &str,
    old_spec: &str,
    job_id: &str,
) -> Result<Vec<u8>> {
    let gateway = Gateway::shared()?;
    let stages = StageClient::new(gateway, StageModels::from_env());
    let tracker = open_tracker();
    let converter = MarkdownConverter;
    let renderer = TableRenderer;

    let pipeline = Pipeline::new(&stages, &converter, &renderer, tracker.as_ref());
    let bundle = pipeline
        .generate_diff(documents, old_structured, old_spec, job_id)
        .await?;
    Ok(bundle)
}

/// Progress tracking is optional for CLI runs: without a configured
/// endpoint the pipeline runs untracked rather than refusing to start.
fn open_tracker() -> Option<ProgressTracker> {
    match ProgressTracker::from_env() {
        Ok(tracker) => Some(tracker),
        Err(e) => {
            tracing::warn!(error = %e, "Progress tracking disabled");
            None
        }
    }
}

fn generate_job_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Validate count and size limits, then read the uploads into memory.
fn load_documents(files: &[PathBuf]) -> Result<Vec<SourceDocument>> {
    if files.len() > MAX_FILES {
        bail!("Too many files: {} (maximum is {MAX_FILES})", files.len());
    }
    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        if metadata.len() > MAX_FILE_SIZE {
            bail!(
                "File {} is too large: {} bytes (maximum is {MAX_FILE_SIZE})",
                path.display(),
                metadata.len()
            );
        }
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        documents.push(SourceDocument::new(file_name, bytes));
    }
    Ok(documents)
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_load_documents_rejects_too_many_files() {
        let paths: Vec<PathBuf> = (0..MAX_FILES + 1)
            .map(|i| PathBuf::from(format!("f{i}.md")))
            .collect();
        let err = load_documents(&paths).unwrap_err();
        assert!(err.to_string().contains("Too many files"));
    }

    #[test]
    fn test_load_documents_rejects_missing_file() {
        let paths = vec![PathBuf::from("/definitely/not/here.md")];
        assert!(load_documents(&paths).is_err());
    }

    #[test]
    fn test_load_documents_reads_contents() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("design.md");
        std::fs::write(&path, "# design").unwrap();

        let documents = load_documents(&[path]).unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].file_name, "design.md");
        assert_eq!(documents[0].bytes, b"# design");
    }

    #[test]
    fn test_generated_job_ids_are_unique() {
        assert_ne!(generate_job_id(), generate_job_id());
    }
}
