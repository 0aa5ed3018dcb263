//! specforge - turns design documents into generated test specifications.
//!
//! The pipeline runs a sequence of inference-service calls per job:
//! structuring, test-perspective extraction, and specification generation
//! (plus diff detection and diff-aware variants for incremental runs). A
//! resilient invocation gateway bounds retries under throttling, and a
//! durable progress tracker lets an independent poller observe each job's
//! status under its job id, including after completion or failure. The
//! result of a successful run is a single zip bundle of five named
//! artifacts.
//!
//! specforge can be used two ways:
//! - **CLI**: `specforge generate design.md --granularity detailed`
//! - **Library**: build a [`Pipeline`] over a [`StageClient`] (and any
//!   [`LlmBackend`] implementation) and call [`Pipeline::generate`] or
//!   [`Pipeline::generate_diff`].

pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod progress;
pub mod prompts;

pub use config::{DEFAULT_MAX_ATTEMPTS, GatewayConfig, StageModels};
pub use convert::{
    ConvertProgress, DocumentConverter, MarkdownConverter, SourceDocument, SpecRenderer,
    TableRenderer,
};
pub use error::{GatewayError, LlmError, PipelineError};
pub use llm::{Gateway, Granularity, LlmBackend, LlmInvocation, LlmResult, StageClient, UsageInfo, throttle_backoff};
pub use pipeline::Pipeline;
pub use progress::{ProgressRecord, ProgressStage, ProgressTracker};
