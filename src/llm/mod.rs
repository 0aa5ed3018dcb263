//! Inference-service access: backend abstraction, the retrying invocation
//! gateway, and the per-stage bindings used by the pipeline.

pub mod gateway;
pub mod http_backend;
pub mod stages;
pub mod types;

pub use gateway::{Gateway, throttle_backoff};
pub use stages::{Granularity, StageClient};
pub use types::{LlmBackend, LlmInvocation, LlmResult, UsageInfo};
