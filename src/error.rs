//! Error taxonomy for specforge.
//!
//! Errors are split into three layers:
//! - [`LlmError`]: backend-level failures from the inference service, with
//!   enough granularity to decide retry behavior (only throttling retries).
//! - [`GatewayError`]: the public failure surface of the invocation gateway.
//!   Every non-retryable backend failure collapses into a single
//!   `Invocation` kind; configuration problems are reported separately and
//!   are always raised before any network activity.
//! - [`PipelineError`]: orchestrator-level failures, wrapping gateway,
//!   converter, and packaging errors.
//!
//! Progress-store failures are deliberately absent: the tracker absorbs its
//! own write and delete errors (they are observability, not correctness),
//! and reads collapse to `Option`.

use std::time::Duration;
use thiserror::Error;

/// Backend-level failures from the inference service.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity, malformed response)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403, missing API key)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider throttling signal (429); the only retryable condition
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Configuration error
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),
}

impl LlmError {
    /// Whether this error is a throttling signal the gateway may retry.
    #[must_use]
    pub fn is_throttle(&self) -> bool {
        matches!(self, Self::ProviderQuota(_))
    }
}

/// Public failure surface of the invocation gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Required model identifiers or credentials are missing. Raised before
    /// any network attempt, never retried.
    #[error("Gateway misconfiguration: {0}")]
    Misconfiguration(String),

    /// The inference call failed: either a non-retryable backend error or
    /// throttling that persisted through every allowed attempt.
    #[error("Inference service invocation failed: {0}")]
    Invocation(String),
}

/// Orchestrator-level failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Document or artifact conversion failed
    #[error("Conversion failed: {0}")]
    Convert(String),

    /// Archive packaging failed
    #[error("Bundle packaging failed: {0}")]
    Bundle(String),
}
