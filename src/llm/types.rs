//! Core types for the inference-service backend abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// One logical request to the inference service: a fixed role instruction, a
/// single user-content payload, a model identifier, and an output budget.
#[derive(Debug, Clone)]
pub struct LlmInvocation {
    /// Fixed per-use-case instruction text (system prompt)
    pub role_instruction: String,
    /// Caller-assembled context, arbitrarily long
    pub payload: String,
    /// Model the service should route to
    pub model: String,
    /// Maximum output budget for this call
    pub max_tokens: u32,
}

impl LlmInvocation {
    #[must_use]
    pub fn new(
        role_instruction: impl Into<String>,
        payload: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            role_instruction: role_instruction.into(),
            payload: payload.into(),
            model: model.into(),
            max_tokens,
        }
    }
}

/// Token accounting for one invocation. Ephemeral: consumed immediately by
/// the calling stage function, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageInfo {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub model: String,
}

/// Result of one backend invocation: response text plus usage counters.
#[derive(Debug, Clone)]
pub struct LlmResult {
    pub text: String,
    pub usage: UsageInfo,
}

/// Trait for inference-service backends.
///
/// The gateway owns retry policy; a backend performs exactly one attempt per
/// `invoke` call and reports throttling as `LlmError::ProviderQuota` so the
/// gateway can distinguish the retryable condition.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Issue one request to the inference service.
    ///
    /// # Errors
    ///
    /// Returns `LlmError` for any failure: transport, authentication,
    /// throttling, outage, or timeout.
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError>;
}
