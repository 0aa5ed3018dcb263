//! Invocation gateway: one logical inference request with bounded retry.
//!
//! The gateway issues synchronous (from the caller's point of view) requests
//! to the inference service and retries only on the throttling signal, with
//! a capped exponential backoff. Every other failure, and throttling that
//! outlives the attempt budget, surfaces as the single
//! [`GatewayError::Invocation`] kind.
//!
//! Concurrent invocations are fully independent: the gateway holds no
//! mutable state, so one instance can serve any number of jobs. A
//! process-wide instance is constructed lazily and exactly once via
//! [`Gateway::shared`], with configuration validated before any network
//! attempt.

use std::time::Duration;

use once_cell::sync::OnceCell;
use tracing::{error, warn};

use crate::config::{DEFAULT_MAX_ATTEMPTS, GatewayConfig, MAX_OUTPUT_TOKENS, StageModels};
use crate::error::GatewayError;
use crate::llm::http_backend::AnthropicBackend;
use crate::llm::types::{LlmBackend, LlmInvocation, UsageInfo};

/// Backoff ceiling per wait.
const BACKOFF_CAP: Duration = Duration::from_secs(120);

/// Backoff before retrying the attempt after 0-indexed attempt `i`:
/// `min(3 * 2^i + 5 * i, 120)` seconds.
///
/// The schedule front-loads short waits (3s, 11s, 22s, 39s, 68s) and caps at
/// two minutes so a long throttling episode cannot stall a job indefinitely
/// between attempts.
#[must_use]
pub fn throttle_backoff(attempt: u32) -> Duration {
    let exponential = 3u64.saturating_mul(1u64 << attempt.min(63));
    let linear = 5u64.saturating_mul(u64::from(attempt));
    Duration::from_secs(exponential.saturating_add(linear)).min(BACKOFF_CAP)
}

/// Process-wide gateway instance, constructed on first use.
static SHARED: OnceCell<Gateway> = OnceCell::new();

/// Resilient front for the inference service.
pub struct Gateway {
    backend: Box<dyn LlmBackend>,
}

impl Gateway {
    /// Wrap an explicit backend. Used directly by tests and embedders;
    /// production callers go through [`Gateway::shared`].
    #[must_use]
    pub fn new(backend: Box<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// The lazily constructed process-wide gateway.
    ///
    /// Construction is guarded: concurrent first calls build the backend at
    /// most once. Stage model configuration is validated here so that a
    /// missing identifier fails before any network attempt.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Misconfiguration` if the API key is absent or
    /// any stage model identifier is empty.
    pub fn shared() -> Result<&'static Gateway, GatewayError> {
        SHARED.get_or_try_init(|| {
            StageModels::from_env().validate()?;
            let config = GatewayConfig::from_env()?;
            let backend = AnthropicBackend::new(&config)
                .map_err(|e| GatewayError::Misconfiguration(e.to_string()))?;
            Ok(Gateway::new(Box::new(backend)))
        })
    }

    /// Issue one logical request, retrying throttled attempts.
    ///
    /// Attempt `i` (0-indexed) that hits the throttling signal waits
    /// [`throttle_backoff`]`(i)` before the next attempt, provided attempts
    /// remain. Non-throttle failures surface immediately; an exhausted
    /// budget surfaces with a generic message. Either way the failure kind
    /// is the single `GatewayError::Invocation`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Invocation` on any terminal failure.
    pub async fn invoke(
        &self,
        role_instruction: &str,
        payload: &str,
        model: &str,
        max_attempts: u32,
    ) -> Result<(String, UsageInfo), GatewayError> {
        for attempt in 0..max_attempts {
            let inv = LlmInvocation::new(role_instruction, payload, model, MAX_OUTPUT_TOKENS);
            match self.backend.invoke(inv).await {
                Ok(result) => return Ok((result.text, result.usage)),
                Err(e) if e.is_throttle() && attempt + 1 < max_attempts => {
                    let wait = throttle_backoff(attempt);
                    warn!(
                        model,
                        attempt = attempt + 1,
                        max_attempts,
                        wait_secs = wait.as_secs(),
                        "Inference service throttled; backing off before retry"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    error!(model, attempt = attempt + 1, error = %e, "Inference invocation failed");
                    return Err(GatewayError::Invocation(e.to_string()));
                }
            }
        }
        Err(GatewayError::Invocation(
            "inference service call failed: retry budget exhausted".to_string(),
        ))
    }

    /// [`Gateway::invoke`] with the default attempt budget.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Invocation` on any terminal failure.
    pub async fn invoke_default(
        &self,
        role_instruction: &str,
        payload: &str,
        model: &str,
    ) -> Result<(String, UsageInfo), GatewayError> {
        self.invoke(role_instruction, payload, model, DEFAULT_MAX_ATTEMPTS)
            .await
    }
}
