//! Environment-backed configuration.
//!
//! All runtime configuration comes from environment variables, validated
//! eagerly so misconfiguration surfaces before any network activity. Model
//! identifiers have working defaults; the API key and the progress-store
//! endpoint do not.

use std::time::Duration;

use crate::error::GatewayError;

/// Environment variable holding the inference-service API key.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Default model used when a per-stage override is not set.
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Per-call output budget. Generated specifications are long-form text, so
/// the ceiling is deliberately generous.
pub const MAX_OUTPUT_TOKENS: u32 = 64_000;

/// Connect timeout; establishing the connection should be fast.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Request timeout; inference latency dominates and responses are large.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Default bounded retry count for throttled invocations.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Model identifiers for each stage of the pipeline.
#[derive(Debug, Clone)]
pub struct StageModels {
    pub structuring: String,
    pub test_perspectives: String,
    pub test_spec: String,
    pub diff_detection: String,
}

impl StageModels {
    /// Load per-stage model ids from the environment, falling back to the
    /// default model for any unset variable.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            structuring: env_or_default("SPECFORGE_MODEL_STRUCTURING"),
            test_perspectives: env_or_default("SPECFORGE_MODEL_TEST_PERSPECTIVES"),
            test_spec: env_or_default("SPECFORGE_MODEL_TEST_SPEC"),
            diff_detection: env_or_default("SPECFORGE_MODEL_DIFF_DETECTION"),
        }
    }

    /// Validate that every stage has a model identifier.
    ///
    /// An empty string (for example an explicitly blanked variable) is a
    /// configuration failure, raised before any network attempt.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Misconfiguration` naming the first empty slot.
    pub fn validate(&self) -> Result<(), GatewayError> {
        let slots = [
            ("structuring", &self.structuring),
            ("test_perspectives", &self.test_perspectives),
            ("test_spec", &self.test_spec),
            ("diff_detection", &self.diff_detection),
        ];
        for (name, value) in slots {
            if value.trim().is_empty() {
                return Err(GatewayError::Misconfiguration(format!(
                    "Model identifier for stage '{name}' is empty. \
                     Set SPECFORGE_MODEL_{} or unset it to use the default.",
                    name.to_ascii_uppercase()
                )));
            }
        }
        Ok(())
    }
}

fn env_or_default(var: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| DEFAULT_MODEL.to_string())
}

/// Gateway construction parameters.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// API key for the inference service
    pub api_key: String,
    /// Optional custom endpoint (defaults to the provider API)
    pub base_url: Option<String>,
}

impl GatewayConfig {
    /// Load gateway configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Misconfiguration` if the API key variable is
    /// not set.
    pub fn from_env() -> Result<Self, GatewayError> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            GatewayError::Misconfiguration(format!(
                "Inference service API key not found in environment variable '{API_KEY_ENV}'."
            ))
        })?;
        Ok(Self {
            api_key,
            base_url: std::env::var("SPECFORGE_API_BASE_URL").ok(),
        })
    }
}

/// Resolve the progress-store endpoint (root directory for progress records).
///
/// # Errors
///
/// Returns `GatewayError::Misconfiguration` if `SPECFORGE_PROGRESS_DIR` is
/// not set; the tracker refuses to construct without an endpoint.
pub fn progress_endpoint() -> Result<std::path::PathBuf, GatewayError> {
    std::env::var_os("SPECFORGE_PROGRESS_DIR")
        .map(std::path::PathBuf::from)
        .ok_or_else(|| {
            GatewayError::Misconfiguration(
                "SPECFORGE_PROGRESS_DIR is not set; the progress tracker requires a \
                 configured store endpoint."
                    .to_string(),
            )
        })
}
