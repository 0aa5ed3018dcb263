//! Stage functions: fixed bindings of role instruction and model id over the
//! gateway, one per pipeline use case. All of them propagate gateway
//! failures unchanged.

use crate::config::StageModels;
use crate::error::GatewayError;
use crate::llm::gateway::Gateway;
use crate::llm::types::UsageInfo;
use crate::prompts;

/// Instruction variant for specification generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    #[default]
    Simple,
    Detailed,
}

impl Granularity {
    /// Parse a caller-supplied flag. Any value other than the two recognized
    /// ones silently falls back to `Simple`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "detailed" => Self::Detailed,
            _ => Self::Simple,
        }
    }
}

/// Gateway bound to per-stage models and instructions.
pub struct StageClient<'a> {
    gateway: &'a Gateway,
    models: StageModels,
}

impl<'a> StageClient<'a> {
    #[must_use]
    pub fn new(gateway: &'a Gateway, models: StageModels) -> Self {
        Self { gateway, models }
    }

    /// Turn raw extracted document text into normalized structured Markdown.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures unchanged.
    pub async fn structuring(&self, payload: &str) -> Result<(String, UsageInfo), GatewayError> {
        self.gateway
            .invoke_default(prompts::STRUCTURING, payload, &self.models.structuring)
            .await
    }

    /// Extract test perspectives from a structured document.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures unchanged.
    pub async fn extract_test_perspectives(
        &self,
        payload: &str,
    ) -> Result<(String, UsageInfo), GatewayError> {
        self.gateway
            .invoke_default(
                prompts::EXTRACT_TEST_PERSPECTIVES,
                payload,
                &self.models.test_perspectives,
            )
            .await
    }

    /// Generate the test specification, instruction variant selected by
    /// granularity.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures unchanged.
    pub async fn create_test_spec(
        &self,
        payload: &str,
        granularity: Granularity,
    ) -> Result<(String, UsageInfo), GatewayError> {
        let instruction = match granularity {
            Granularity::Detailed => prompts::CREATE_TEST_SPEC_DETAILED,
            Granularity::Simple => prompts::CREATE_TEST_SPEC_SIMPLE,
        };
        self.gateway
            .invoke_default(instruction, payload, &self.models.test_spec)
            .await
    }

    /// Describe the differences between an old and a new structured
    /// document. Usage is discarded: diff output is an intermediate control
    /// signal, not a billable deliverable.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures unchanged.
    pub async fn detect_diff(&self, payload: &str) -> Result<String, GatewayError> {
        let (text, _) = self
            .gateway
            .invoke_default(
                prompts::DIFF_DETECTION,
                payload,
                &self.models.diff_detection,
            )
            .await?;
        Ok(text)
    }

    /// Diff-aware perspective extraction.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures unchanged.
    pub async fn extract_perspectives_with_diff(
        &self,
        payload: &str,
    ) -> Result<(String, UsageInfo), GatewayError> {
        self.gateway
            .invoke_default(
                prompts::EXTRACT_TEST_PERSPECTIVES_WITH_DIFF,
                payload,
                &self.models.test_perspectives,
            )
            .await
    }

    /// Diff-aware specification generation.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures unchanged.
    pub async fn create_test_spec_with_diff(
        &self,
        payload: &str,
    ) -> Result<(String, UsageInfo), GatewayError> {
        self.gateway
            .invoke_default(
                prompts::CREATE_TEST_SPEC_WITH_DIFF,
                payload,
                &self.models.test_spec,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granularity_parses_recognized_values() {
        assert_eq!(Granularity::parse("detailed"), Granularity::Detailed);
        assert_eq!(Granularity::parse("simple"), Granularity::Simple);
    }

    #[test]
    fn test_granularity_falls_back_to_simple() {
        assert_eq!(Granularity::parse(""), Granularity::Simple);
        assert_eq!(Granularity::parse("DETAILED"), Granularity::Simple);
        assert_eq!(Granularity::parse("exhaustive"), Granularity::Simple);
    }
}
