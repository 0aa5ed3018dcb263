//! Shared test support: scripted inference backends that never touch the
//! network.

// Not every test crate uses every helper here.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use specforge::{LlmBackend, LlmError, LlmInvocation, LlmResult, StageModels, UsageInfo};

/// One scripted backend outcome.
pub enum Step {
    /// Succeed with this response text
    Ok(&'static str),
    /// Report the throttling signal
    Throttle,
    /// Report a non-retryable transport failure
    Fail(&'static str),
}

/// Backend that replays a fixed script of outcomes and records every
/// invocation it receives.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Step>>,
    pub calls: Mutex<Vec<LlmInvocation>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let model = inv.model.clone();
        self.calls.lock().unwrap().push(inv);
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("backend invoked more times than scripted");
        match step {
            Step::Ok(text) => Ok(LlmResult {
                text: text.to_string(),
                usage: UsageInfo {
                    input_tokens: 10,
                    output_tokens: 20,
                    model,
                },
            }),
            Step::Throttle => Err(LlmError::ProviderQuota(
                "inference service rate limit exceeded: 429".to_string(),
            )),
            Step::Fail(msg) => Err(LlmError::Transport(msg.to_string())),
        }
    }
}

/// Fixed responses for a full pipeline run, keyed off the role instruction
/// so the test can assert stage-to-stage data threading.
pub const STRUCTURED_TEXT: &str = "# Login Feature\n\nUsers sign in with email.";
pub const PERSPECTIVES_TEXT: &str = "- valid credentials\n- locked account";
pub const SPEC_TABLE: &str = "\
| ID | Feature | Test Case | Procedure | Expected Result |\n\
| --- | --- | --- | --- | --- |\n\
| 1 | Login | valid credentials | sign in | success |\n";

/// Backend that answers every call successfully based on which stage
/// instruction it sees, recording the instructions in order.
pub struct StageEchoBackend {
    pub instructions: Mutex<Vec<String>>,
    pub payloads: Mutex<Vec<String>>,
}

impl StageEchoBackend {
    pub fn new() -> Self {
        Self {
            instructions: Mutex::new(Vec::new()),
            payloads: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmBackend for StageEchoBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        self.instructions
            .lock()
            .unwrap()
            .push(inv.role_instruction.clone());
        self.payloads.lock().unwrap().push(inv.payload.clone());

        let text = if inv.role_instruction == specforge::prompts::STRUCTURING {
            STRUCTURED_TEXT
        } else if inv.role_instruction == specforge::prompts::EXTRACT_TEST_PERSPECTIVES
            || inv.role_instruction == specforge::prompts::EXTRACT_TEST_PERSPECTIVES_WITH_DIFF
        {
            PERSPECTIVES_TEXT
        } else if inv.role_instruction == specforge::prompts::DIFF_DETECTION {
            "- login flow changed"
        } else {
            SPEC_TABLE
        };

        Ok(LlmResult {
            text: text.to_string(),
            usage: UsageInfo {
                input_tokens: 100,
                output_tokens: 200,
                model: inv.model,
            },
        })
    }
}

/// Forwarding wrapper so a test can keep an `Arc` handle to a backend that
/// has been boxed into a gateway.
pub struct SharedBackend<B: LlmBackend>(pub std::sync::Arc<B>);

#[async_trait]
impl<B: LlmBackend> LlmBackend for SharedBackend<B> {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        self.0.invoke(inv).await
    }
}

/// Stage models pointing at distinct fake ids so tests can tell the stages
/// apart in recorded invocations.
pub fn test_models() -> StageModels {
    StageModels {
        structuring: "model-structuring".to_string(),
        test_perspectives: "model-perspectives".to_string(),
        test_spec: "model-testspec".to_string(),
        diff_detection: "model-diff".to_string(),
    }
}
