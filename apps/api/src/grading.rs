//! Grading client seam — the answer evaluator talks to the grader through
//! this trait so tests can script responses and count invocations.
//!
//! Carried in the service as `Arc<dyn GradingClient>`.

use async_trait::async_trait;

use crate::interview::prompts::{GRADING_SYSTEM, REPAIR_PROMPT_TEMPLATE, REPAIR_SYSTEM};
use crate::llm_client::{LlmClient, LlmError};

/// Sends grading prompts to the external model and asks it to fix its own
/// broken output. Both calls may fail at the transport level — that failure
/// is distinct from malformed-but-delivered output, which the repair
/// pipeline handles.
#[async_trait]
pub trait GradingClient: Send + Sync {
    /// Grades one answer. Returns the raw model text, unparsed.
    async fn grade(&self, prompt: &str) -> Result<String, LlmError>;

    /// One remote repair round-trip: hands the broken text back to the model
    /// and asks for valid JSON.
    async fn repair(&self, broken_text: &str) -> Result<String, LlmError>;
}

/// Production implementation backed by the Anthropic client.
pub struct LlmGradingClient {
    llm: LlmClient,
}

impl LlmGradingClient {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl GradingClient for LlmGradingClient {
    async fn grade(&self, prompt: &str) -> Result<String, LlmError> {
        self.llm.call_text(prompt, GRADING_SYSTEM).await
    }

    async fn repair(&self, broken_text: &str) -> Result<String, LlmError> {
        let prompt = REPAIR_PROMPT_TEMPLATE.replace("{broken}", broken_text);
        self.llm.call_text(&prompt, REPAIR_SYSTEM).await
    }
}
