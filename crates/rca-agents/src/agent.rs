use async_trait::async_trait;
use rca_core::{ApiError, Units};
use serde_json::Value;

/// `tracing` target for verbose question/answer rendering.
pub const TRANSCRIPT_TARGET: &str = "rca::transcript";

/// Something that answers a question with a string.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Registry name of this agent.
    fn name(&self) -> &'static str;

    /// Answer `question`. `verbose` renders the question and the answer on
    /// the transcript target and never changes the returned value.
    async fn answer(
        &self,
        question: &str,
        units: Option<Units>,
        verbose: bool,
    ) -> Result<String, ApiError>;
}

pub(crate) fn transcript_question(agent: &str, question: &str) {
    tracing::info!(target: TRANSCRIPT_TARGET, agent, "Q: {question}");
}

pub(crate) fn transcript_answer(agent: &str, answer: &str) {
    tracing::info!(target: TRANSCRIPT_TARGET, agent, "A: {answer}");
}

/// The `result` field of a response as text.
pub(crate) fn result_text(response: &Value) -> Result<String, ApiError> {
    match response.get("result") {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(ApiError::Decode("response has no `result` field".to_string())),
    }
}
