use async_trait::async_trait;
use rca_api::{ConversationSession, MemoizedClient, SessionState};
use rca_core::{ApiError, Units};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::agent::{Agent, transcript_answer, transcript_question};
use crate::registry::CONVERSATIONAL;

/// Multi-turn agent over the conversational endpoint.
///
/// Calls through one instance are serialized: the next question is not sent
/// until the previous answer's continuation fields have been recorded.
#[derive(Debug)]
pub struct ConversationalAgent {
    session: Mutex<ConversationSession>,
}

impl ConversationalAgent {
    pub fn new(client: Arc<MemoizedClient>) -> Self {
        Self::from_session(ConversationSession::new(client))
    }

    pub fn from_session(session: ConversationSession) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.session.lock().await.state().clone()
    }

    pub async fn reset(&self) {
        self.session.lock().await.reset();
    }
}

#[async_trait]
impl Agent for ConversationalAgent {
    fn name(&self) -> &'static str {
        CONVERSATIONAL
    }

    async fn answer(
        &self,
        question: &str,
        units: Option<Units>,
        verbose: bool,
    ) -> Result<String, ApiError> {
        if verbose {
            transcript_question(self.name(), question);
        }
        let answer = self.session.lock().await.answer(question, units).await?;
        if verbose {
            transcript_answer(self.name(), &answer);
        }
        Ok(answer)
    }
}
