use async_trait::async_trait;
use rca_api::{AnswerRequest, MemoizedClient, SHORT_ANSWER_ENDPOINT};
use rca_core::{ApiError, Units};
use std::sync::Arc;
use std::time::Duration;

use crate::agent::{Agent, result_text, transcript_answer, transcript_question};
use crate::registry::SHORT_ANSWER;

/// Stateless agent over the short-answer endpoint.
#[derive(Debug, Clone)]
pub struct ShortAnswerAgent {
    client: Arc<MemoizedClient>,
    timeout: Option<Duration>,
}

impl ShortAnswerAgent {
    pub fn new(client: Arc<MemoizedClient>) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn request(&self, question: &str, units: Option<Units>) -> AnswerRequest {
        let mut request =
            AnswerRequest::new(question, SHORT_ANSWER_ENDPOINT).with_timeout(self.timeout);
        if let Some(units) = units {
            request = request.with_param("units", units);
        }
        request
    }
}

#[async_trait]
impl Agent for ShortAnswerAgent {
    fn name(&self) -> &'static str {
        SHORT_ANSWER
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
        let response = self.client.call(&self.request(question, units)).await?;
        let answer = result_text(&response)?;
        if verbose {
            transcript_answer(self.name(), &answer);
        }
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rca_api::testing::ScriptedTransport;
    use rca_cache::MemoryCache;
    use serde_json::json;

    fn agent_over(transport: Arc<ScriptedTransport>) -> ShortAnswerAgent {
        let client = MemoizedClient::new(
            transport,
            Arc::new(MemoryCache::new()),
            Some("KEY".into()),
        );
        ShortAnswerAgent::new(Arc::new(client))
    }

    #[tokio::test]
    async fn test_los_angeles_distance_end_to_end() {
        let transport = Arc::new(ScriptedTransport::always(json!({"result": "2,462 miles"})));
        let agent = agent_over(Arc::clone(&transport));

        let answer = agent
            .answer("How far is Los Angeles from New York?", None, false)
            .await
            .unwrap();

        assert_eq!(answer, "2,462 miles");
        let sent = transport.requests();
        assert_eq!(sent[0].endpoint, SHORT_ANSWER_ENDPOINT);
        assert_eq!(
            sent[0].query,
            "appid=KEY&i=How%20far%20is%20Los%20Angeles%20from%20New%20York%3F"
        );
    }

    #[tokio::test]
    async fn test_units_only_sent_when_given() {
        let transport = Arc::new(ScriptedTransport::always(json!({"result": "3,962 km"})));
        let agent = agent_over(Arc::clone(&transport));

        agent.answer("q", Some(Units::Metric), false).await.unwrap();
        agent.answer("q", None, false).await.unwrap();

        let sent = transport.requests();
        assert!(sent[0].query.ends_with("&units=metric"));
        assert!(!sent[1].query.contains("units="));
    }

    #[tokio::test]
    async fn test_errors_propagate_unchanged() {
        let transport = Arc::new(
            ScriptedTransport::new().push(Err(ApiError::InvalidParameter("units".into()))),
        );
        let agent = agent_over(transport);
        assert_eq!(
            agent.answer("q", None, false).await.unwrap_err(),
            ApiError::InvalidParameter("units".into())
        );
    }
}
