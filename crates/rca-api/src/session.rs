//! Conversational session: threads server-issued continuation fields through
//! consecutive calls.

use rca_core::{ApiError, Units};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::memo::{AnswerRequest, MemoizedClient};
use crate::transport::CONVERSATION_ENDPOINT;

/// Continuation fields issued by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Host to route the next call through.
    pub host: Option<String>,
    /// Session token, sent back as `s`.
    pub session_token: Option<String>,
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Fresh,
    Continuing,
}

/// One multi-turn exchange with the conversational endpoint.
///
/// `answer` takes `&mut self`: a session cannot have two calls in flight.
/// Share one across tasks behind an async mutex.
#[derive(Debug)]
pub struct ConversationSession {
    client: Arc<MemoizedClient>,
    geolocation: Option<String>,
    ip: Option<String>,
    timeout: Option<Duration>,
    state: SessionState,
}

impl ConversationSession {
    pub fn new(client: Arc<MemoizedClient>) -> Self {
        Self {
            client,
            geolocation: None,
            ip: None,
            timeout: None,
            state: SessionState::default(),
        }
    }

    pub fn with_geolocation(mut self, geolocation: Option<String>) -> Self {
        self.geolocation = geolocation;
        self
    }

    pub fn with_ip(mut self, ip: Option<String>) -> Self {
        self.ip = ip;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        if self.state.conversation_id.is_some() {
            SessionPhase::Continuing
        } else {
            SessionPhase::Fresh
        }
    }

    /// Forget all continuation fields.
    pub fn reset(&mut self) {
        self.state = SessionState::default();
    }

    /// The request the next `answer` call would issue.
    pub fn build_request(&self, question: &str, units: Option<Units>) -> AnswerRequest {
        let mut request = AnswerRequest::new(question, CONVERSATION_ENDPOINT)
            .with_host(self.state.host.clone())
            .with_timeout(self.timeout);
        if let Some(geolocation) = &self.geolocation {
            request = request.with_param("geolocation", geolocation.as_str());
        }
        if let Some(ip) = &self.ip {
            request = request.with_param("ip", ip.as_str());
        }
        if let Some(id) = &self.state.conversation_id {
            request = request.with_param("conversationid", id.as_str());
        }
        if let Some(token) = &self.state.session_token {
            request = request.with_param("s", token.as_str());
        }
        if let Some(units) = units {
            request = request.with_param("units", units);
        }
        request
    }

    pub async fn answer(&mut self, question: &str, units: Option<Units>) -> Result<String, ApiError> {
        let request = self.build_request(question, units);
        let response = self.client.call(&request).await?;

        if let Some(error) = response.get("error") {
            return Err(ApiError::ConversationError(field_text(error)));
        }

        self.absorb(&response);
        match response.get("result") {
            Some(result) => Ok(field_text(result)),
            None => Err(ApiError::Decode(
                "conversation response has no `result` field".to_string(),
            )),
        }
    }

    fn absorb(&mut self, response: &Value) {
        if let Some(id) = response.get("conversationID") {
            self.state.conversation_id = Some(field_text(id));
        }
        if let Some(host) = response.get("host") {
            self.state.host = Some(field_text(host));
        }
        if let Some(s) = response.get("s") {
            self.state.session_token = Some(field_text(s));
        }
        debug!(phase = ?self.phase(), host = ?self.state.host, "session state updated");
    }
}

/// Strings verbatim, anything else as compact JSON.
fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
