use anyhow::{Result, bail};
use rca_api::{ConversationSession, MemoizedClient};
use std::sync::Arc;
use std::time::Duration;

use crate::agent::Agent;
use crate::conversational::ConversationalAgent;
use crate::short_answer::ShortAnswerAgent;

pub const SHORT_ANSWER: &str = "short-answer";
pub const CONVERSATIONAL: &str = "conversational";

/// Builds agents by name over one shared client.
///
/// Every lookup returns a new instance, so each caller of `conversational`
/// gets its own session.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    client: Arc<MemoizedClient>,
    timeout: Option<Duration>,
    geolocation: Option<String>,
    ip: Option<String>,
}

impl AgentRegistry {
    pub const NAMES: [&'static str; 2] = [SHORT_ANSWER, CONVERSATIONAL];

    pub fn new(client: Arc<MemoizedClient>) -> Self {
        Self {
            client,
            timeout: None,
            geolocation: None,
            ip: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Caller location forwarded by conversational agents.
    pub fn with_location(mut self, geolocation: Option<String>, ip: Option<String>) -> Self {
        self.geolocation = geolocation;
        self.ip = ip;
        self
    }

    pub fn client(&self) -> &Arc<MemoizedClient> {
        &self.client
    }

    pub fn agent(&self, name: &str) -> Result<Arc<dyn Agent>> {
        match name {
            SHORT_ANSWER => Ok(Arc::new(
                ShortAnswerAgent::new(Arc::clone(&self.client)).with_timeout(self.timeout),
            )),
            CONVERSATIONAL => {
                let session = ConversationSession::new(Arc::clone(&self.client))
                    .with_geolocation(self.geolocation.clone())
                    .with_ip(self.ip.clone())
                    .with_timeout(self.timeout);
                Ok(Arc::new(ConversationalAgent::from_session(session)))
            }
            other => bail!(
                "Unknown agent '{}'. Available: {}",
                other,
                Self::NAMES.join(", ")
            ),
        }
    }
}
