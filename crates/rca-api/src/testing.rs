//! Scripted in-memory transport for tests.

use async_trait::async_trait;
use rca_core::ApiError;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::transport::{Transport, TransportRequest};

/// Replays queued outcomes in order and records every request it sees.
///
/// When the queue is empty, `fallback` is returned (if set), otherwise the
/// call fails with `HttpStatus 599` so a missing script is loud.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<Value, ApiError>>>,
    fallback: Option<Value>,
    delay: Option<Duration>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer with `value` once the script is exhausted.
    pub fn always(value: Value) -> Self {
        Self {
            fallback: Some(value),
            ..Self::default()
        }
    }

    pub fn push(self, outcome: Result<Value, ApiError>) -> Self {
        self.script
            .lock()
            .expect("script lock poisoned")
            .push_back(outcome);
        self
    }

    /// Sleep this long inside every `send`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().expect("requests lock poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().expect("requests lock poisoned").len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &TransportRequest) -> Result<Value, ApiError> {
        self.requests
            .lock()
            .expect("requests lock poisoned")
            .push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().expect("script lock poisoned").pop_front();
        match next {
            Some(outcome) => outcome,
            None => self
                .fallback
                .clone()
                .ok_or(ApiError::HttpStatus { code: 599 }),
        }
    }
}
