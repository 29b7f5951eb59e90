//! Single-shot HTTP calls to the answering service and response classification.

use async_trait::async_trait;
use rca_config::ServiceConfig;
use rca_core::ApiError;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Short Answers endpoint: plain-text body.
pub const SHORT_ANSWER_ENDPOINT: &str = "result";
/// Conversational endpoint: JSON body with continuation fields.
pub const CONVERSATION_ENDPOINT: &str = "conversation.jsp";

const RATE_LIMIT_SNIPPET_CHARS: usize = 100;

/// One outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// Continuation host issued by the service, if any.
    pub host: Option<String>,
    pub endpoint: String,
    pub query: String,
    pub timeout: Option<Duration>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &TransportRequest) -> Result<Value, ApiError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &TransportRequest) -> Result<Value, ApiError> {
        (**self).send(request).await
    }
}

/// `reqwest`-backed transport. Does not retry; wrap it in
/// [`crate::RetryingTransport`] for that.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    continuation_template: String,
}

impl HttpTransport {
    pub fn new(service: &ServiceConfig) -> Self {
        Self::with_client(reqwest::Client::new(), service)
    }

    pub fn with_client(client: reqwest::Client, service: &ServiceConfig) -> Self {
        Self {
            client,
            base_url: service.base_url.trim_end_matches('/').to_string(),
            continuation_template: service
                .continuation_url_template
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// `{base}/{endpoint}?{query}`, where base is the default URL or the
    /// continuation template filled with `host`.
    pub fn resolve_url(&self, host: Option<&str>, endpoint: &str, query: &str) -> String {
        let base = match host {
            None => self.base_url.clone(),
            Some(host) => self.continuation_template.replace("{host}", host),
        };
        format!("{base}/{endpoint}?{query}")
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &TransportRequest) -> Result<Value, ApiError> {
        let url = self.resolve_url(request.host.as_deref(), &request.endpoint, &request.query);
        debug!(endpoint = %request.endpoint, host = ?request.host, "POST to answering service");

        let mut builder = self.client.post(&url);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;

        classify_response(status, &request.endpoint, &body)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(err.to_string())
    }
}

/// Map an HTTP status and body to a result.
///
/// Checked in order: 429, 400, 501, any other non-2xx, then success. The
/// short-answer endpoint returns plain text, which is wrapped as
/// `{"result": text}`; every other endpoint must return JSON.
pub fn classify_response(status: u16, endpoint: &str, body: &str) -> Result<Value, ApiError> {
    match status {
        429 => Err(ApiError::RateLimited {
            message: rate_limit_message(body),
        }),
        400 => Err(ApiError::InvalidParameter(snippet(body))),
        501 => Err(ApiError::MissingParameter(snippet(body))),
        200..=299 => {
            if endpoint == SHORT_ANSWER_ENDPOINT {
                Ok(json!({ "result": body }))
            } else {
                serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
            }
        }
        code => Err(ApiError::HttpStatus { code }),
    }
}

/// `error.message` from a JSON body, else the first 100 characters of it.
fn rate_limit_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| snippet(body))
}

fn snippet(body: &str) -> String {
    body.chars().take(RATE_LIMIT_SNIPPET_CHARS).collect()
}
