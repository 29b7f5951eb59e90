//! Memoizing call layer: every distinct logical request hits the network once.

use rca_cache::{CacheEntry, CacheKey, CacheStore, KeyMaterial};
use rca_config::AppConfig;
use rca_core::{ApiError, ParamValue};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

use crate::query::{QueryParams, encode_query};
use crate::retry::{RetryPolicy, RetryingTransport};
use crate::transport::{HttpTransport, Transport, TransportRequest};

/// Function name recorded in cache keys for answer calls.
pub const ANSWER_FUNCTION: &str = "answer";

/// A logical answer request.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRequest {
    pub question: String,
    pub endpoint: String,
    pub host: Option<String>,
    /// Cache discriminator. Never sent to the service; bump it to force a
    /// fresh sample of an otherwise identical request.
    pub cache_id: u32,
    pub params: QueryParams,
    /// Overrides the client's default timeout. Not part of the cache key.
    pub timeout: Option<Duration>,
}

impl AnswerRequest {
    pub fn new(question: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            endpoint: endpoint.into(),
            host: None,
            cache_id: 0,
            params: QueryParams::new(),
            timeout: None,
        }
    }

    pub fn with_host(mut self, host: Option<String>) -> Self {
        self.host = host;
        self
    }

    pub fn with_cache_id(mut self, cache_id: u32) -> Self {
        self.cache_id = cache_id;
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.set(name, value);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Order-independent identity of this request.
    pub fn key_material(&self) -> KeyMaterial {
        let mut material = KeyMaterial::new(ANSWER_FUNCTION)
            .arg("question", self.question.as_str())
            .arg("endpoint", self.endpoint.as_str())
            .arg("host", self.host.clone())
            .arg("cache_id", self.cache_id);
        for (name, value) in self.params.iter() {
            material.insert(format!("param.{name}"), param_json(value));
        }
        material
    }
}

fn param_json(value: &ParamValue) -> Value {
    match value {
        ParamValue::Int(v) => Value::from(*v),
        ParamValue::Float(v) => Value::from(*v),
        ParamValue::Text(v) => Value::from(v.as_str()),
    }
}

/// Retrying HTTP transport built from configuration.
pub fn build_transport(config: &AppConfig) -> Arc<dyn Transport> {
    Arc::new(RetryingTransport::new(
        HttpTransport::new(&config.service),
        RetryPolicy::from_config(&config.retry),
    ))
}

/// Cache-first client over a [`Transport`].
///
/// Concurrent misses on the same key inside this process are serialized so
/// only the first performs the outbound call. Across processes there is no
/// coordination; the last write wins.
pub struct MemoizedClient {
    transport: Arc<dyn Transport>,
    cache: Arc<dyn CacheStore>,
    api_key: Option<String>,
    default_timeout: Option<Duration>,
    inflight: InflightMap,
}

impl std::fmt::Debug for MemoizedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoizedClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

impl MemoizedClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        cache: Arc<dyn CacheStore>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            transport,
            cache,
            api_key,
            default_timeout: None,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Client wired from configuration: retrying HTTP transport, service
    /// API key, and default timeout.
    pub fn from_config(config: &AppConfig, cache: Arc<dyn CacheStore>) -> Self {
        Self::new(build_transport(config), cache, config.service.api_key.clone())
            .with_default_timeout(config.service.timeout())
    }

    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub async fn call(&self, request: &AnswerRequest) -> Result<Value, ApiError> {
        let material = request.key_material();
        let key = material.key();

        if let Some(hit) = self.lookup(&key).await {
            return Ok(hit);
        }

        let claim = InflightClaim::enter(&self.inflight, &key);
        let _turn = claim.turn.lock().await;
        // A concurrent caller may have filled the entry while we waited.
        match self.lookup(&key).await {
            Some(hit) => Ok(hit),
            None => self.call_through(&key, &material, request).await,
        }
    }

    async fn lookup(&self, key: &CacheKey) -> Option<Value> {
        match self.cache.get(key).await {
            Ok(Some(entry)) => {
                debug!(key = %key, "cache hit");
                Some(entry.response)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(key = %key, "cache read failed, treating as miss: {e:#}");
                None
            }
        }
    }

    async fn call_through(
        &self,
        key: &CacheKey,
        material: &KeyMaterial,
        request: &AnswerRequest,
    ) -> Result<Value, ApiError> {
        debug!(key = %key, endpoint = %request.endpoint, "cache miss");
        let app_id = self.api_key.as_deref().ok_or(ApiError::MissingApiKey)?;
        let outbound = TransportRequest {
            host: request.host.clone(),
            endpoint: request.endpoint.clone(),
            query: encode_query(app_id, &request.question, &request.params),
            timeout: request.timeout.or(self.default_timeout),
        };
        let response = self.transport.send(&outbound).await?;

        // Application errors inside a 2xx body are not worth replaying.
        if response.get("error").is_none() {
            let entry = CacheEntry::new(material, response.clone());
            if let Err(e) = self.cache.put(key, &entry).await {
                warn!(key = %key, "cache write failed: {e:#}");
            }
        }
        Ok(response)
    }
}

/// Per-key gate shared by concurrent misses.
#[derive(Default)]
struct Gate {
    turn: Arc<tokio::sync::Mutex<()>>,
    holders: usize,
}

type InflightMap = Mutex<HashMap<CacheKey, Gate>>;

/// A caller's hold on a [`Gate`]. The last claim to drop removes the gate,
/// including when the owning future is cancelled mid-call.
struct InflightClaim<'a> {
    inflight: &'a InflightMap,
    key: CacheKey,
    turn: Arc<tokio::sync::Mutex<()>>,
}

impl<'a> InflightClaim<'a> {
    fn enter(inflight: &'a InflightMap, key: &CacheKey) -> Self {
        let mut map = inflight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let gate = map.entry(key.clone()).or_default();
        gate.holders += 1;
        Self {
            inflight,
            key: key.clone(),
            turn: Arc::clone(&gate.turn),
        }
    }
}

impl Drop for InflightClaim<'_> {
    fn drop(&mut self) {
        let mut map = self
            .inflight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(gate) = map.get_mut(&self.key) {
            gate.holders = gate.holders.saturating_sub(1);
            if gate.holders == 0 {
                map.remove(&self.key);
            }
        }
    }
}

#[cfg(test)]
#[path = "memo_tests.rs"]
mod tests;
