//! Retry middleware with randomized exponential backoff.

use async_trait::async_trait;
use rand::Rng;
use rca_config::RetryConfig;
use rca_core::ApiError;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::transport::{Transport, TransportRequest};

/// Emitted before each retry (attempt 2 onward).
#[derive(Debug, Clone, PartialEq)]
pub struct RetryEvent {
    /// The attempt about to run (first retry = 2).
    pub attempt: u32,
    /// Sleep before that attempt.
    pub delay: Duration,
    /// Failure of the previous attempt.
    pub error: ApiError,
}

pub type RetryObserver = Arc<dyn Fn(&RetryEvent) + Send + Sync>;

/// Randomized exponential backoff.
///
/// Delay before retry `n` (n = 1 for the first retry) is drawn uniformly from
/// `[min, clamp(min * 2^(n-1), min, max)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub min: Duration,
    pub max: Duration,
}

impl Backoff {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    /// Upper bound of the window for retry `n`.
    pub fn ceiling(&self, retry: u32) -> Duration {
        let min_ms = duration_ms(self.min);
        let max_ms = duration_ms(self.max);
        let factor = 1_u64
            .checked_shl(retry.saturating_sub(1))
            .unwrap_or(u64::MAX);
        Duration::from_millis(min_ms.saturating_mul(factor).clamp(min_ms, max_ms))
    }

    pub fn delay(&self, retry: u32) -> Duration {
        let low = duration_ms(self.min);
        let high = duration_ms(self.ceiling(retry));
        if high <= low {
            return Duration::from_millis(low);
        }
        Duration::from_millis(rand::thread_rng().gen_range(low..=high))
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60))
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// What to retry, how long to wait, when to give up, and who to tell.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first. 0 is treated as 1.
    pub max_attempts: u32,
    pub backoff: Backoff,
    predicate: fn(&ApiError) -> bool,
    on_retry: Option<RetryObserver>,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            backoff,
            predicate: ApiError::is_retryable,
            on_retry: None,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Backoff::new(config.min_delay(), config.max_delay()),
        )
    }

    pub fn with_predicate(mut self, predicate: fn(&ApiError) -> bool) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn with_observer(mut self, observer: RetryObserver) -> Self {
        self.on_retry = Some(observer);
        self
    }

    pub fn should_retry(&self, err: &ApiError) -> bool {
        (self.predicate)(err)
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// attempt budget runs out (→ [`ApiError::RetriesExhausted`]).
///
/// `op` receives the 1-based attempt number.
pub async fn retry_with<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, ApiError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let err = match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !policy.should_retry(&err) {
            return Err(err);
        }
        if attempt >= max_attempts {
            return Err(ApiError::RetriesExhausted {
                attempts: attempt,
                last: Box::new(err),
            });
        }

        let delay = policy.backoff.delay(attempt);
        attempt += 1;
        warn!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = ?err.kind(),
            "Retrying ({err}): attempt #{attempt}"
        );
        if let Some(observer) = &policy.on_retry {
            observer(&RetryEvent {
                attempt,
                delay,
                error: err,
            });
        }
        tokio::time::sleep(delay).await;
    }
}

/// Transport middleware applying a [`RetryPolicy`] around every call.
#[derive(Debug, Clone)]
pub struct RetryingTransport<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: Transport> RetryingTransport<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<T: Transport> Transport for RetryingTransport<T> {
    async fn send(&self, request: &TransportRequest) -> Result<Value, ApiError> {
        retry_with(&self.policy, |_| self.inner.send(request)).await
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
