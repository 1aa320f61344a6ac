//! Bounded retry as a `Transport` decorator.
//!
//! The client itself never retries. Wrapping its transport in `Retrying`
//! adds exponential backoff with full jitter for failures that might be
//! transient: transport errors, 5xx and 429. Every other status is returned
//! on the first attempt.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::warn;

use crate::error::{is_retryable_status, TransportError};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero behaves like one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Upper bound of the delay after `attempt` attempts have been made.
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Full jitter: uniform in `[0, backoff_ceiling(attempt)]`.
    pub fn jittered_delay(&self, attempt: u32, rng: &mut impl Rng) -> Duration {
        let ceiling = self.backoff_ceiling(attempt);
        if ceiling.is_zero() {
            return Duration::ZERO;
        }
        let ceiling_nanos = u64::try_from(ceiling.as_nanos()).unwrap_or(u64::MAX);
        Duration::from_nanos(rng.random_range(0..=ceiling_nanos))
    }
}

pub struct Retrying<X> {
    pub inner: X,
    pub policy: RetryPolicy,
}

impl<X> Retrying<X> {
    pub fn new(inner: X, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<X: Transport> Transport for Retrying<X> {
    async fn execute(&self, req: HttpRequest) -> Result<HttpResponse, TransportError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let outcome = self.inner.execute(req.clone()).await;
            let retryable = match &outcome {
                Ok(response) => is_retryable_status(response.status),
                Err(_) => true,
            };
            if !retryable || attempt >= max_attempts {
                return outcome;
            }

            let delay = self.policy.jittered_delay(attempt, &mut rand::rng());
            match &outcome {
                Ok(response) => warn!(
                    url = %req.url,
                    status = response.status,
                    attempt,
                    ?delay,
                    "retrying request"
                ),
                Err(err) => warn!(url = %req.url, error = %err, attempt, ?delay, "retrying request"),
            }
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
