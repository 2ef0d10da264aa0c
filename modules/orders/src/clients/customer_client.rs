//! HTTP client for the customer service
//!
//! Performs the synchronous customer precondition lookup with bounded
//! retries. Transient transport failures (timeout, connection failure) are
//! retried with exponential backoff and jitter; API-level failures such as a
//! 404 are terminal and consume a single attempt. Retries exhaust silently
//! into an `Err` — nothing is thrown past this component.

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Customer representation returned by the remote service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub customer_name: String,
    pub address: String,
    pub orders_count: i32,
}

/// Errors surfaced by the customer lookup
#[derive(Debug, Error)]
pub enum CustomerClientError {
    #[error("Connection timeout - customer service unavailable")]
    Timeout,

    #[error("Connection failed - customer service unavailable")]
    ConnectionFailed,

    /// Non-2xx response; carries the remote error message when the body had
    /// one, "Unknown error" otherwise.
    #[error("{0}")]
    Api(String),

    #[error("Invalid customer response: {0}")]
    Parse(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl CustomerClientError {
    /// Only transport-level failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::ConnectionFailed)
    }
}

/// Seam for the remote customer lookup, so orchestration code can be
/// exercised with test doubles instead of a live HTTP dependency.
#[async_trait]
pub trait CustomerLookup: Send + Sync {
    async fn fetch_customer(&self, customer_id: i64) -> Result<CustomerInfo, CustomerClientError>;
}

/// Retry configuration for transient lookup failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Backoff before the second attempt (doubles each retry)
    pub initial_backoff: Duration,
    /// Jitter fraction applied to each computed interval (0.5 = ±50%)
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            jitter: 0.5,
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (1-based over completed
    /// attempts): initial × 2^(attempt-1), randomized by the jitter fraction
    /// to spread concurrent retriers apart.
    fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.initial_backoff.as_millis() as f64
            * 2f64.powi(attempt.saturating_sub(1) as i32);
        let factor = rand::thread_rng().gen_range(1.0 - self.jitter..=1.0 + self.jitter);
        Duration::from_millis((base_ms * factor) as u64)
    }
}

/// Reqwest-backed customer lookup client
#[derive(Debug, Clone)]
pub struct HttpCustomerClient {
    base_url: String,
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpCustomerClient {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Create a client with the default retry policy.
    ///
    /// `timeout` bounds both connection establishment and the overall
    /// request.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CustomerClientError> {
        Self::with_retry_policy(base_url, timeout, RetryPolicy::default())
    }

    pub fn with_retry_policy(
        base_url: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, CustomerClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| CustomerClientError::Unexpected(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into(),
            http,
            retry,
        })
    }

    async fn try_fetch(&self, customer_id: i64) -> Result<CustomerInfo, CustomerClientError> {
        let url = format!("{}/api/v1/customers/{}", self.base_url, customer_id);

        let response = self.http.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                CustomerClientError::Timeout
            } else if e.is_connect() {
                CustomerClientError::ConnectionFailed
            } else {
                CustomerClientError::Unexpected(e.to_string())
            }
        })?;

        if response.status().is_success() {
            response
                .json::<CustomerInfo>()
                .await
                .map_err(|e| CustomerClientError::Parse(e.to_string()))
        } else {
            // Surface the structured error message when the body carries one
            let message = match response.json::<serde_json::Value>().await {
                Ok(body) => body
                    .get("error")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| "Unknown error".to_string()),
                Err(_) => "Unknown error".to_string(),
            };
            Err(CustomerClientError::Api(message))
        }
    }
}

#[async_trait]
impl CustomerLookup for HttpCustomerClient {
    async fn fetch_customer(&self, customer_id: i64) -> Result<CustomerInfo, CustomerClientError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match self.try_fetch(customer_id).await {
                Ok(info) => return Ok(info),
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let backoff = self.retry.backoff_for_attempt(attempt);
                    tracing::warn!(
                        customer_id,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Customer lookup failed, retrying with backoff"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    tracing::error!(
                        customer_id,
                        attempts = attempt,
                        error = %e,
                        "Customer lookup failed"
                    );
                    return Err(e);
                }
            }
        }
    }
}
