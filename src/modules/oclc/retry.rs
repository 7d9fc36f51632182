//! Retry strategy for the OAuth token endpoint.

use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Failure of a single call to the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Endpoint answered with a non-success status
    Status(u16),
    /// Call did not complete within its timeout
    Timeout,
    /// Connection could not be established
    Connect(String),
    /// Any other transport failure
    Network(String),
    /// Body was not the expected token document
    Decode(String),
    /// Client credentials could not be loaded
    Secret(String),
}

impl TransportError {
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_decode() {
            TransportError::Decode(e.to_string())
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Status(code) => write!(f, "token endpoint returned HTTP {}", code),
            TransportError::Timeout => write!(f, "token request timed out"),
            TransportError::Connect(msg) => write!(f, "connection failed: {}", msg),
            TransportError::Network(msg) => write!(f, "network error: {}", msg),
            TransportError::Decode(msg) => write!(f, "invalid token response: {}", msg),
            TransportError::Secret(msg) => write!(f, "credentials unavailable: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

/// How many times to retry, how long to wait before each retry, and which
/// failures are worth retrying at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait before retry `n` is `backoff[n]`; its length is the retry count
    pub backoff: Vec<Duration>,
    pub retryable_statuses: Vec<u16>,
}

impl RetryPolicy {
    /// 3 retries at 1s, 2s, 4s on throttling and gateway errors.
    pub fn token_endpoint() -> Self {
        Self {
            backoff: vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ],
            retryable_statuses: vec![429, 500, 502, 503, 504],
        }
    }

    /// Same retry decisions without waiting between attempts.
    pub fn immediate(retries: usize) -> Self {
        Self {
            backoff: vec![Duration::ZERO; retries],
            ..Self::token_endpoint()
        }
    }

    pub fn max_retries(&self) -> usize {
        self.backoff.len()
    }

    pub fn is_retryable(&self, err: &TransportError) -> bool {
        match err {
            TransportError::Status(code) => self.retryable_statuses.contains(code),
            TransportError::Timeout | TransportError::Connect(_) => true,
            TransportError::Network(_) | TransportError::Decode(_) | TransportError::Secret(_) => {
                false
            }
        }
    }

    /// Delay before the `retry`-th retry (0-based), or `None` once retries
    /// are exhausted.
    pub fn delay_before(&self, retry: usize) -> Option<Duration> {
        self.backoff.get(retry).copied()
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or
    /// the retries run out.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, TransportError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let mut retry = 0;
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !self.is_retryable(&err) {
                return Err(err);
            }
            let Some(delay) = self.delay_before(retry) else {
                return Err(err);
            };

            tracing::warn!(
                "Token request failed ({}), retry {}/{} in {:?}",
                err,
                retry + 1,
                self.max_retries(),
                delay
            );
            tokio::time::sleep(delay).await;
            retry += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::token_endpoint()
    }
}
