//! Opt-in retry around search and bulk capabilities.
//!
//! The export and bulk drivers never retry. Wrapping a capability in
//! [`Retrying`] adds retries for transient errors without changing the
//! drivers' failure semantics.
//!
//! Retrying a bulk request re-submits every operation in it. Use it with
//! idempotent operations (index with explicit IDs, delete) or with
//! `ignore_version_conflicts` for creates.

use crate::{
    bulk::{BulkOperation, BulkResponse},
    capability::{BulkCapability, SearchCapability},
    config::Refresh,
    error::{OpenSearchError, Result},
    search::{PageRequest, SearchPage},
};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    /// Backoff strategy.
    pub backoff: BackoffStrategy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffStrategy::Exponential {
                initial: Duration::from_millis(100),
                max: Duration::from_secs(10),
                multiplier: 2.0,
            },
        }
    }
}

impl RetryConfig {
    /// Create a retry config with exponential backoff.
    pub fn exponential(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: BackoffStrategy::Exponential {
                initial: initial_delay,
                max: Duration::from_secs(30),
                multiplier: 2.0,
            },
        }
    }

    /// Create a retry config with linear backoff.
    pub fn linear(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: BackoffStrategy::Linear {
                delay,
                max: Duration::from_secs(30),
            },
        }
    }

    /// Create a retry config with constant delay.
    pub fn constant(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: BackoffStrategy::Constant(delay),
        }
    }

    /// Create a retry config with no delay.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: BackoffStrategy::None,
        }
    }

    /// Calculate delay for a given attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay_for_attempt(attempt)
    }
}

/// Backoff strategy for retries.
#[derive(Debug, Clone)]
pub enum BackoffStrategy {
    /// No delay between retries.
    None,
    /// Constant delay between retries.
    Constant(Duration),
    /// Linear backoff: delay increases by a fixed amount.
    Linear {
        /// Delay increment per attempt.
        delay: Duration,
        /// Maximum delay.
        max: Duration,
    },
    /// Exponential backoff: delay doubles each attempt.
    Exponential {
        /// Initial delay.
        initial: Duration,
        /// Maximum delay.
        max: Duration,
        /// Multiplier (typically 2.0).
        multiplier: f64,
    },
}

impl BackoffStrategy {
    /// Calculate delay for a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Constant(d) => *d,
            Self::Linear { delay, max } => delay.saturating_mul(attempt + 1).min(*max),
            Self::Exponential { initial, max, multiplier } => {
                let factor = multiplier.powi(attempt as i32);
                let millis = (initial.as_millis() as f64 * factor) as u64;
                Duration::from_millis(millis).min(*max)
            }
        }
    }
}

/// A capability that retries retryable errors of the wrapped one.
#[derive(Debug, Clone)]
pub struct Retrying<C> {
    inner: C,
    config: RetryConfig,
}

impl<C> Retrying<C> {
    /// Wrap `inner` with the given retry policy.
    pub fn new(inner: C, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// The wrapped capability.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    async fn attempt<T, Fut>(&self, what: &str, mut call: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let err = match call().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }

            attempt += 1;
            if attempt >= max_attempts {
                return Err(OpenSearchError::RetryExhausted {
                    attempts: attempt,
                    message: err.to_string(),
                });
            }

            let delay = self.config.delay_for_attempt(attempt - 1);
            warn!(what, attempt, ?delay, error = %err, "Retrying OpenSearch request");
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl<C: SearchCapability> SearchCapability for Retrying<C> {
    async fn search(&self, request: &PageRequest) -> Result<SearchPage> {
        self.attempt("search", || self.inner.search(request)).await
    }
}

#[async_trait]
impl<C: BulkCapability> BulkCapability for Retrying<C> {
    async fn bulk(&self, operations: &[BulkOperation], refresh: Refresh) -> Result<BulkResponse> {
        self.attempt("bulk", || self.inner.bulk(operations, refresh)).await
    }
}
