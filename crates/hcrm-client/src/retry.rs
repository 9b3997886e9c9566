//! Retry policy with exponential backoff and jitter.
//!
//! - Exponential backoff `base * 2^attempt` plus uniform jitter on failures
//! - `Retry-After` honored verbatim on 429, plain backoff otherwise
//! - Sleeping goes through [`Sleeper`] so tests can observe delays without waiting

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::config::env_or;

// =============================================================================
// Configuration
// =============================================================================

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Base delay for exponential backoff (in milliseconds).
    pub base_delay_ms: u64,
    /// Cap applied to the exponential part (in milliseconds).
    pub max_delay_ms: u64,
    /// Upper bound of the random jitter added on failures (in milliseconds).
    pub max_jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 2000,
            max_delay_ms: 60_000,
            max_jitter_ms: 1000,
        }
    }
}

impl RetryConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: env_or("CRM_RETRY_MAX_ATTEMPTS", defaults.max_attempts).max(1),
            base_delay_ms: env_or("CRM_RETRY_BASE_MS", defaults.base_delay_ms),
            max_delay_ms: env_or("CRM_RETRY_MAX_MS", defaults.max_delay_ms),
            max_jitter_ms: env_or("CRM_RETRY_MAX_JITTER_MS", defaults.max_jitter_ms),
        }
    }

    /// Configuration with no waiting at all, for tests and dry runs.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms: 0,
            max_delay_ms: 0,
            max_jitter_ms: 0,
        }
    }

    /// Exponential backoff without jitter: `base * 2^attempt`, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
        let exp = self.base_delay_ms.saturating_mul(factor);
        Duration::from_millis(exp.min(self.max_delay_ms.max(self.base_delay_ms)))
    }

    /// Delay after a failed attempt: backoff plus `0..=max_jitter_ms`.
    pub fn failure_delay(&self, attempt: u32) -> Duration {
        let jitter = if self.max_jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.max_jitter_ms)
        } else {
            0
        };
        self.backoff(attempt) + Duration::from_millis(jitter)
    }

    /// Delay after a 429: the server's `Retry-After` if given, else backoff.
    pub fn rate_limit_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after.unwrap_or_else(|| self.backoff(attempt))
    }
}

/// Parse a delta-seconds `Retry-After` header. HTTP-date values are ignored.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

// =============================================================================
// Sleeping
// =============================================================================

/// Suspends the calling task between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records requested delays and returns immediately.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    pub fn total(&self) -> Duration {
        self.delays().into_iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(duration);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
