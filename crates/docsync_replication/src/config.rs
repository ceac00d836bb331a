//! Configuration for the pull processor.

use docsync_core::StagingConfig;
use rand::Rng;
use std::time::Duration;

/// Configuration for pull processing.
#[derive(Debug, Clone)]
pub struct PullConfig {
    /// Where and how attachments are staged.
    pub staging: StagingConfig,
    /// Per-attachment retry behavior.
    pub retry: RetryConfig,
    /// Maximum attachments of one revision staged at the same time.
    pub max_concurrent_attachments: usize,
}

impl PullConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self {
            staging: StagingConfig::default(),
            retry: RetryConfig::default(),
            max_concurrent_attachments: 4,
        }
    }

    /// Sets the staging configuration.
    pub fn with_staging(mut self, staging: StagingConfig) -> Self {
        self.staging = staging;
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the attachment concurrency limit (minimum 1).
    pub fn with_max_concurrent_attachments(mut self, limit: usize) -> Self {
        self.max_concurrent_attachments = limit.max(1);
        self
    }
}

impl Default for PullConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// How often a single attachment is re-fetched after a retryable failure.
///
/// Each attachment of a revision carries its own failure count; the
/// pause before the next attempt doubles with every failure, capped at
/// `max_delay`, with up to 25% random jitter on top.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts per attachment, the first one included.
    pub attempts: u32,
    /// Pause after the first failure.
    pub base_delay: Duration,
    /// Upper bound for the pause before jitter.
    pub max_delay: Duration,
    /// Adds random jitter to each pause.
    pub jitter: bool,
}

impl RetryConfig {
    /// Allows `attempts` tries per attachment.
    pub fn new(attempts: u32) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }

    /// One attempt per attachment.
    pub fn disabled() -> Self {
        Self::new(1).with_base_delay(Duration::ZERO).with_jitter(false)
    }

    /// Sets the pause after the first failure.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the pause cap.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Enables or disables jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Returns the pause before retrying an attachment that has failed
    /// `failures` times, or `None` once it has used all its attempts.
    pub fn backoff(&self, failures: u32) -> Option<Duration> {
        if failures == 0 || failures >= self.attempts {
            return None;
        }
        let doublings = (failures - 1).min(31);
        let delay = self
            .base_delay
            .saturating_mul(1u32 << doublings)
            .min(self.max_delay);
        if self.jitter && !delay.is_zero() {
            let jitter = delay.mul_f64(rand::thread_rng().gen_range(0.0..0.25));
            Some(delay.saturating_add(jitter))
        } else {
            Some(delay)
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}
