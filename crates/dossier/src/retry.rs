//! Retry policy for transient GitHub failures.
//!
//! Transient means a connection failure, a timeout, or a 5xx response. The
//! policy is plain exponential backoff: 1s, 2s, 4s, … up to `max_retries`
//! extra attempts. Rate-limit rejections are not handled here; the client
//! sleeps until the quota resets instead.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

/// Delay before the first retry.
pub const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
/// Upper bound for a single backoff delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);
/// Extra attempts after the first failure.
pub const DEFAULT_MAX_RETRIES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Number of retries after the initial attempt.
    pub max_retries: usize,
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: INITIAL_BACKOFF,
            max_delay: MAX_BACKOFF,
            max_retries: DEFAULT_MAX_RETRIES,
            with_jitter: false,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn new(min_delay: Duration, max_delay: Duration, max_retries: usize) -> Self {
        Self {
            min_delay,
            max_delay,
            max_retries,
            with_jitter: false,
        }
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// A policy that never retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default().with_max_retries(0)
    }

    /// Build the backon strategy for this configuration.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let mut builder = ExponentialBuilder::default()
            .with_factor(2.0)
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries);

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder
    }
}

#[must_use]
pub fn default_backoff() -> ExponentialBuilder {
    RetryConfig::default().into_backoff()
}

/// Run `operation`, retrying while `is_transient` holds.
///
/// `notify` is called before each sleep with the error, the delay and the
/// number of the attempt that just failed (1-based). The last error is
/// returned once the retry budget is spent.
pub async fn with_retry<T, E, F, Fut, IsTransient, Notify>(
    mut operation: F,
    config: &RetryConfig,
    is_transient: IsTransient,
    notify: Notify,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    IsTransient: FnMut(&E) -> bool,
    Notify: Fn(&E, Duration, u32),
{
    let attempt = AtomicU32::new(0);

    let op = || {
        attempt.fetch_add(1, Ordering::SeqCst);
        operation()
    };

    op.retry(config.clone().into_backoff())
        .notify(|err, dur| notify(err, dur, attempt.load(Ordering::SeqCst)))
        .when(is_transient)
        .await
}
