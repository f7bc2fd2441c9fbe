use std::time::Duration;

/// Re-exported so callers don't need their own `exponential-backoff` dependency.
pub use exponential_backoff::Backoff;

/// §7's local-recovery policy: transient I/O gets one retry with jittered
/// backoff, then the error is surfaced as fatal. This trait exists (rather
/// than inlining a counter) so the policy can be swapped in tests without
/// real sleeps.
pub trait Retry {
    /// Resets retry state after a successful operation.
    fn reset(&mut self);

    /// Returns `Some(delay)` to retry after `delay`, or `None` to give up.
    fn next_backoff(&mut self) -> Option<Duration>;
}

/// Retries exactly once, per §5/§7 ("retry-once with exponential backoff
/// before the process exits non-zero").
#[derive(Debug, Clone)]
pub struct RetryOnce {
    error_count: u32,
    backoff: Backoff,
}

impl RetryOnce {
    pub fn new() -> Self {
        let mut backoff = Backoff::new(1, Duration::from_millis(100), Some(Duration::from_secs(5)));
        backoff.set_jitter(0.3);
        Self {
            error_count: 0,
            backoff,
        }
    }
}

impl Default for RetryOnce {
    fn default() -> Self {
        Self::new()
    }
}

impl Retry for RetryOnce {
    fn reset(&mut self) {
        self.error_count = 0;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        self.error_count += 1;
        self.backoff.next(self.error_count)
    }
}
