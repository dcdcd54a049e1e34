//! Fixed-delay retry policy.
//!
//! The bridge never gives up: a replay that is still being written, or a
//! radar backend that has not started yet, is simply waited for. The delay
//! between attempts is constant and there is no attempt limit.

use std::time::Duration;

/// Constant back-off between retries, with no maximum attempt count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelayRetry {
    delay: Duration,
}

impl FixedDelayRetry {
    /// Create a policy that waits `delay` between attempts.
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Create a policy from a delay in milliseconds.
    pub const fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// The wait applied between attempts.
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Sleep for one back-off interval.
    pub async fn wait(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}
