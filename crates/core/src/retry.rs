//! Fixed-interval retry policy used for the database readiness wait.

use std::future::Future;
use std::time::Duration;

/// Default number of readiness attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Default spacing between attempts.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Result of running a probe under a [`RetryPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// The probe succeeded on attempt `attempts` (1-based).
    Ready { attempts: u32 },
    /// Every attempt failed.
    Exhausted { attempts: u32 },
}

impl RetryOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// Call a probe up to `max_attempts` times, sleeping `interval` between
/// failed attempts. No sleep follows the last attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    /// Run `probe` until it returns `true` or the attempt budget is spent.
    pub async fn run<F, Fut>(&self, mut probe: F) -> RetryOutcome
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = bool>,
    {
        let max_attempts = self.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            if probe(attempt).await {
                return RetryOutcome::Ready { attempts: attempt };
            }
            tracing::debug!(attempt, max_attempts, "Probe not ready");
            if attempt < max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }
        RetryOutcome::Exhausted {
            attempts: max_attempts,
        }
    }
}
