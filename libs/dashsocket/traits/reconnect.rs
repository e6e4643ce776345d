use std::time::Duration;

/// Delay policy between reconnects
///
/// The connection manager owns the attempt counter; a strategy only maps an
/// attempt index to a wait.
pub trait ReconnectionStrategy: Send + Sync {
    /// Wait before reconnect number `attempt + 1`
    ///
    /// `attempt` counts reconnects scheduled since the last successful open.
    /// `None` means the budget is spent and the manager gives up.
    fn next_delay(&self, attempt: usize) -> Option<Duration>;

    /// Whether `attempt` is still within budget
    fn should_reconnect(&self, attempt: usize) -> bool;

    /// Maximum number of attempts, if bounded
    fn max_attempts(&self) -> Option<usize>;
}

/// Linear backoff, the dashboard default
///
/// Delays grow by one base step per attempt: base, 2×base, 3×base, ...
/// With the defaults (1s base, 5 attempts) that is 1s, 2s, 3s, 4s, 5s.
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    base_delay: Duration,
    max_attempts: usize,
}

impl LinearBackoff {
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);
    pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

    pub fn new(base_delay: Duration, max_attempts: usize) -> Self {
        Self {
            base_delay,
            max_attempts,
        }
    }
}

impl Default for LinearBackoff {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE_DELAY, Self::DEFAULT_MAX_ATTEMPTS)
    }
}

impl ReconnectionStrategy for LinearBackoff {
    fn next_delay(&self, attempt: usize) -> Option<Duration> {
        if !self.should_reconnect(attempt) {
            return None;
        }
        let step = u32::try_from(attempt + 1).unwrap_or(u32::MAX);
        Some(self.base_delay.saturating_mul(step))
    }

    fn should_reconnect(&self, attempt: usize) -> bool {
        attempt < self.max_attempts
    }

    fn max_attempts(&self) -> Option<usize> {
        Some(self.max_attempts)
    }
}

/// Doubling backoff: `initial_delay × 2^attempt`, never above `max_delay`
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    max_delay: Duration,
    max_attempts: Option<usize>,
}

impl ExponentialBackoff {
    /// `max_attempts: None` retries forever
    pub fn new(initial_delay: Duration, max_delay: Duration, max_attempts: Option<usize>) -> Self {
        Self {
            initial_delay,
            max_delay,
            max_attempts,
        }
    }
}

impl ReconnectionStrategy for ExponentialBackoff {
    fn next_delay(&self, attempt: usize) -> Option<Duration> {
        if !self.should_reconnect(attempt) {
            return None;
        }

        let factor = u32::try_from(attempt)
            .ok()
            .and_then(|exp| 2u32.checked_pow(exp))
            .unwrap_or(u32::MAX);
        Some(self.initial_delay.saturating_mul(factor).min(self.max_delay))
    }

    fn should_reconnect(&self, attempt: usize) -> bool {
        !matches!(self.max_attempts, Some(max) if attempt >= max)
    }

    fn max_attempts(&self) -> Option<usize> {
        self.max_attempts
    }
}

/// Constant wait between reconnects
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
    max_attempts: Option<usize>,
}

impl FixedDelay {
    pub fn new(delay: Duration, max_attempts: Option<usize>) -> Self {
        FixedDelay {
            delay,
            max_attempts,
        }
    }
}

impl ReconnectionStrategy for FixedDelay {
    fn next_delay(&self, attempt: usize) -> Option<Duration> {
        if !self.should_reconnect(attempt) {
            return None;
        }
        Some(self.delay)
    }

    fn should_reconnect(&self, attempt: usize) -> bool {
        !matches!(self.max_attempts, Some(max) if attempt >= max)
    }

    fn max_attempts(&self) -> Option<usize> {
        self.max_attempts
    }
}
