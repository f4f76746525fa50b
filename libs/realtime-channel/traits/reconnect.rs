use std::time::Duration;

/// Default delay between automatic reconnect attempts
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(5000);

/// Default ceiling on consecutive automatic reconnect attempts
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: usize = 5;

/// Trait for defining reconnection strategies
///
/// Consulted only after an unintended close. The attempt counter it receives
/// counts automatic attempts since the last successful open.
pub trait ReconnectionStrategy: Send + Sync {
    /// Get the delay before the next reconnection attempt
    ///
    /// # Arguments
    /// * `attempt` - Attempts already made since the last successful open
    ///
    /// # Returns
    /// * `Some(duration)` - Wait this long before reconnecting
    /// * `None` - Stop reconnecting
    fn next_delay(&self, attempt: usize) -> Option<Duration>;

    /// Check if we should continue reconnecting
    fn should_reconnect(&self, attempt: usize) -> bool;

    /// Maximum number of automatic attempts, if bounded
    fn max_attempts(&self) -> Option<usize>;
}

/// Fixed delay reconnection strategy
///
/// Always waits the same amount of time between reconnection attempts
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
    max_attempts: Option<usize>,
}

impl FixedDelay {
    /// Create a new fixed delay strategy
    ///
    /// # Arguments
    /// * `delay` - The fixed delay between reconnects
    /// * `max_attempts` - Maximum number of attempts (None = unlimited)
    pub fn new(delay: Duration, max_attempts: Option<usize>) -> Self {
        Self { delay, max_attempts }
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(
            DEFAULT_RECONNECT_INTERVAL,
            Some(DEFAULT_MAX_RECONNECT_ATTEMPTS),
        )
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
        self.max_attempts.map_or(true, |max| attempt < max)
    }

    fn max_attempts(&self) -> Option<usize> {
        self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_five_attempts_every_five_seconds() {
        let strategy = FixedDelay::default();
        for attempt in 0..5 {
            assert_eq!(strategy.next_delay(attempt), Some(Duration::from_millis(5000)));
        }
        assert_eq!(strategy.next_delay(5), None);
        assert_eq!(strategy.max_attempts(), Some(5));
    }

    #[test]
    fn test_zero_attempts_never_reconnects() {
        let strategy = FixedDelay::new(Duration::from_millis(10), Some(0));
        assert!(!strategy.should_reconnect(0));
        assert!(strategy.next_delay(0).is_none());
    }
}
