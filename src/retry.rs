//! Reconnection delay policy

use std::time::Duration;

/// How the delay grows between reconnection attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay every time
    Fixed,
    /// Delay doubles each attempt up to `max_delay`
    Exponential,
}

/// Delay schedule for reconnecting the telemetry stream.
///
/// Attempts are counted from 1 since the last successful open. When
/// `max_attempts` is exhausted [`RetryPolicy::delay_for`] returns `None` and the
/// connection gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff: Backoff,
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Constant delay with no attempt ceiling
    pub fn fixed(delay: Duration) -> Self {
        Self { initial_delay: delay, max_delay: delay, backoff: Backoff::Fixed, max_attempts: None }
    }

    /// Doubling delay capped at `max_delay`, giving up after `max_attempts`
    pub fn exponential(initial_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            initial_delay,
            max_delay,
            backoff: Backoff::Exponential,
            max_attempts: Some(max_attempts),
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay before reconnection attempt `attempt` (1-based), or `None` to give up.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 {
            return Some(Duration::ZERO);
        }
        if self.max_attempts.is_some_and(|max| attempt > max) {
            return None;
        }

        let delay = match self.backoff {
            Backoff::Fixed => self.initial_delay,
            Backoff::Exponential => {
                let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
                self.initial_delay.saturating_mul(factor)
            }
        };
        Some(delay.min(self.max_delay))
    }
}

impl Default for RetryPolicy {
    /// 2s, 4s, 8s, ... capped at 30s, at most 10 attempts
    fn default() -> Self {
        RetryPolicy::exponential(Duration::from_secs(2), Duration::from_secs(30), 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fixed_policy_never_gives_up() {
        let policy = RetryPolicy::fixed(Duration::from_secs(2));
        assert_eq!(policy.delay_for(1), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_for(10_000), Some(Duration::from_secs(2)));
    }

    #[test]
    fn default_policy_doubles_then_caps() {
        let policy = RetryPolicy::default();
        let delays: Vec<_> = (1..=6).map(|n| policy.delay_for(n).unwrap().as_secs()).collect();
        assert_eq!(delays, vec![2, 4, 8, 16, 30, 30]);
        assert_eq!(policy.delay_for(10), Some(Duration::from_secs(30)));
        assert_eq!(policy.delay_for(11), None);
    }

    proptest! {
        #[test]
        fn delays_are_bounded_and_non_decreasing(attempt in 1u32..200) {
            let policy = RetryPolicy::default().with_max_attempts(None);
            let current = policy.delay_for(attempt).unwrap();
            let next = policy.delay_for(attempt + 1).unwrap();
            prop_assert!(current <= policy.max_delay);
            prop_assert!(current <= next);
        }
    }
}
