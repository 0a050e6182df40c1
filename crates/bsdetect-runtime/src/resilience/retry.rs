//! Retry node with exponential backoff.

use async_trait::async_trait;
use backon::{BackoffBuilder, ExponentialBuilder};
use std::time::Duration;

use bsdetect_core::{ClaimState, StateUpdate};

use crate::config::RetrySettings;
use crate::graph::{expert_for, Node, NodeId, RunContext};

/// Backoff schedule for expert retries.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_delay: settings.base_delay,
            max_delay: settings.max_delay,
        }
    }
}

impl RetryPolicy {
    fn backoff(&self, times: usize) -> impl Iterator<Item = Duration> {
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_max_delay(self.max_delay)
            .with_factor(2.0)
            .with_max_times(times)
            .build()
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`,
    /// capped at `max_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let retry = retry.max(1) as usize;
        self.backoff(retry).nth(retry - 1).unwrap_or(self.max_delay)
    }

    /// The full schedule, one delay per allowed retry.
    pub fn delays(&self) -> Vec<Duration> {
        self.backoff(self.max_retries as usize).collect()
    }
}

/// Waits between attempts. Swappable so tests do not sleep.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSleeper;

#[async_trait]
impl Sleeper for NoopSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// Bumps `retry_count`, backs off, then hands control back to the same expert.
pub struct RetryNode {
    policy: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
}

impl RetryNode {
    pub fn new(policy: RetryPolicy, sleeper: Box<dyn Sleeper>) -> Self {
        Self { policy, sleeper }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl Node for RetryNode {
    fn id(&self) -> NodeId {
        NodeId::Retry
    }

    async fn run(&self, state: &ClaimState, ctx: &mut RunContext) -> StateUpdate {
        let retry = state.retry_count + 1;
        let delay = self.policy.delay_for(retry);

        tracing::info!(
            retry,
            max_retries = state.max_retries,
            delay = %humantime::format_duration(delay),
            error = state.error.as_deref().unwrap_or(""),
            "Retrying expert"
        );

        ctx.retry_delays.push(delay);
        self.sleeper.sleep(delay).await;

        StateUpdate::retry(retry)
    }

    fn next(&self, state: &ClaimState) -> NodeId {
        expert_for(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsdetect_core::Category;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        }
    }

    #[test]
    fn test_doubling_schedule() {
        assert_eq!(
            policy(3).delays(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
        assert_eq!(policy(3).delay_for(2), Duration::from_secs(2));
    }

    #[test]
    fn test_delay_is_capped() {
        assert_eq!(policy(6).delay_for(6), Duration::from_secs(8));
    }

    #[test]
    fn test_zero_retries_has_no_delays() {
        assert!(policy(0).delays().is_empty());
    }

    #[tokio::test]
    async fn test_retry_node_bumps_count() {
        let node = RetryNode::new(policy(3), Box::new(NoopSleeper));
        let mut state = ClaimState::new("claim", 3);
        state.apply(StateUpdate::category(Category::Historical));
        state.apply(StateUpdate::retry(1));

        let mut ctx = RunContext::default();
        let update = node.run(&state, &mut ctx).await;
        assert_eq!(update, StateUpdate::retry(2));
        assert_eq!(ctx.retry_delays, vec![Duration::from_secs(2)]);

        state.apply(update);
        assert_eq!(node.next(&state), NodeId::Expert(Category::Historical));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_sleeper_waits() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_secs(4)).await;
        assert!(start.elapsed() >= Duration::from_secs(4));
    }
}
