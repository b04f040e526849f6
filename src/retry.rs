use std::future::Future;

use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Bounded exponential backoff settings.
///
/// `max_attempts` counts every submission, including the first one.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_factor: f64,
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Multiply each delay by a random factor in `[1, 2)` before capping.
    pub randomize: bool,
}

impl RetryPolicy {
    /// Policy for individual log writes: a handful of quick attempts.
    pub fn fast_fail() -> Self {
        RetryPolicy {
            max_attempts: 4,
            backoff_factor: 3.0,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(1),
            randomize: false,
        }
    }

    /// Policy for the startup probe, where the cluster may still be booting.
    pub fn patient_startup() -> Self {
        RetryPolicy {
            max_attempts: 11,
            backoff_factor: 3.0,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            randomize: false,
        }
    }

    /// Delay to wait after the `failed_attempt`-th failure (1-based).
    pub fn delay_for(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let mut secs = self.min_delay.as_secs_f64() * self.backoff_factor.max(1.0).powi(exponent);
        if self.randomize {
            secs *= 1.0 + fastrand::f64();
        }

        let max = self.max_delay.as_secs_f64();
        if !secs.is_finite() || secs > max {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::fast_fail()
    }
}

/// Progress of a [`RetryOperation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Idle,
    Attempting(u32),
    Succeeded,
    Exhausted,
}

/// Returned when every attempt allowed by the policy failed.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: u32,
    /// Cause reported by the final attempt.
    pub last_error: E,
}

/// Drives one logical operation through the attempts allowed by a policy.
///
/// Attempts never overlap: attempt `n + 1` starts only after attempt `n`
/// failed and its backoff delay elapsed.
#[derive(Debug)]
pub struct RetryOperation<'p> {
    policy: &'p RetryPolicy,
    label: &'static str,
    state: RetryState,
}

impl<'p> RetryOperation<'p> {
    pub fn new(policy: &'p RetryPolicy, label: &'static str) -> Self {
        RetryOperation {
            policy,
            label,
            state: RetryState::Idle,
        }
    }

    pub fn state(&self) -> RetryState {
        self.state
    }

    /// Run `attempt` until it succeeds or the attempt budget is spent.
    ///
    /// `attempt` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&mut self, mut attempt: F) -> Result<T, Exhausted<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut n = 1;

        loop {
            self.state = RetryState::Attempting(n);

            match attempt(n).await {
                Ok(value) => {
                    self.state = RetryState::Succeeded;
                    return Ok(value);
                }
                Err(err) if n >= max_attempts => {
                    debug!(op = self.label, attempt = n, error = %err, "final attempt failed");
                    self.state = RetryState::Exhausted;
                    return Err(Exhausted {
                        attempts: n,
                        last_error: err,
                    });
                }
                Err(err) => {
                    let delay = self.policy.delay_for(n);
                    warn!(op = self.label, attempt = n, ?delay, error = %err, "attempt failed, retrying");
                    sleep(delay).await;
                    n += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn quick(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff_factor: 2.0,
            min_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
            randomize: false,
        }
    }

    #[test]
    fn delays_grow_then_cap() {
        let policy = quick(10);
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(300));
        assert_eq!(policy.delay_for(30), Duration::from_millis(300));
    }

    #[test]
    fn huge_attempt_numbers_stay_capped() {
        let policy = quick(10);
        assert_eq!(policy.delay_for(i32::MAX as u32 + 2), Duration::from_millis(300));
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_millis(300));
    }

    #[test]
    fn named_policies_match_expected_budgets() {
        let write = RetryPolicy::fast_fail();
        assert_eq!(write.max_attempts, 4);
        assert_eq!(write.delay_for(1), Duration::from_millis(500));
        assert_eq!(write.delay_for(2), Duration::from_secs(1));

        let startup = RetryPolicy::patient_startup();
        assert_eq!(startup.max_attempts, 11);
        assert_eq!(startup.delay_for(1), Duration::from_secs(1));
        assert_eq!(startup.delay_for(4), Duration::from_secs(27));
        assert_eq!(startup.delay_for(5), Duration::from_secs(60));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = RetryPolicy {
            randomize: true,
            max_delay: Duration::from_secs(10),
            ..quick(5)
        };
        for _ in 0..100 {
            let d = policy.delay_for(1);
            assert!(d >= Duration::from_millis(100) && d < Duration::from_millis(200));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let policy = quick(5);
        let calls = AtomicU32::new(0);
        let mut op = RetryOperation::new(&policy, "test");

        let result: Result<u32, Exhausted<String>> = op
            .run(|n| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 3 {
                        Err(format!("boom {n}"))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(op.state(), RetryState::Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_max_attempts() {
        let policy = quick(4);
        let start = Instant::now();
        let mut op = RetryOperation::new(&policy, "test");

        let result: Result<(), Exhausted<&str>> = op.run(|_| async { Err("down") }).await;

        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 4);
        assert_eq!(exhausted.last_error, "down");
        assert_eq!(op.state(), RetryState::Exhausted);
        // 100 + 200 + 300 ms of backoff between the four attempts.
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(600) && waited < Duration::from_millis(610));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempt_budget_still_tries_once() {
        let policy = quick(0);
        let mut op = RetryOperation::new(&policy, "test");

        let result: Result<(), Exhausted<&str>> = op.run(|_| async { Err("nope") }).await;

        assert_eq!(result.unwrap_err().attempts, 1);
    }
}
