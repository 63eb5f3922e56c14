use crate::config::RemoteConfig;
use crate::error::RemoteError;
use crate::session::Operation;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Capped exponential backoff with jitter, bounded by an overall deadline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub attempt_timeout: Duration,
    pub deadline: Duration,
}

/// Outcome of a failed attempt
#[derive(Debug)]
pub enum AttemptError {
    /// Transient: connection refused, server 5xx, dropped body
    Retryable(String),
    /// Final: no point trying again
    Fatal(RemoteError),
}

impl RetryPolicy {
    pub fn from_config(config: &RemoteConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
            attempt_timeout: config.attempt_timeout(),
            deadline: config.deadline(),
        }
    }

    /// Un-jittered delay after the given 1-based attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }

    /// Delay actually slept: the backoff scaled into `[0.5, 1.0]`
    pub fn jittered_backoff(&self, attempt: u32) -> Duration {
        let factor: f64 = rand::thread_rng().gen_range(0.5..=1.0);
        self.backoff(attempt).mul_f64(factor)
    }

    /// Run `attempt_fn` until it succeeds, fails fatally, runs out of
    /// attempts, passes the deadline measured from `started`, or is cancelled.
    pub async fn run<T, F, Fut>(
        &self,
        operation: Operation,
        started: Instant,
        cancel: &CancellationToken,
        mut attempt_fn: F,
    ) -> Result<T, RemoteError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
    {
        let deadline = started + self.deadline;
        let mut last_error = String::from("no attempt made");

        for attempt in 1..=self.max_attempts {
            let now = Instant::now();
            if now >= deadline {
                return Err(self.timed_out(operation, started));
            }
            let budget = self.attempt_timeout.min(deadline - now);

            debug!(
                "{} attempt {}/{} (budget {:?})",
                operation, attempt, self.max_attempts, budget
            );

            let outcome = tokio::select! {
                _ = cancel.cancelled() => return Err(RemoteError::Cancelled { operation }),
                outcome = tokio::time::timeout(budget, attempt_fn(attempt)) => outcome,
            };

            match outcome {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(AttemptError::Fatal(error))) => return Err(error),
                Ok(Err(AttemptError::Retryable(details))) => {
                    warn!("{} attempt {} failed: {}", operation, attempt, details);
                    last_error = details;
                }
                Err(_) => {
                    warn!("{} attempt {} timed out after {:?}", operation, attempt, budget);
                    last_error = format!("no response within {} ms", budget.as_millis());
                    if Instant::now() >= deadline {
                        return Err(self.timed_out(operation, started));
                    }
                }
            }

            if attempt == self.max_attempts {
                break;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            let delay = self.jittered_backoff(attempt).min(remaining);
            debug!("{} retrying in {:?}", operation, delay);

            tokio::select! {
                _ = cancel.cancelled() => return Err(RemoteError::Cancelled { operation }),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        Err(RemoteError::Network {
            operation,
            details: format!(
                "{} (gave up after {} attempts)",
                last_error, self.max_attempts
            ),
        })
    }

    fn timed_out(&self, operation: Operation, started: Instant) -> RemoteError {
        RemoteError::Timeout {
            operation,
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
            attempt_timeout: Duration::from_millis(200),
            deadline: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_millis(3000),
            attempt_timeout: Duration::from_secs(60),
            deadline: Duration::from_secs(180),
        };

        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff(3), Duration::from_millis(2000));
        assert_eq!(policy.backoff(4), Duration::from_millis(3000));
        assert_eq!(policy.backoff(40), Duration::from_millis(3000));

        for _ in 0..50 {
            let delay = policy.jittered_backoff(2);
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1000));
        }
    }

    #[test]
    fn test_policy_from_default_config() {
        let config = crate::config::GoCaptureConfig::default();
        let policy = RetryPolicy::from_config(&config.remote);

        assert_eq!(policy.attempt_timeout, Duration::from_secs(60));
        assert_eq!(policy.max_attempts, 4);
        assert!(policy.deadline >= policy.attempt_timeout);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = fast_policy(3)
            .run(Operation::Score, Instant::now(), &CancellationToken::new(), |attempt| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if attempt < 3 {
                        Err(AttemptError::Retryable("connection refused".to_string()))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<(), _> = fast_policy(2)
            .run(Operation::Upload, Instant::now(), &CancellationToken::new(), |_| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(AttemptError::Retryable("503 Service Unavailable".to_string()))
                }
            })
            .await;

        match result {
            Err(RemoteError::Network { details, operation }) => {
                assert_eq!(operation, Operation::Upload);
                assert!(details.contains("503"));
            }
            other => panic!("expected network error, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fatal_error_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<(), _> = fast_policy(5)
            .run(Operation::Score, Instant::now(), &CancellationToken::new(), |_| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(AttemptError::Fatal(RemoteError::Protocol {
                        operation: Operation::Score,
                        details: "missing `image` field".to_string(),
                    }))
                }
            })
            .await;

        assert!(matches!(result, Err(RemoteError::Protocol { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_deadline_bounds_hanging_attempts() {
        let policy = RetryPolicy {
            max_attempts: 1000,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(1),
            attempt_timeout: Duration::from_millis(50),
            deadline: Duration::from_millis(200),
        };

        let started = Instant::now();
        let result: Result<(), _> = policy
            .run(Operation::Score, started, &CancellationToken::new(), |_| {
                std::future::pending::<Result<(), AttemptError>>()
            })
            .await;

        assert!(matches!(result, Err(RemoteError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_attempt() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result: Result<(), _> = fast_policy(3)
            .run(Operation::Upload, Instant::now(), &cancel, |_| {
                std::future::pending::<Result<(), AttemptError>>()
            })
            .await;

        assert!(matches!(result, Err(RemoteError::Cancelled { operation: Operation::Upload })));
    }
}
