//! Retry-with-backoff for upstream calls, expressed as an explicit state machine.
//!
//! A fetch starts in `Attempting`. Each attempt's outcome moves the machine to
//! `Succeeded`, to `Failed` (non-retryable response, or retries exhausted), or
//! to `Backoff`, from which `resume` starts the next attempt. The delay starts
//! at the policy's initial backoff and doubles after every retry. No delay is
//! taken after the final attempt.

use crate::error::ApiError;
use configuration::ProviderConfig;
use std::future::Future;
use std::time::Duration;

/// How many times to try and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(2))
    }
}

impl From<&ProviderConfig> for RetryPolicy {
    fn from(config: &ProviderConfig) -> Self {
        Self::new(config.max_attempts, config.initial_backoff())
    }
}

/// The result of a single attempt, as classified by the caller.
#[derive(Debug)]
pub enum Attempt<T> {
    Success(T),
    /// A transient failure (`RateLimited` or `Network`); eligible for retry.
    Retry(ApiError),
    /// A permanent failure; returned to the caller as-is.
    Fail(ApiError),
}

impl<T> Attempt<T> {
    /// Classifies a failed attempt by [`ApiError::is_retryable`].
    pub fn failed(error: ApiError) -> Self {
        if error.is_retryable() {
            Attempt::Retry(error)
        } else {
            Attempt::Fail(error)
        }
    }
}

#[derive(Debug)]
pub enum RetryState {
    Attempting { attempt: u32 },
    Backoff { attempt: u32, delay: Duration, cause: ApiError },
    Succeeded { attempt: u32 },
    Failed(ApiError),
}

/// Drives `RetryState` transitions for one fetch.
#[derive(Debug)]
pub struct RetryMachine {
    policy: RetryPolicy,
    next_delay: Duration,
    state: RetryState,
}

impl RetryMachine {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            next_delay: policy.initial_backoff,
            policy,
            state: RetryState::Attempting { attempt: 1 },
        }
    }

    pub fn state(&self) -> &RetryState {
        &self.state
    }

    /// Records a permanent failure.
    pub fn fail(&mut self, error: ApiError) {
        if matches!(self.state, RetryState::Attempting { .. }) {
            self.state = RetryState::Failed(error);
        }
    }

    /// Records a transient failure: either schedules a backoff or, when the
    /// attempt budget is spent, fails with `UpstreamExhausted`.
    pub fn retry(&mut self, cause: ApiError) {
        let attempt = match self.state {
            RetryState::Attempting { attempt } => attempt,
            _ => return,
        };
        self.state = if attempt >= self.policy.max_attempts {
            RetryState::Failed(ApiError::UpstreamExhausted {
                attempts: attempt,
                last: Box::new(cause),
            })
        } else {
            let delay = self.next_delay;
            self.next_delay = self.next_delay.saturating_mul(2);
            RetryState::Backoff {
                attempt,
                delay,
                cause,
            }
        };
    }

    /// Leaves `Backoff` and starts the next attempt.
    pub fn resume(&mut self) {
        if let RetryState::Backoff { attempt, .. } = self.state {
            self.state = RetryState::Attempting {
                attempt: attempt + 1,
            };
        }
    }

    /// Marks the current attempt as successful.
    pub fn succeed(&mut self) {
        if let RetryState::Attempting { attempt } = self.state {
            self.state = RetryState::Succeeded { attempt };
        }
    }

    /// Consumes the machine, yielding the terminal error if it failed.
    pub fn into_error(self) -> Option<ApiError> {
        match self.state {
            RetryState::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Runs `attempt_fn` until it succeeds, fails permanently, or the policy's
/// attempt budget is spent. `sleep` is awaited for every backoff delay.
pub async fn run_with_retry<T, F, Fut, S, SFut>(
    policy: RetryPolicy,
    mut attempt_fn: F,
    mut sleep: S,
) -> Result<T, ApiError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt<T>>,
    S: FnMut(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    let mut machine = RetryMachine::new(policy);
    loop {
        match machine.state() {
            RetryState::Attempting { attempt } => match attempt_fn(*attempt).await {
                Attempt::Success(value) => {
                    machine.succeed();
                    return Ok(value);
                }
                Attempt::Retry(cause) => machine.retry(cause),
                Attempt::Fail(error) => machine.fail(error),
            },
            RetryState::Backoff {
                attempt,
                delay,
                cause,
            } => {
                tracing::warn!(
                    attempt = *attempt,
                    max_attempts = policy.max_attempts,
                    delay = ?delay,
                    cause = %cause,
                    "Upstream attempt failed, retrying after backoff."
                );
                sleep(*delay).await;
                machine.resume();
            }
            RetryState::Succeeded { .. } | RetryState::Failed(_) => break,
        }
    }
    Err(machine
        .into_error()
        .unwrap_or_else(|| ApiError::InvalidData("retry loop ended without a result".to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Scripted upstream: each entry is what one attempt observes.
    enum Scripted {
        Ok(&'static str),
        Status(u16),
        Timeout,
    }

    fn classify(step: Scripted) -> Attempt<&'static str> {
        match step {
            Scripted::Ok(body) => Attempt::Success(body),
            Scripted::Status(429) => Attempt::failed(ApiError::RateLimited),
            Scripted::Status(status) => Attempt::failed(ApiError::Upstream { status }),
            Scripted::Timeout => Attempt::failed(ApiError::Network("timed out".to_string())),
        }
    }

    /// Runs the retry loop against a script, returning the result, the number
    /// of attempts made and every delay that was slept.
    async fn run_script(
        script: Vec<Scripted>,
    ) -> (Result<&'static str, ApiError>, u32, Vec<Duration>) {
        let script = RefCell::new(VecDeque::from(script));
        let attempts = RefCell::new(0u32);
        let delays = RefCell::new(Vec::new());
        let result = run_with_retry(
            RetryPolicy::default(),
            |_| {
                *attempts.borrow_mut() += 1;
                let step = script
                    .borrow_mut()
                    .pop_front()
                    .expect("script ran out of responses");
                async move { classify(step) }
            },
            |delay| {
                delays.borrow_mut().push(delay);
                async {}
            },
        )
        .await;
        (result, attempts.into_inner(), delays.into_inner())
    }

    #[tokio::test]
    async fn succeeds_after_two_rate_limits() {
        let (result, attempts, delays) = run_script(vec![
            Scripted::Status(429),
            Scripted::Status(429),
            Scripted::Ok("payload"),
        ])
        .await;

        assert_eq!(result.unwrap(), "payload");
        assert_eq!(attempts, 3);
        assert_eq!(delays, vec![Duration::from_secs(2), Duration::from_secs(4)]);
    }

    #[tokio::test]
    async fn other_status_fails_without_retry() {
        let (result, attempts, delays) = run_script(vec![Scripted::Status(500)]).await;

        assert!(matches!(result, Err(ApiError::Upstream { status: 500 })));
        assert_eq!(attempts, 1);
        assert!(delays.is_empty());
    }

    #[tokio::test]
    async fn five_timeouts_exhaust_the_budget() {
        let (result, attempts, delays) = run_script(vec![
            Scripted::Timeout,
            Scripted::Timeout,
            Scripted::Timeout,
            Scripted::Timeout,
            Scripted::Timeout,
        ])
        .await;

        match result {
            Err(ApiError::UpstreamExhausted { attempts, last }) => {
                assert_eq!(attempts, 5);
                assert!(matches!(*last, ApiError::Network(_)));
            }
            other => panic!("expected UpstreamExhausted, got {other:?}"),
        }
        assert_eq!(attempts, 5);
        let total: Duration = delays.iter().sum();
        assert_eq!(delays.len(), 4);
        assert_eq!(total, Duration::from_secs(2 + 4 + 8 + 16));
    }

    #[test]
    fn failures_are_classified_by_retryability() {
        for transient in [ApiError::RateLimited, ApiError::Network("reset".to_string())] {
            assert!(matches!(Attempt::<()>::failed(transient), Attempt::Retry(_)));
        }
        for permanent in [
            ApiError::Upstream { status: 404 },
            ApiError::Deserialization("bad json".to_string()),
            ApiError::EmptyData,
        ] {
            assert!(matches!(Attempt::<()>::failed(permanent), Attempt::Fail(_)));
        }
    }

    #[test]
    fn machine_walks_through_backoff_states() {
        let mut machine = RetryMachine::new(RetryPolicy::new(2, Duration::from_millis(10)));
        assert!(matches!(machine.state(), RetryState::Attempting { attempt: 1 }));

        machine.retry(ApiError::RateLimited);
        match machine.state() {
            RetryState::Backoff { attempt, delay, .. } => {
                assert_eq!(*attempt, 1);
                assert_eq!(*delay, Duration::from_millis(10));
            }
            other => panic!("unexpected state {other:?}"),
        }

        machine.resume();
        assert!(matches!(machine.state(), RetryState::Attempting { attempt: 2 }));

        machine.retry(ApiError::RateLimited);
        assert!(matches!(
            machine.into_error(),
            Some(ApiError::UpstreamExhausted { attempts: 2, .. })
        ));
    }

    #[test]
    fn zero_attempt_policy_still_tries_once() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }
}
