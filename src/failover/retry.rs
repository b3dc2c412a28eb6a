//! Bounded retries with randomized exponential backoff
//!
//! Every operation runs through [`Orchestrator::execute`]: transient
//! failures invalidate the active connection, rotate to the next endpoint
//! and retry after a full-jitter backoff; fatal failures return at once.

use std::thread;
use std::time::Duration;

use super::selector::{ConnectionSelector, Unreachable};
use crate::client::Connector;
use crate::utils::{classify, ErrorClass, FailoverError, Result, StoreError};

/// Retry policy constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    /// Backoff ceiling after the first failure; doubles per attempt
    pub multiplier: Duration,
    /// Upper bound for the backoff ceiling
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            multiplier: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Largest possible delay after `attempt` (1-based) failed
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.multiplier
            .saturating_mul(1u32 << exp)
            .min(self.max_delay)
    }

    /// Full jitter: uniform in `[0, backoff_ceiling(attempt)]`
    pub fn backoff(&self, attempt: u32, rng: &mut fastrand::Rng) -> Duration {
        self.backoff_ceiling(attempt).mul_f64(rng.f64())
    }
}

/// Runs operations against the selector's connection under a [`RetryPolicy`]
pub struct Orchestrator<F: Connector> {
    selector: ConnectionSelector<F>,
    policy: RetryPolicy,
    rng: fastrand::Rng,
}

impl<F: Connector> Orchestrator<F> {
    pub fn new(selector: ConnectionSelector<F>, policy: RetryPolicy) -> Self {
        Self {
            selector,
            policy,
            rng: fastrand::Rng::new(),
        }
    }

    /// Execute `operation` with retries and endpoint failover
    ///
    /// Failing to reach any endpoint counts as a transient failure of the
    /// current attempt and shares the same attempt budget.
    pub fn execute<T, Op>(&mut self, mut operation: Op) -> Result<T>
    where
        Op: FnMut(&mut F::Connection) -> std::result::Result<T, StoreError>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let failure = match self.selector.ensure_connection() {
                Ok(conn) => match operation(conn) {
                    Ok(value) => return Ok(value),
                    Err(e) => self.on_command_error(attempt, e)?,
                },
                Err(Unreachable { tried, last }) => FailoverError::AllEndpointsUnreachable {
                    tried,
                    attempts: attempt,
                    source: last,
                },
            };

            if attempt >= max_attempts {
                return Err(failure);
            }

            let delay = self.policy.backoff(attempt, &mut self.rng);
            if let Some(cause) = failure.store_error() {
                self.selector
                    .events()
                    .retry_scheduled(attempt, delay, cause);
            }
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            attempt += 1;
        }
    }

    /// Returns the transient failure to retry, or `Err` with a fatal one
    fn on_command_error(&mut self, attempt: u32, error: StoreError) -> Result<FailoverError> {
        let endpoint = self.selector.active_endpoint().to_string();

        if classify(&error) == ErrorClass::Fatal {
            if error.poisons_connection() {
                self.selector.discard();
            }
            return Err(FailoverError::Fatal {
                endpoint,
                source: error,
            });
        }

        self.selector
            .events()
            .command_failed(self.selector.active_endpoint(), attempt, &error);
        self.selector.invalidate();

        Ok(FailoverError::Transient {
            endpoint,
            attempts: attempt,
            source: error,
        })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn selector(&self) -> &ConnectionSelector<F> {
        &self.selector
    }

    pub fn selector_mut(&mut self) -> &mut ConnectionSelector<F> {
        &mut self.selector
    }
}
