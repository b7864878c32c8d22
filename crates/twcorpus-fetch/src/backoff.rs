//! Per-batch retry state machine for the rate-limited lookup endpoint.
//!
//! The endpoint allows roughly 300 lookups per 15 minutes. Rather than track
//! that budget, a rate-limited batch rests until a fixed cool-down window has
//! elapsed since the previous rest, then retries the same batch.
//!
//! | Attempt result | First attempt of the run | Later attempt        |
//! |----------------|--------------------------|----------------------|
//! | 200            | `Succeeded`              | `Succeeded`          |
//! | 429 / 503      | `Aborted(ColdStart)`     | `BackingOff` or `Aborted(Exhausted)` |
//! | other status   | error                    | error                |

use std::time::Duration;

use tokio::time::Instant;
use twcorpus_core::FetchConfig;

use crate::batch::Batch;
use crate::client::BatchResolver;
use crate::error::FetchError;
use crate::types::{LookupOutcome, LookupResponse};

/// Timing and attempt limits for the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Cool-down window measured from the previous rest.
    pub long_wait: Duration,
    /// Minimum rest, also slept after every successful batch.
    pub default_wait: Duration,
    /// Attempts per batch before the run gives up.
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            long_wait: Duration::from_secs(60),
            default_wait: Duration::from_secs(2),
            max_attempts: 10,
        }
    }
}

impl BackoffPolicy {
    #[must_use]
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            long_wait: config.long_wait(),
            default_wait: config.default_wait(),
            max_attempts: config.max_attempts,
        }
    }

    /// Rest length given the time elapsed since the window started:
    /// `max(default_wait, long_wait - elapsed)`.
    #[must_use]
    pub fn cooldown(&self, elapsed: Duration) -> Duration {
        self.long_wait.saturating_sub(elapsed).max(self.default_wait)
    }
}

/// Why a batch was given up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The very first request of the run was rate limited.
    ColdStart,
    /// The batch used up every attempt.
    Exhausted { attempts: u32 },
}

/// Terminal result of driving one batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Succeeded {
        response: LookupResponse,
        attempts: u32,
    },
    Aborted(AbortReason),
}

#[derive(Debug)]
enum BatchState {
    Attempting { attempt: u32 },
    BackingOff { attempt: u32, wait: Duration },
    Succeeded { response: LookupResponse, attempts: u32 },
    Aborted(AbortReason),
}

/// Run-scoped retry state: the cool-down window clock and whether any
/// request has been made yet.
#[derive(Debug)]
pub struct Backoff {
    policy: BackoffPolicy,
    window_start: Instant,
    first_pull: bool,
}

impl Backoff {
    #[must_use]
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            window_start: Instant::now(),
            first_pull: true,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Drives `batch` to a terminal state.
    ///
    /// # Errors
    ///
    /// Propagates any error from the resolver (unknown status, network or
    /// body failure) without retrying.
    pub async fn resolve<R: BatchResolver>(
        &mut self,
        resolver: &R,
        batch: &Batch,
    ) -> Result<BatchOutcome, FetchError> {
        let mut state = BatchState::Attempting { attempt: 1 };
        loop {
            state = match state {
                BatchState::Attempting { attempt } => {
                    let outcome = resolver.lookup(batch).await?;
                    let first_pull = std::mem::replace(&mut self.first_pull, false);
                    self.on_attempt(outcome, attempt, first_pull, batch)
                }
                BatchState::BackingOff { attempt, wait } => {
                    tracing::warn!(
                        wait_secs = wait.as_secs_f64(),
                        attempt,
                        "resting before retrying batch"
                    );
                    tokio::time::sleep(wait).await;
                    self.window_start = Instant::now();
                    BatchState::Attempting {
                        attempt: attempt + 1,
                    }
                }
                BatchState::Succeeded { response, attempts } => {
                    return Ok(BatchOutcome::Succeeded { response, attempts });
                }
                BatchState::Aborted(reason) => return Ok(BatchOutcome::Aborted(reason)),
            };
        }
    }

    fn on_attempt(
        &self,
        outcome: LookupOutcome,
        attempt: u32,
        first_pull: bool,
        batch: &Batch,
    ) -> BatchState {
        match outcome {
            LookupOutcome::Resolved(response) => BatchState::Succeeded {
                response,
                attempts: attempt,
            },
            LookupOutcome::Transient { status, .. } if first_pull => {
                tracing::error!(status, "first request of the run failed; halting");
                BatchState::Aborted(AbortReason::ColdStart)
            }
            LookupOutcome::Transient { status, .. } if attempt >= self.policy.max_attempts => {
                tracing::warn!(
                    status,
                    attempts = attempt,
                    last_id = batch.last_id(),
                    "ran out of attempts for batch"
                );
                BatchState::Aborted(AbortReason::Exhausted { attempts: attempt })
            }
            LookupOutcome::Transient { .. } => BatchState::BackingOff {
                attempt,
                wait: self.policy.cooldown(self.window_start.elapsed()),
            },
        }
    }
}
