//! Bounded polling until an asynchronous API operation converges

use rand::Rng;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

/// Classification of one probe attempt
#[derive(Debug)]
pub enum Probe<T, E> {
    /// Observed state matches the goal
    Converged(T),
    /// Not there yet, the reason is reported if the deadline passes
    NotYet(String),
    /// Non-recoverable, stop polling immediately
    Fatal(E),
}

#[derive(Error, Debug)]
pub enum PollError<E> {
    #[error("deadline exceeded after {attempts} attempts, last observed: {last_reason}")]
    DeadlineExceeded { last_reason: String, attempts: u32 },

    #[error("{0}")]
    Fatal(E),
}

/// Delay policy between probe attempts
#[derive(Clone, Debug, PartialEq)]
pub struct Backoff {
    /// Delay after the first attempt
    pub initial: Duration,
    /// Growth factor applied after every attempt
    pub multiplier: f64,
    /// Upper bound for a single delay
    pub max: Duration,
    /// Randomise each delay into [delay/2, delay]
    pub jitter: bool,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::exponential(Duration::from_secs(1), Duration::from_secs(10))
    }
}

impl Backoff {
    pub fn constant(interval: Duration) -> Self {
        Self {
            initial: interval,
            multiplier: 1.0,
            max: interval,
            jitter: false,
        }
    }

    pub fn exponential(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            multiplier: 2.0,
            max,
            jitter: false,
        }
    }

    pub fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }

    /// Delay before attempt `retry + 1`, without jitter
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(retry.min(64) as i32);
        let secs = self.initial.as_secs_f64() * factor;
        if !secs.is_finite() || secs >= self.max.as_secs_f64() {
            return self.max;
        }
        Duration::from_secs_f64(secs)
    }

    fn next_delay(&self, retry: u32) -> Duration {
        let delay = self.delay(retry);
        if !self.jitter || delay.is_zero() {
            return delay;
        }
        let low = delay / 2;
        rand::thread_rng().gen_range(low..=delay)
    }
}

/// A convergence wait: how long and how often
#[derive(Clone, Debug, PartialEq)]
pub struct Wait {
    pub timeout: Duration,
    pub backoff: Backoff,
}

impl Default for Wait {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10 * 60),
            backoff: Backoff::default(),
        }
    }
}

impl Wait {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Which operations wait for convergence
///
/// Without a wait, create and delete return once the API accepts the request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Convergence {
    pub create: Option<Wait>,
    pub delete: Option<Wait>,
}

impl Convergence {
    pub fn none() -> Self {
        Self::default()
    }

    /// Wait on both create and delete
    pub fn both(wait: Wait) -> Self {
        Self {
            create: Some(wait.clone()),
            delete: Some(wait),
        }
    }

    pub fn on_create(mut self, wait: Wait) -> Self {
        self.create = Some(wait);
        self
    }

    pub fn on_delete(mut self, wait: Wait) -> Self {
        self.delete = Some(wait);
        self
    }
}

enum PollState<T, E> {
    Polling { attempts: u32 },
    Converged(T),
    Failed(PollError<E>),
}

/// Probe until `Converged`, a `Fatal` outcome, or `deadline`
///
/// The probe always runs at least once. Sleeps are clamped to the time left, so a
/// timeout is reported no later than one interval after the deadline.
pub async fn until_converged<T, E, F, Fut>(
    deadline: Instant,
    backoff: &Backoff,
    mut probe: F,
) -> Result<T, PollError<E>>
where
    E: fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Probe<T, E>>,
{
    let mut state = PollState::Polling { attempts: 0 };

    loop {
        state = match state {
            PollState::Polling { attempts } => {
                let attempts = attempts + 1;
                match probe().await {
                    Probe::Converged(value) => {
                        debug!("Converged after {} attempts", attempts);
                        PollState::Converged(value)
                    }
                    Probe::Fatal(e) => {
                        warn!("Polling aborted after {} attempts: {}", attempts, e);
                        PollState::Failed(PollError::Fatal(e))
                    }
                    Probe::NotYet(reason) => {
                        let now = Instant::now();
                        if now >= deadline {
                            PollState::Failed(PollError::DeadlineExceeded {
                                last_reason: reason,
                                attempts,
                            })
                        } else {
                            let delay = backoff.next_delay(attempts - 1).min(deadline - now);
                            debug!("Not converged ({}), retrying in {:?}", reason, delay);
                            time::sleep(delay).await;
                            PollState::Polling { attempts }
                        }
                    }
                }
            }
            PollState::Converged(value) => return Ok(value),
            PollState::Failed(e) => return Err(e),
        };
    }
}
