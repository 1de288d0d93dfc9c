//! Poll configuration and result types.
//!
//! The polling loop itself lives in `crate::application::poll`; this module
//! only holds the data it consumes and produces.

use std::time::Duration;

use crate::domain::error::PollConfigError;

/// Interval and deadline for one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    interval: Duration,
    timeout: Duration,
    max_attempts: Option<u32>,
}

impl PollConfig {
    /// Build a time-bounded poll configuration.
    ///
    /// A `timeout` shorter than `interval` is accepted and yields a single
    /// evaluation.
    ///
    /// # Errors
    ///
    /// Returns an error if either duration is zero.
    pub fn new(interval: Duration, timeout: Duration) -> Result<Self, PollConfigError> {
        if interval.is_zero() {
            return Err(PollConfigError::ZeroInterval);
        }
        if timeout.is_zero() {
            return Err(PollConfigError::ZeroTimeout);
        }
        Ok(Self {
            interval,
            timeout,
            max_attempts: None,
        })
    }

    /// Additionally stop after `attempts` evaluations.
    ///
    /// # Errors
    ///
    /// Returns an error if `attempts` is zero.
    pub fn with_max_attempts(mut self, attempts: u32) -> Result<Self, PollConfigError> {
        if attempts == 0 {
            return Err(PollConfigError::ZeroAttempts);
        }
        self.max_attempts = Some(attempts);
        Ok(self)
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }
}

/// Terminal state of a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The success predicate held for the last observation.
    Succeeded,
    /// The deadline or the attempt budget ran out first.
    TimedOut,
    /// The cancellation token fired while waiting.
    Cancelled,
}

impl PollOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::TimedOut => "timed out",
            Self::Cancelled => "cancelled",
        }
    }
}

/// What a poll observed and how it ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResult<T> {
    pub outcome: PollOutcome,
    /// The most recent observation, whether or not it succeeded.
    pub last_observed: T,
    /// Wall-clock time from the first observation to the return.
    pub elapsed: Duration,
    /// Number of times the observation ran.
    pub attempts: u32,
}

impl<T> PollResult<T> {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.outcome == PollOutcome::Succeeded
    }

    #[must_use]
    pub fn cancelled(&self) -> bool {
        self.outcome == PollOutcome::Cancelled
    }

    /// Transform the observed value, keeping outcome and timings.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> PollResult<U> {
        PollResult {
            outcome: self.outcome,
            last_observed: f(self.last_observed),
            elapsed: self.elapsed,
            attempts: self.attempts,
        }
    }
}
