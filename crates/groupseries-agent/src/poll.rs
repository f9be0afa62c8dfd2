//! Bounded, cancellable polling.
//!
//! Call setup and mute changes are confirmed by re-querying the endpoint a
//! fixed number of times with a pause in between. The worst-case latency is
//! `max_attempts × interval`; a [`CancelToken`] lets the caller stop early.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AgentResult;

/// Default number of status queries per poll.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// Default pause between status queries.
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Granularity at which [`ThreadPause`] checks for cancellation.
const CANCEL_CHECK: Duration = Duration::from_millis(50);

/// Shared flag that stops in-flight polls.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Clear the flag so the token can be reused for the next operation.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Relaxed);
    }
}

/// Waits between attempts.
pub trait Pause {
    /// Wait for `interval`. Returns `false` if cancelled while waiting.
    fn pause(&self, interval: Duration, cancel: &CancelToken) -> bool;
}

/// Sleeps the current thread in short slices, watching the cancel token.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPause;

impl Pause for ThreadPause {
    fn pause(&self, interval: Duration, cancel: &CancelToken) -> bool {
        let mut remaining = interval;
        while !remaining.is_zero() {
            if cancel.is_cancelled() {
                return false;
            }
            let slice = remaining.min(CANCEL_CHECK);
            std::thread::sleep(slice);
            remaining -= slice;
        }
        !cancel.is_cancelled()
    }
}

/// Poll budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        PollSettings {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

impl PollSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// How a poll ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The check succeeded on the given attempt (1-based).
    Found { value: T, attempts: u32 },
    /// Every attempt ran without success.
    Exhausted { attempts: u32 },
    /// The cancel token fired after the given number of attempts.
    Cancelled { attempts: u32 },
}

impl<T> PollOutcome<T> {
    pub fn found(self) -> Option<T> {
        match self {
            PollOutcome::Found { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Found { attempts, .. }
            | PollOutcome::Exhausted { attempts }
            | PollOutcome::Cancelled { attempts } => *attempts,
        }
    }
}

/// Runs a check up to `max_attempts` times, pausing between attempts.
///
/// There is no pause after the final attempt.
pub struct BoundedPoll<'a, P: Pause + ?Sized = ThreadPause> {
    settings: PollSettings,
    cancel: &'a CancelToken,
    pause: &'a P,
}

impl<'a, P: Pause + ?Sized> BoundedPoll<'a, P> {
    pub fn new(settings: PollSettings, cancel: &'a CancelToken, pause: &'a P) -> Self {
        BoundedPoll {
            settings,
            cancel,
            pause,
        }
    }

    /// Run `check` until it yields `Some`, the budget runs out, or the poll
    /// is cancelled. Errors from `check` abort the poll.
    pub fn run<T>(
        &self,
        mut check: impl FnMut(u32) -> AgentResult<Option<T>>,
    ) -> AgentResult<PollOutcome<T>> {
        let max_attempts = self.settings.max_attempts;
        for attempt in 1..=max_attempts {
            if self.cancel.is_cancelled() {
                return Ok(PollOutcome::Cancelled {
                    attempts: attempt - 1,
                });
            }
            if let Some(value) = check(attempt)? {
                return Ok(PollOutcome::Found {
                    value,
                    attempts: attempt,
                });
            }
            if attempt < max_attempts
                && !self.pause.pause(self.settings.interval(), self.cancel)
            {
                return Ok(PollOutcome::Cancelled { attempts: attempt });
            }
        }
        Ok(PollOutcome::Exhausted {
            attempts: max_attempts,
        })
    }
}
