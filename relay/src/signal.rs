//! Boolean condition a consumer can block on.
//!
//! Used twice by the relay: once for "frames available" (owned by the frame
//! ring, only changed under the ring lock) and once for "link connected".
//! Waiters are woken on every false -> true edge.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Outcome of a timed wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitResult {
    /// The signal was set when the wait returned.
    Ready,
    /// The timeout elapsed with the signal still clear.
    TimedOut,
}

#[derive(Debug, Default)]
pub struct Signal {
    state: Mutex<bool>,
    cond: Condvar,
    rising_edges: AtomicU64,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the signal. Returns `true` on a false -> true edge.
    pub(crate) fn set(&self) -> bool {
        let mut state = self.lock();
        if *state {
            return false;
        }
        *state = true;
        self.rising_edges.fetch_add(1, Ordering::Relaxed);
        self.cond.notify_all();
        true
    }

    /// Clear the signal. Returns `true` on a true -> false edge.
    pub(crate) fn clear(&self) -> bool {
        let mut state = self.lock();
        std::mem::replace(&mut *state, false)
    }

    pub fn is_set(&self) -> bool {
        *self.lock()
    }

    /// Number of false -> true transitions observed so far.
    pub fn rising_edges(&self) -> u64 {
        self.rising_edges.load(Ordering::Relaxed)
    }

    /// Block until the signal is set.
    pub fn wait(&self) {
        let state = self.lock();
        let _state = self
            .cond
            .wait_while(state, |set| !*set)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Block until the signal is set or `timeout` elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> WaitResult {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.lock();
        while !*state {
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                // Timeout too large to represent; wait without a bound.
                None => {
                    state = self.cond.wait(state).unwrap_or_else(PoisonError::into_inner);
                    continue;
                }
            };
            if remaining.is_zero() {
                return WaitResult::TimedOut;
            }
            state = self
                .cond
                .wait_timeout(state, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        WaitResult::Ready
    }
}
