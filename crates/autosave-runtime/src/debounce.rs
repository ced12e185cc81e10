//! Debounce scheduler: coalesces rapid triggers into one delayed delivery.
//!
//! Holds at most one pending payload. Each `schedule` replaces the payload
//! and restarts the countdown; `elapsed()` resolves with whatever payload is
//! current when the countdown runs out. No equality short-circuit: an
//! identical payload still restarts the timer.
//!
//! `elapsed()` only reads the stored deadline until it fires, so dropping it
//! inside `tokio::select!` loses nothing.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};

#[derive(Debug)]
struct Pending<T> {
    payload: T,
    deadline: Instant,
}

#[derive(Debug)]
pub struct DebounceScheduler<T> {
    pending: Option<Pending<T>>,
}

impl<T> Default for DebounceScheduler<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> DebounceScheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `payload` and (re)start the countdown.
    pub fn schedule(&mut self, payload: T, delay: Duration) {
        self.pending = Some(Pending {
            payload,
            deadline: Instant::now() + delay,
        });
    }

    /// Abort the countdown, returning the payload that will no longer fire.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.payload)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn peek(&self) -> Option<&T> {
        self.pending.as_ref().map(|p| &p.payload)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Wait for the countdown and take the last recorded payload.
    ///
    /// Never resolves while nothing is scheduled. A zero delay resolves on
    /// the next poll, never inside `schedule`.
    pub async fn elapsed(&mut self) -> T {
        loop {
            match self.deadline() {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
            if let Some(pending) = self.pending.take() {
                return pending.payload;
            }
        }
    }
}
