//! Timer-based value coalescing, decoupled from any render cycle.
//!
//! A [`Debouncer`] holds at most one pending value. Setting a new value
//! replaces the pending one and restarts the quiet period (last-write-wins,
//! no queuing). The caller drives time explicitly by passing `Instant`s, so
//! no background timer can outlive its owner and tests are deterministic.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Debouncer<T> {
    quiet_period: Duration,
    pending: Option<Pending<T>>,
    settled: Option<T>,
}

#[derive(Debug)]
struct Pending<T> {
    value: T,
    since: Instant,
}

impl<T> Debouncer<T> {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: None,
            settled: None,
        }
    }

    /// Start with an already-settled value.
    pub fn with_settled(quiet_period: Duration, value: T) -> Self {
        Self {
            quiet_period,
            pending: None,
            settled: Some(value),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Takes effect for the value set next; an already-pending value keeps
    /// the period it was scheduled with.
    pub fn set_quiet_period(&mut self, quiet_period: Duration) {
        self.quiet_period = quiet_period;
    }

    /// Schedule a value, replacing any value that has not yet settled.
    pub fn set(&mut self, value: T, now: Instant) {
        self.pending = Some(Pending { value, since: now });
    }

    /// Settle the pending value if its quiet period has elapsed.
    /// Returns true exactly when a value newly settled.
    pub fn poll(&mut self, now: Instant) -> bool {
        if let Some(pending) = self.pending.take() {
            if now.duration_since(pending.since) >= self.quiet_period {
                self.settled = Some(pending.value);
                return true;
            }
            self.pending = Some(pending);
        }
        false
    }

    /// The most recently settled value, if any.
    pub fn value(&self) -> Option<&T> {
        self.settled.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending value without settling it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
