//! Branch and pull-request slot accounting.
//!
//! A [`Limiter`] holds the configured caps, a [`LimiterState`] holds the
//! counters for one evaluation run. Every grant increments its counter in the
//! same call that checked it, so a slot can never be handed out twice.
//! [`SharedLimiter`] puts the state behind a mutex for callers that reserve
//! from more than one thread.

use crate::domain::Limits;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// What a reservation is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReservationKind {
    Branch,
    Pr,
}

/// Which cap refused a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DenyReason {
    BranchConcurrency,
    PrConcurrency,
    PrHourly,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::BranchConcurrency => write!(f, "branch concurrency limit"),
            DenyReason::PrConcurrency => write!(f, "pr concurrency limit"),
            DenyReason::PrHourly => write!(f, "pr hourly limit"),
        }
    }
}

/// Result of a reservation attempt. Denial is an ordinary outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    Granted,
    Denied(DenyReason),
}

impl Reservation {
    pub fn is_granted(&self) -> bool {
        matches!(self, Reservation::Granted)
    }
}

/// Counters for one evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimiterState {
    pub branches: u32,
    pub prs: u32,
    pub prs_this_hour: u32,
}

impl LimiterState {
    /// Fresh counters for a new run
    pub fn new() -> Self {
        LimiterState::default()
    }

    /// Counters seeded with branches and PRs that are already open
    pub fn with_counts(open_branches: u32, open_prs: u32, prs_this_hour: u32) -> Self {
        LimiterState {
            branches: open_branches,
            prs: open_prs,
            prs_this_hour,
        }
    }

    /// Start a new hourly window. Called by the external scheduler.
    pub fn reset_hourly(&mut self) {
        self.prs_this_hour = 0;
    }
}

/// Applies configured caps to a [`LimiterState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limiter {
    limits: Limits,
}

impl Limiter {
    pub fn new(limits: Limits) -> Self {
        Limiter { limits }
    }

    /// Check a cap and take the slot when it fits.
    ///
    /// A PR slot must fit both the concurrent and the hourly cap; granting it
    /// counts against both.
    pub fn try_reserve(&self, kind: ReservationKind, state: &mut LimiterState) -> Reservation {
        let outcome = match kind {
            ReservationKind::Branch => {
                if self.limits.branch_concurrent.permits(state.branches) {
                    state.branches = state.branches.saturating_add(1);
                    Reservation::Granted
                } else {
                    Reservation::Denied(DenyReason::BranchConcurrency)
                }
            }
            ReservationKind::Pr => {
                if !self.limits.pr_concurrent.permits(state.prs) {
                    Reservation::Denied(DenyReason::PrConcurrency)
                } else if !self.limits.pr_hourly.permits(state.prs_this_hour) {
                    Reservation::Denied(DenyReason::PrHourly)
                } else {
                    state.prs = state.prs.saturating_add(1);
                    state.prs_this_hour = state.prs_this_hour.saturating_add(1);
                    Reservation::Granted
                }
            }
        };

        if let Reservation::Denied(reason) = outcome {
            tracing::debug!(
                kind = ?kind,
                reason = %reason,
                branches = state.branches,
                prs = state.prs,
                prs_this_hour = state.prs_this_hour,
                "reservation denied"
            );
        }

        outcome
    }
}

/// Something the decision engine can take slots from.
pub trait SlotReserver {
    fn reserve(&mut self, kind: ReservationKind) -> Reservation;
}

/// A limiter bound to a run's state, for single-threaded evaluation.
pub struct StateReserver<'a> {
    limiter: Limiter,
    state: &'a mut LimiterState,
}

impl<'a> StateReserver<'a> {
    pub fn new(limiter: Limiter, state: &'a mut LimiterState) -> Self {
        StateReserver { limiter, state }
    }
}

impl SlotReserver for StateReserver<'_> {
    fn reserve(&mut self, kind: ReservationKind) -> Reservation {
        self.limiter.try_reserve(kind, self.state)
    }
}

/// Limiter state shared between threads.
///
/// Every reservation runs under one lock, which keeps check-and-increment
/// indivisible across threads. Clones share the same counters.
#[derive(Debug, Clone)]
pub struct SharedLimiter {
    limiter: Limiter,
    state: Arc<Mutex<LimiterState>>,
}

impl SharedLimiter {
    pub fn new(limits: Limits) -> Self {
        SharedLimiter::with_state(limits, LimiterState::new())
    }

    pub fn with_state(limits: Limits, state: LimiterState) -> Self {
        SharedLimiter {
            limiter: Limiter::new(limits),
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn try_reserve(&self, kind: ReservationKind) -> Reservation {
        // A poisoned lock means a panic mid-reservation; deny rather than guess.
        match self.state.lock() {
            Ok(mut state) => self.limiter.try_reserve(kind, &mut state),
            Err(_) => Reservation::Denied(match kind {
                ReservationKind::Branch => DenyReason::BranchConcurrency,
                ReservationKind::Pr => DenyReason::PrConcurrency,
            }),
        }
    }

    /// Start a new hourly window for every holder of this limiter.
    ///
    /// Runs even when the lock is poisoned; zeroing a counter cannot leave the
    /// state half-updated.
    pub fn reset_hourly(&self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reset_hourly();
    }

    /// Copy of the current counters
    pub fn snapshot(&self) -> LimiterState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SlotReserver for &SharedLimiter {
    fn reserve(&mut self, kind: ReservationKind) -> Reservation {
        self.try_reserve(kind)
    }
}
