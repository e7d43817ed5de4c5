//! # Rate Timeline
//!
//! The share rate does not jump when governance rebases — it glides. A
//! timeline holds exactly one linear segment: the rate that was in force
//! when the current schedule was armed, the rate it is heading toward, and
//! the window over which the two are connected by straight-line
//! interpolation:
//!
//! ```text
//! rate
//!   next ·········____________
//!              ／
//!   last ___／
//!         start      end        time →
//! ```
//!
//! Reads are pure: [`RateTimeline::current_rate`] takes the clock as an
//! argument and touches nothing. Scheduling is the only mutation, and it
//! first snapshots the live rate as the new anchor so the curve is
//! continuous — a mid-ramp reschedule bends the line, it never teleports
//! the rate.
//!
//! The timeline itself imposes no policy. It will happily hold a
//! decreasing segment (a mid-ramp re-target below the live rate produces
//! one); which targets are acceptable is decided by the token layer that
//! owns the schedule.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-point share rate. One share is worth `rate / base` asset units,
/// where `base` is `10^decimals` for the owning token.
pub type Rate = u64;

/// Seconds since the Unix epoch. Always passed in explicitly; nothing in
/// the ledger reads a wall clock.
pub type Timestamp = u64;

// ---------------------------------------------------------------------------
// SchedulePhase
// ---------------------------------------------------------------------------

/// Where a timeline currently sits relative to its armed segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulePhase {
    /// No movement pending: the anchor and target coincide, or the query
    /// predates the armed window.
    Flat,
    /// Inside the window; the live rate is gliding toward the target.
    Interpolating,
    /// The window has elapsed; the target rate is fully in force. A
    /// settled timeline can be re-armed at any time.
    Settled,
}

impl SchedulePhase {
    /// Returns `true` while the live rate is actively changing.
    pub fn is_moving(&self) -> bool {
        matches!(self, SchedulePhase::Interpolating)
    }
}

impl fmt::Display for SchedulePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulePhase::Flat => write!(f, "flat"),
            SchedulePhase::Interpolating => write!(f, "interpolating"),
            SchedulePhase::Settled => write!(f, "settled"),
        }
    }
}

// ---------------------------------------------------------------------------
// RateTimeline
// ---------------------------------------------------------------------------

/// A single linear rate segment with its scheduling window.
///
/// Invariants maintained by construction and [`reschedule`](Self::reschedule):
///
/// * `update_start <= update_end`;
/// * `last_rate` is the live rate observed at the instant the segment was
///   armed, so consecutive segments join without a discontinuity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTimeline {
    /// The rate in force at `update_start` — the anchor of the segment.
    last_rate: Rate,
    /// The rate that will be in force at `update_end` — the target.
    next_rate: Rate,
    /// When the segment was armed.
    update_start: Timestamp,
    /// When the segment finishes settling.
    update_end: Timestamp,
}

impl RateTimeline {
    /// Creates a timeline holding `rate` steady. Queries at any instant —
    /// past, present, or future — return `rate` until a schedule is armed.
    pub fn flat(rate: Rate, now: Timestamp) -> Self {
        Self {
            last_rate: rate,
            next_rate: rate,
            update_start: now,
            update_end: now,
        }
    }

    /// The live rate at instant `now`.
    ///
    /// Piecewise: the anchor before the window, the target after it, and
    /// a multiply-before-divide linear blend strictly inside it. Total for
    /// every input — all intermediates are computed in `u128`, where a
    /// product of two `u64` values always fits.
    pub fn current_rate(&self, now: Timestamp) -> Rate {
        if now >= self.update_end {
            return self.next_rate;
        }
        if now <= self.update_start {
            return self.last_rate;
        }

        // Strictly inside the window, so the span is at least one second
        // and the division below cannot be by zero.
        let span = u128::from(self.update_end - self.update_start);
        let elapsed = u128::from(now - self.update_start);

        let blended = if self.next_rate >= self.last_rate {
            let climb = u128::from(self.next_rate - self.last_rate);
            u128::from(self.last_rate) + climb * elapsed / span
        } else {
            let fall = u128::from(self.last_rate - self.next_rate);
            u128::from(self.last_rate) - fall * elapsed / span
        };

        // Bounded by the segment endpoints, both of which are u64.
        blended as Rate
    }

    /// Arms a new segment toward `target`, settling at `end`.
    ///
    /// The live rate at `now` is snapshotted as the new anchor before the
    /// target is written, so the rate path stays continuous even when a
    /// previous segment is interrupted mid-ramp. Returns the anchored rate.
    ///
    /// The timeline accepts any `target` and `end` — including an `end` at
    /// or before `now`, which degenerates to an immediate step. Validation
    /// of targets and windows belongs to the caller.
    pub fn reschedule(&mut self, target: Rate, end: Timestamp, now: Timestamp) -> Rate {
        let anchor = self.current_rate(now);
        self.last_rate = anchor;
        self.next_rate = target;
        self.update_start = now;
        self.update_end = end;
        anchor
    }

    /// The phase of the armed segment as seen from instant `now`.
    pub fn phase(&self, now: Timestamp) -> SchedulePhase {
        if self.last_rate == self.next_rate {
            SchedulePhase::Flat
        } else if now >= self.update_end {
            SchedulePhase::Settled
        } else if now >= self.update_start {
            SchedulePhase::Interpolating
        } else {
            SchedulePhase::Flat
        }
    }

    /// The anchor rate of the current segment.
    pub fn last_rate(&self) -> Rate {
        self.last_rate
    }

    /// The target rate of the current segment.
    pub fn next_rate(&self) -> Rate {
        self.next_rate
    }

    /// When the current segment was armed.
    pub fn update_start(&self) -> Timestamp {
        self.update_start
    }

    /// When the current segment settles.
    pub fn update_end(&self) -> Timestamp {
        self.update_end
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
