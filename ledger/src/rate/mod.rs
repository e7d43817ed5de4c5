//! # Rate Module
//!
//! The governance-scheduled share rate. A deployment's yield story is one
//! number — how many asset units a share is worth — and this module owns
//! how that number moves through time: linearly, continuously, and only
//! when someone with the rate-setter role says so.
//!
//! The timeline is policy-free plumbing. Validation (no decreases below
//! the anchor, future settlement, APR ceilings) lives with the token that
//! owns the schedule; persistence and clocks live with the node. What
//! remains here is the pure geometry of a single interpolated segment.

pub mod timeline;

pub use timeline::{Rate, RateTimeline, SchedulePhase, Timestamp};
