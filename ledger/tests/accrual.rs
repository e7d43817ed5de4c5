//! Accrual integration tests for the Solera ledger.
//!
//! These tests exercise the rate timeline and the share ledger together,
//! the way the token layer composes them: balances are held as shares,
//! the timeline supplies a rate for an explicit instant, and display
//! values are derived at the boundary. They prove the core accounting
//! properties — monotone growth under an increasing schedule, exact
//! interpolation at sampled instants, and round-trip conversions that
//! never pay out more than went in.
//!
//! Each test builds its own ledger and timeline. No shared state, no
//! test ordering dependencies, no flaky failures.

use solera_ledger::identity::Address;
use solera_ledger::rate::{Rate, RateTimeline, SchedulePhase, Timestamp};
use solera_ledger::shares::{assets_to_shares, shares_to_assets, ShareLedger};

const BASE: Rate = 100_000_000;
const T0: Timestamp = 1_700_000_000;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// A funded single-holder ledger: `alice` deposited `amount` assets at
/// the base rate, so she holds exactly `amount` shares.
fn funded_ledger(amount: u64) -> (ShareLedger, Address) {
    let alice = Address::derive("alice");
    let mut ledger = ShareLedger::new();
    let shares = assets_to_shares(amount, BASE, BASE).unwrap();
    ledger.mint(&alice, shares).unwrap();
    (ledger, alice)
}

/// A timeline ramping from BASE to `target` between T0 and T0 + span.
fn ramp(target: Rate, span: u64) -> RateTimeline {
    let mut timeline = RateTimeline::flat(BASE, T0);
    timeline.reschedule(target, T0 + span, T0);
    timeline
}

// ---------------------------------------------------------------------------
// 1. Monotone Accrual
// ---------------------------------------------------------------------------

#[test]
fn balance_never_decreases_under_increasing_schedule() {
    let (ledger, alice) = funded_ledger(1_000_000);
    let timeline = ramp(2 * BASE, 3_600);

    let mut previous = 0u64;
    // Sample before, throughout, and well past the window.
    for offset in [0, 1, 60, 600, 1_800, 3_599, 3_600, 7_200, 86_400] {
        let now = T0 + offset;
        let rate = timeline.current_rate(now);
        let balance = ledger.balance_in_assets(&alice, rate, BASE).unwrap();
        assert!(
            balance >= previous,
            "balance fell from {} to {} at +{}s",
            previous,
            balance,
            offset
        );
        previous = balance;
    }

    // The fully settled balance is exactly double the deposit.
    assert_eq!(previous, 2_000_000);
}

#[test]
fn accrual_requires_no_ledger_mutation() {
    let (ledger, alice) = funded_ledger(500_000);
    let timeline = ramp(2 * BASE, 100);

    let before = ledger.clone();
    let early = ledger
        .balance_in_assets(&alice, timeline.current_rate(T0 + 10), BASE)
        .unwrap();
    let late = ledger
        .balance_in_assets(&alice, timeline.current_rate(T0 + 90), BASE)
        .unwrap();

    assert!(late > early);
    // Every derived read left the share ledger untouched.
    assert_eq!(ledger, before);
    assert_eq!(ledger.shares_of(&alice), 500_000);
}

// ---------------------------------------------------------------------------
// 2. Schedule Shape
// ---------------------------------------------------------------------------

#[test]
fn three_point_schedule_samples_are_exact() {
    let timeline = ramp(2 * BASE, 100);

    // Start, midpoint, end: the canonical three-point check.
    assert_eq!(timeline.current_rate(T0), BASE);
    assert_eq!(timeline.current_rate(T0 + 50), BASE + BASE / 2);
    assert_eq!(timeline.current_rate(T0 + 100), 2 * BASE);

    assert_eq!(timeline.phase(T0), SchedulePhase::Interpolating);
    assert_eq!(timeline.phase(T0 + 100), SchedulePhase::Settled);
}

#[test]
fn midpoint_balance_reflects_the_blended_rate() {
    let (ledger, alice) = funded_ledger(100);
    let timeline = ramp(2 * BASE, 100);

    let mid_rate = timeline.current_rate(T0 + 50);
    let balance = ledger.balance_in_assets(&alice, mid_rate, BASE).unwrap();
    // 100 shares at 1.5x the base rate.
    assert_eq!(balance, 150);
}

#[test]
fn interrupted_ramp_stays_continuous() {
    let mut timeline = ramp(2 * BASE, 100);

    let live_at_splice = timeline.current_rate(T0 + 50);
    let anchor = timeline.reschedule(4 * BASE, T0 + 150, T0 + 50);

    assert_eq!(anchor, live_at_splice);
    // Same instant, same rate, before and after re-arming.
    assert_eq!(timeline.current_rate(T0 + 50), live_at_splice);
    // And the new segment lands on its own target.
    assert_eq!(timeline.current_rate(T0 + 150), 4 * BASE);
}

// ---------------------------------------------------------------------------
// 3. Round-Trip Safety
// ---------------------------------------------------------------------------

#[test]
fn round_trip_through_live_rates_never_pays_out_more() {
    let timeline = ramp(3 * BASE + 1, 997); // prime-ish span, awkward target

    for offset in [0, 1, 7, 131, 499, 996, 997, 2_000] {
        let rate = timeline.current_rate(T0 + offset);
        for amount in [1u64, 3, 10, 999, 123_457, 10_u64.pow(12)] {
            let shares = assets_to_shares(amount, rate, BASE).unwrap();
            let back = shares_to_assets(shares, rate, BASE).unwrap();
            assert!(
                back <= amount,
                "conversion round trip grew {} -> {} at rate {}",
                amount,
                back,
                rate
            );
            // The dust lost to flooring is bounded by one rate unit.
            assert!(amount - back <= rate / BASE + 1);
        }
    }
}

#[test]
fn supply_value_equals_sum_of_holder_values_up_to_dust() {
    let mut ledger = ShareLedger::new();
    let holders: Vec<Address> = (0..7)
        .map(|i| Address::derive(&format!("holder-{i}")))
        .collect();
    for (i, holder) in holders.iter().enumerate() {
        ledger.mint(holder, 1_000 + 37 * i as u64).unwrap();
    }

    let timeline = ramp(2 * BASE, 100);
    let rate = timeline.current_rate(T0 + 33);

    let total = ledger.total_assets(rate, BASE).unwrap();
    let summed: u64 = holders
        .iter()
        .map(|h| ledger.balance_in_assets(h, rate, BASE).unwrap())
        .sum();

    // Each holder's floor can drop strictly less than one asset unit.
    assert!(total >= summed);
    assert!(total - summed < holders.len() as u64);
}
