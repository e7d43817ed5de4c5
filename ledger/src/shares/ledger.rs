//! # Share Ledger
//!
//! Balances in Solera are stored as **shares**, not display amounts. A
//! share is a fixed fraction of the pool; what a share is *worth* is the
//! business of the rate timeline. The ledger therefore never changes when
//! the rate moves — ten thousand holders rebase in O(1) because nothing
//! here is touched at all.
//!
//! Display amounts ("assets") are derived on demand:
//!
//! ```text
//! assets = shares * rate / base        (what a holding is worth)
//! shares = assets * base / rate        (what a deposit is owed)
//! ```
//!
//! ## Rounding policy
//!
//! Both conversions multiply first in `u128` (where a product of two
//! `u64` values always fits) and floor on the divide. Flooring both
//! directions means a round trip can only lose dust, never create it —
//! no sequence of conversions mints value out of thin air.
//!
//! ## The null address
//!
//! [`Address::NULL`] can neither receive nor give up shares. Mint and
//! burn notifications use it as the synthetic counterparty, so letting it
//! hold a balance would make supply accounting ambiguous.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::Address;
use crate::rate::Rate;

/// Share units. The internal, rate-independent balance representation.
pub type Shares = u64;

/// Asset units — what deposits, redemptions, and display balances are
/// denominated in. One asset unit is the smallest indivisible amount of
/// the underlying collateral.
pub type Assets = u64;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during share accounting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShareError {
    /// Attempted to remove more shares than the account holds.
    #[error("insufficient shares for {account}: holding {held}, operation requires {required}")]
    InsufficientShares {
        /// The account being debited.
        account: Address,
        /// Shares currently held.
        held: Shares,
        /// Shares the operation needs.
        required: Shares,
    },

    /// The null address cannot receive shares.
    #[error("invalid receiver: the null address cannot hold shares")]
    InvalidReceiver,

    /// The null address cannot give up shares.
    #[error("invalid sender: the null address cannot give up shares")]
    InvalidSender,

    /// Crediting an account would overflow its holding.
    ///
    /// If you're hitting this, someone is trying to credit more than
    /// 18.4 quintillion shares. That's either a bug or an attack.
    #[error("share balance overflow for {account}: holding {held}, crediting {crediting}")]
    BalanceOverflow {
        /// The account being credited.
        account: Address,
        /// Shares held before the failed credit.
        held: Shares,
        /// The amount that caused the overflow.
        crediting: Shares,
    },

    /// Minting would overflow the total share supply.
    #[error("total share supply overflow: supply {supply}, minting {minting}")]
    SupplyOverflow {
        /// Supply before the failed mint.
        supply: Shares,
        /// The amount that caused the overflow.
        minting: Shares,
    },

    /// A conversion divisor is zero. Rates start at the base and are
    /// validated against decreases, so this marks an uninitialized or
    /// corrupted rate, not a plausible runtime state.
    #[error("conversion divisor is zero: the share rate was never initialized")]
    ZeroRate,

    /// A conversion result does not fit the 64-bit amount range.
    #[error("conversion result exceeds the representable amount range")]
    AmountOverflow,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Converts a share count to its asset value at the given rate.
///
/// Multiplies before dividing and floors the result. Returns
/// [`ShareError::AmountOverflow`] when the value exceeds `u64` — which
/// takes an astronomical rate, but astronomical rates are exactly when
/// silent truncation would hurt most.
pub fn shares_to_assets(shares: Shares, rate: Rate, base: Rate) -> Result<Assets, ShareError> {
    if base == 0 {
        return Err(ShareError::ZeroRate);
    }
    let gross = u128::from(shares) * u128::from(rate);
    Assets::try_from(gross / u128::from(base)).map_err(|_| ShareError::AmountOverflow)
}

/// Converts an asset amount to the share count it is worth at the given
/// rate. Multiplies before dividing and floors the result.
pub fn assets_to_shares(assets: Assets, rate: Rate, base: Rate) -> Result<Shares, ShareError> {
    if rate == 0 {
        return Err(ShareError::ZeroRate);
    }
    let scaled = u128::from(assets) * u128::from(base);
    Shares::try_from(scaled / u128::from(rate)).map_err(|_| ShareError::AmountOverflow)
}

// ---------------------------------------------------------------------------
// ShareLedger
// ---------------------------------------------------------------------------

/// The complete share position of every holder, plus the total supply.
///
/// Mutations validate everything before writing anything, so a failed
/// call leaves the ledger exactly as it was. Thread safety is handled by
/// whoever owns the ledger — a `ShareLedger` is not `Sync` by itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShareLedger {
    /// Share holdings indexed by account. Never contains zero entries:
    /// a holding that reaches zero is removed, so `balances.len()` is the
    /// holder count.
    balances: HashMap<Address, Shares>,

    /// Sum of all holdings. Maintained incrementally; every holding is
    /// at most this value.
    total_shares: Shares,
}

impl ShareLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits freshly created shares to an account.
    ///
    /// Returns the account's new holding.
    ///
    /// # Errors
    ///
    /// [`ShareError::InvalidReceiver`] for the null address,
    /// [`ShareError::BalanceOverflow`] / [`ShareError::SupplyOverflow`]
    /// when either counter would wrap.
    pub fn mint(&mut self, account: &Address, shares: Shares) -> Result<Shares, ShareError> {
        if account.is_null() {
            return Err(ShareError::InvalidReceiver);
        }

        let held = self.shares_of(account);
        let new_holding = held
            .checked_add(shares)
            .ok_or(ShareError::BalanceOverflow {
                account: *account,
                held,
                crediting: shares,
            })?;
        let new_total = self
            .total_shares
            .checked_add(shares)
            .ok_or(ShareError::SupplyOverflow {
                supply: self.total_shares,
                minting: shares,
            })?;

        if new_holding > 0 {
            self.balances.insert(*account, new_holding);
        }
        self.total_shares = new_total;
        Ok(new_holding)
    }

    /// Destroys shares held by an account.
    ///
    /// Returns the account's remaining holding.
    ///
    /// # Errors
    ///
    /// [`ShareError::InvalidSender`] for the null address,
    /// [`ShareError::InsufficientShares`] when the holding is too small.
    pub fn burn(&mut self, account: &Address, shares: Shares) -> Result<Shares, ShareError> {
        if account.is_null() {
            return Err(ShareError::InvalidSender);
        }

        let held = self.shares_of(account);
        if held < shares {
            return Err(ShareError::InsufficientShares {
                account: *account,
                held,
                required: shares,
            });
        }

        let remaining = held - shares;
        if remaining == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(*account, remaining);
        }
        // Every holding is bounded by the total, so this cannot wrap.
        self.total_shares -= shares;
        Ok(remaining)
    }

    /// Moves shares between two accounts without touching the supply.
    ///
    /// Only reachable through the allowlist transfer path — the default
    /// token policy exposes no way to call this.
    pub fn move_shares(
        &mut self,
        from: &Address,
        to: &Address,
        shares: Shares,
    ) -> Result<(), ShareError> {
        if from.is_null() {
            return Err(ShareError::InvalidSender);
        }
        if to.is_null() {
            return Err(ShareError::InvalidReceiver);
        }
        if from == to {
            // Self-transfers are a no-op, but still respect the holding.
            let held = self.shares_of(from);
            if held < shares {
                return Err(ShareError::InsufficientShares {
                    account: *from,
                    held,
                    required: shares,
                });
            }
            return Ok(());
        }

        let from_held = self.shares_of(from);
        if from_held < shares {
            return Err(ShareError::InsufficientShares {
                account: *from,
                held: from_held,
                required: shares,
            });
        }
        let to_held = self.shares_of(to);
        let to_new = to_held
            .checked_add(shares)
            .ok_or(ShareError::BalanceOverflow {
                account: *to,
                held: to_held,
                crediting: shares,
            })?;

        let from_remaining = from_held - shares;
        if from_remaining == 0 {
            self.balances.remove(from);
        } else {
            self.balances.insert(*from, from_remaining);
        }
        if to_new > 0 {
            self.balances.insert(*to, to_new);
        }
        Ok(())
    }

    /// The share holding of an account. Unknown accounts hold zero.
    pub fn shares_of(&self, account: &Address) -> Shares {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// The total share supply.
    pub fn total_shares(&self) -> Shares {
        self.total_shares
    }

    /// The number of accounts with a non-zero holding.
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// All non-zero holdings as `(account, shares)` pairs, in no
    /// particular order.
    pub fn all_holdings(&self) -> Vec<(Address, Shares)> {
        self.balances.iter().map(|(a, s)| (*a, *s)).collect()
    }

    /// The asset value of an account's holding at the given rate.
    ///
    /// Always derived from the share count at query time — the ledger
    /// caches no display amounts, so a rate change is reflected by every
    /// balance simultaneously.
    pub fn balance_in_assets(
        &self,
        account: &Address,
        rate: Rate,
        base: Rate,
    ) -> Result<Assets, ShareError> {
        shares_to_assets(self.shares_of(account), rate, base)
    }

    /// The asset value of the entire share supply at the given rate.
    /// Derived, never cached, same as individual balances.
    pub fn total_assets(&self, rate: Rate, base: Rate) -> Result<Assets, ShareError> {
        shares_to_assets(self.total_shares, rate, base)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Rate = 100_000_000;

    fn alice() -> Address {
        Address::derive("alice")
    }

    fn bob() -> Address {
        Address::derive("bob")
    }

    #[test]
    fn mint_credits_and_grows_supply() {
        let mut ledger = ShareLedger::new();

        let holding = ledger.mint(&alice(), 1_000).unwrap();
        assert_eq!(holding, 1_000);
        assert_eq!(ledger.shares_of(&alice()), 1_000);
        assert_eq!(ledger.total_shares(), 1_000);
        assert_eq!(ledger.holder_count(), 1);
    }

    #[test]
    fn mint_accumulates() {
        let mut ledger = ShareLedger::new();
        ledger.mint(&alice(), 600).unwrap();
        let holding = ledger.mint(&alice(), 400).unwrap();
        assert_eq!(holding, 1_000);
        assert_eq!(ledger.total_shares(), 1_000);
        assert_eq!(ledger.holder_count(), 1);
    }

    #[test]
    fn mint_to_null_rejected() {
        let mut ledger = ShareLedger::new();
        let err = ledger.mint(&Address::NULL, 100).unwrap_err();
        assert_eq!(err, ShareError::InvalidReceiver);
        assert_eq!(ledger.total_shares(), 0);
    }

    #[test]
    fn mint_balance_overflow_rejected() {
        let mut ledger = ShareLedger::new();
        ledger.mint(&alice(), Shares::MAX).unwrap();

        let err = ledger.mint(&alice(), 1).unwrap_err();
        assert!(matches!(err, ShareError::BalanceOverflow { held, crediting: 1, .. } if held == Shares::MAX));
        // Nothing moved.
        assert_eq!(ledger.shares_of(&alice()), Shares::MAX);
        assert_eq!(ledger.total_shares(), Shares::MAX);
    }

    #[test]
    fn mint_supply_overflow_rejected() {
        let mut ledger = ShareLedger::new();
        ledger.mint(&alice(), Shares::MAX - 10).unwrap();

        // Bob's holding would be fine; the supply counter would not.
        let err = ledger.mint(&bob(), 11).unwrap_err();
        assert!(matches!(
            err,
            ShareError::SupplyOverflow {
                supply,
                minting: 11
            } if supply == Shares::MAX - 10
        ));
        assert_eq!(ledger.shares_of(&bob()), 0);
    }

    #[test]
    fn burn_reduces_holding_and_supply() {
        let mut ledger = ShareLedger::new();
        ledger.mint(&alice(), 1_000).unwrap();

        let remaining = ledger.burn(&alice(), 400).unwrap();
        assert_eq!(remaining, 600);
        assert_eq!(ledger.total_shares(), 600);
    }

    #[test]
    fn burn_to_zero_removes_the_entry() {
        let mut ledger = ShareLedger::new();
        ledger.mint(&alice(), 500).unwrap();

        let remaining = ledger.burn(&alice(), 500).unwrap();
        assert_eq!(remaining, 0);
        assert_eq!(ledger.holder_count(), 0);
        assert_eq!(ledger.total_shares(), 0);
    }

    #[test]
    fn burn_insufficient_carries_details() {
        let mut ledger = ShareLedger::new();
        ledger.mint(&alice(), 100).unwrap();

        let err = ledger.burn(&alice(), 200).unwrap_err();
        assert_eq!(
            err,
            ShareError::InsufficientShares {
                account: alice(),
                held: 100,
                required: 200,
            }
        );
        // The failed burn changed nothing.
        assert_eq!(ledger.shares_of(&alice()), 100);
        assert_eq!(ledger.total_shares(), 100);
    }

    #[test]
    fn burn_from_null_rejected() {
        let mut ledger = ShareLedger::new();
        let err = ledger.burn(&Address::NULL, 0).unwrap_err();
        assert_eq!(err, ShareError::InvalidSender);
    }

    #[test]
    fn move_shares_preserves_supply() {
        let mut ledger = ShareLedger::new();
        ledger.mint(&alice(), 1_000).unwrap();

        ledger.move_shares(&alice(), &bob(), 250).unwrap();
        assert_eq!(ledger.shares_of(&alice()), 750);
        assert_eq!(ledger.shares_of(&bob()), 250);
        assert_eq!(ledger.total_shares(), 1_000);
        assert_eq!(ledger.holder_count(), 2);
    }

    #[test]
    fn move_shares_rejects_null_endpoints() {
        let mut ledger = ShareLedger::new();
        ledger.mint(&alice(), 100).unwrap();

        assert_eq!(
            ledger.move_shares(&Address::NULL, &alice(), 10).unwrap_err(),
            ShareError::InvalidSender
        );
        assert_eq!(
            ledger.move_shares(&alice(), &Address::NULL, 10).unwrap_err(),
            ShareError::InvalidReceiver
        );
    }

    #[test]
    fn self_move_is_a_checked_noop() {
        let mut ledger = ShareLedger::new();
        ledger.mint(&alice(), 100).unwrap();

        ledger.move_shares(&alice(), &alice(), 50).unwrap();
        assert_eq!(ledger.shares_of(&alice()), 100);

        let err = ledger.move_shares(&alice(), &alice(), 200).unwrap_err();
        assert!(matches!(err, ShareError::InsufficientShares { .. }));
    }

    #[test]
    fn conversion_is_identity_at_the_base_rate() {
        assert_eq!(shares_to_assets(1_234, BASE, BASE).unwrap(), 1_234);
        assert_eq!(assets_to_shares(1_234, BASE, BASE).unwrap(), 1_234);
    }

    #[test]
    fn conversions_floor() {
        // At rate 2x, three assets are worth 1.5 shares -> floored to 1.
        assert_eq!(assets_to_shares(3, 2 * BASE, BASE).unwrap(), 1);
        // And 3 shares at rate 1.5x are worth 4.5 assets -> floored to 4.
        assert_eq!(shares_to_assets(3, BASE + BASE / 2, BASE).unwrap(), 4);
    }

    #[test]
    fn round_trip_never_exceeds_the_input() {
        // Deliberately awkward rates: just above base, a prime multiple,
        // and a rate mid-interpolation would produce.
        for rate in [BASE + 1, BASE * 3 + 7, BASE + BASE / 3] {
            for amount in [0u64, 1, 2, 9, 99, 12_345, 1_000_000_007] {
                let shares = assets_to_shares(amount, rate, BASE).unwrap();
                let back = shares_to_assets(shares, rate, BASE).unwrap();
                assert!(
                    back <= amount,
                    "round trip grew {} -> {} at rate {}",
                    amount,
                    back,
                    rate
                );
            }
        }
    }

    #[test]
    fn doubling_the_rate_doubles_the_value() {
        let mut ledger = ShareLedger::new();
        ledger.mint(&alice(), 5_000).unwrap();

        let at_base = ledger.balance_in_assets(&alice(), BASE, BASE).unwrap();
        let at_double = ledger.balance_in_assets(&alice(), 2 * BASE, BASE).unwrap();
        assert_eq!(at_double, 2 * at_base);
    }

    #[test]
    fn zero_rate_conversion_rejected() {
        assert_eq!(assets_to_shares(100, 0, BASE).unwrap_err(), ShareError::ZeroRate);
        assert_eq!(shares_to_assets(100, BASE, 0).unwrap_err(), ShareError::ZeroRate);
    }

    #[test]
    fn oversized_conversion_result_rejected() {
        // u64::MAX shares at a rate far above base cannot be represented.
        let err = shares_to_assets(Shares::MAX, 100 * BASE, BASE).unwrap_err();
        assert_eq!(err, ShareError::AmountOverflow);

        // The mirror image: converting a huge amount at a tiny rate.
        let err = assets_to_shares(Assets::MAX, 1, BASE).unwrap_err();
        assert_eq!(err, ShareError::AmountOverflow);
    }

    #[test]
    fn total_assets_tracks_the_rate_without_mutation() {
        let mut ledger = ShareLedger::new();
        ledger.mint(&alice(), 10_000).unwrap();
        ledger.mint(&bob(), 30_000).unwrap();

        assert_eq!(ledger.total_assets(BASE, BASE).unwrap(), 40_000);
        // Same ledger, higher rate: the derived total moves on its own.
        assert_eq!(ledger.total_assets(BASE + BASE / 2, BASE).unwrap(), 60_000);
        assert_eq!(ledger.total_shares(), 40_000);
    }

    #[test]
    fn ledger_serde_roundtrip() {
        let mut ledger = ShareLedger::new();
        ledger.mint(&alice(), 42).unwrap();
        ledger.mint(&bob(), 58).unwrap();

        let json = serde_json::to_string(&ledger).unwrap();
        let recovered: ShareLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered, ledger);
    }
}
