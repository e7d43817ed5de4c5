//! # Base Asset Interface
//!
//! The lock vault never assumes anything about the deposited collateral
//! beyond four verbs: read a balance, move funds, grant an allowance, and
//! consume one. [`BaseAsset`] captures exactly that surface, so the vault
//! logic is identical whether the collateral is the in-process
//! [`CollateralLedger`] used by deployments and tests or an adapter over
//! an external settlement system.
//!
//! The allowance verbs exist for one caller: the bridge sink. Forwarding
//! custody is approve-then-pull — the vault grants, the sink consumes —
//! so the asset layer has to speak delegated transfers even though user
//! deposits never touch them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use solera_ledger::identity::Address;
use solera_ledger::shares::Assets;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during base asset operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// The sender does not hold enough funds.
    #[error("insufficient funds for {account}: available {available}, requested {requested}")]
    InsufficientFunds {
        /// The account being debited.
        account: Address,
        /// Funds currently held.
        available: Assets,
        /// Funds the operation needs.
        requested: Assets,
    },

    /// The spender's allowance does not cover the delegated transfer.
    #[error(
        "allowance from {owner} to {spender} is {allowed}, transfer requires {requested}"
    )]
    InsufficientAllowance {
        /// The account whose funds would move.
        owner: Address,
        /// The account attempting the delegated transfer.
        spender: Address,
        /// The current allowance.
        allowed: Assets,
        /// The amount the transfer needs.
        requested: Assets,
    },

    /// Crediting the receiver would overflow its balance.
    #[error("balance overflow for {account}: holding {held}, crediting {crediting}")]
    BalanceOverflow {
        /// The account being credited.
        account: Address,
        /// Funds held before the failed credit.
        held: Assets,
        /// The amount that caused the overflow.
        crediting: Assets,
    },

    /// The null address cannot receive funds.
    #[error("invalid receiver: the null address cannot receive funds")]
    InvalidReceiver,

    /// Minting would overflow the total supply.
    #[error("asset supply overflow: supply {supply}, minting {minting}")]
    SupplyOverflow {
        /// Supply before the failed mint.
        supply: Assets,
        /// The amount that caused the overflow.
        minting: Assets,
    },
}

// ---------------------------------------------------------------------------
// BaseAsset
// ---------------------------------------------------------------------------

/// What the vault requires of the deposited collateral.
///
/// Contract for implementors:
///
/// * `transfer` must succeed whenever `balance_of(from) >= amount` and
///   the receiver can absorb the credit. The vault's unwind paths rely
///   on this — a pull it just made is always push-back-able.
/// * `approve` overwrites any previous allowance for the pair; it never
///   accumulates.
/// * `transfer_from` consumes allowance only when the transfer succeeds.
/// * Failed calls leave balances and allowances untouched.
pub trait BaseAsset {
    /// Funds held by an account. Unknown accounts hold zero.
    fn balance_of(&self, account: &Address) -> Assets;

    /// Moves funds from `from` to `to`.
    fn transfer(&mut self, from: &Address, to: &Address, amount: Assets)
        -> Result<(), AssetError>;

    /// Grants `spender` the right to move up to `amount` out of `owner`.
    fn approve(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: Assets,
    ) -> Result<(), AssetError>;

    /// Moves funds out of `owner` on the authority of `spender`'s
    /// allowance, delivering them to `to`.
    fn transfer_from(
        &mut self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: Assets,
    ) -> Result<(), AssetError>;
}

// ---------------------------------------------------------------------------
// CollateralLedger
// ---------------------------------------------------------------------------

/// An in-process base asset: plain balances, overwrite-style allowances,
/// and an open mint for deployment seeding and test fixtures.
///
/// Every mutation validates before it writes, so a failed call leaves
/// the ledger exactly as it was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollateralLedger {
    /// Ticker symbol, e.g. "SLR".
    symbol: String,
    /// Display decimals of the smallest unit.
    decimals: u8,
    /// Funds per account. Zero entries are removed.
    balances: HashMap<Address, Assets>,
    /// allowances[owner][spender] = remaining delegated amount.
    /// Nested maps instead of a pair key so snapshots stay plain JSON.
    allowances: HashMap<Address, HashMap<Address, Assets>>,
    /// Sum of all balances.
    total_supply: Assets,
}

impl CollateralLedger {
    /// Creates an empty collateral ledger.
    pub fn new(symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            total_supply: 0,
        }
    }

    /// Mints new collateral into an account. Open by design: the network
    /// faucet and fixtures seed balances with it, and mainnet deployments
    /// front it with their own issuance controls.
    pub fn mint(&mut self, account: &Address, amount: Assets) -> Result<(), AssetError> {
        if account.is_null() {
            return Err(AssetError::InvalidReceiver);
        }

        let held = self.balance_of(account);
        let new_holding = held
            .checked_add(amount)
            .ok_or(AssetError::BalanceOverflow {
                account: *account,
                held,
                crediting: amount,
            })?;
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(AssetError::SupplyOverflow {
                supply: self.total_supply,
                minting: amount,
            })?;

        if new_holding > 0 {
            self.balances.insert(*account, new_holding);
        }
        self.total_supply = new_supply;
        Ok(())
    }

    /// The ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Display decimals.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Total collateral in circulation.
    pub fn total_supply(&self) -> Assets {
        self.total_supply
    }

    /// The remaining allowance from `owner` to `spender`.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Assets {
        self.allowances
            .get(owner)
            .and_then(|per_spender| per_spender.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Validates and applies a balance movement. Shared by `transfer`
    /// and `transfer_from` once authority has been established.
    fn move_funds(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Assets,
    ) -> Result<(), AssetError> {
        if to.is_null() {
            return Err(AssetError::InvalidReceiver);
        }

        let from_held = self.balance_of(from);
        if from_held < amount {
            return Err(AssetError::InsufficientFunds {
                account: *from,
                available: from_held,
                requested: amount,
            });
        }

        if from == to {
            // Solvent self-transfers are a no-op.
            return Ok(());
        }

        let to_held = self.balance_of(to);
        let to_new = to_held
            .checked_add(amount)
            .ok_or(AssetError::BalanceOverflow {
                account: *to,
                held: to_held,
                crediting: amount,
            })?;

        let from_remaining = from_held - amount;
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
}

impl BaseAsset for CollateralLedger {
    fn balance_of(&self, account: &Address) -> Assets {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Assets,
    ) -> Result<(), AssetError> {
        self.move_funds(from, to, amount)
    }

    fn approve(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: Assets,
    ) -> Result<(), AssetError> {
        let per_spender = self.allowances.entry(*owner).or_default();
        if amount == 0 {
            per_spender.remove(spender);
            if per_spender.is_empty() {
                self.allowances.remove(owner);
            }
        } else {
            per_spender.insert(*spender, amount);
        }
        Ok(())
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: Assets,
    ) -> Result<(), AssetError> {
        let allowed = self.allowance(owner, spender);
        if allowed < amount {
            return Err(AssetError::InsufficientAllowance {
                owner: *owner,
                spender: *spender,
                allowed,
                requested: amount,
            });
        }

        self.move_funds(owner, to, amount)?;

        // Consume allowance only after the movement succeeded.
        let remaining = allowed - amount;
        self.approve(owner, spender, remaining)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
