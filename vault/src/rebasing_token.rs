//! # Rebasing Token
//!
//! The deposit receipt of a Solera deployment. Balances are held as
//! shares in a [`ShareLedger`]; what a balance *displays* as is the share
//! count valued at the live rate on the token's [`RateTimeline`]. Yield
//! is therefore a pure function of the clock — no per-holder payout loop
//! exists anywhere in the system.
//!
//! ## Rate schedule
//!
//! Governance moves the rate two ways, both gated on the rate-setter
//! role:
//!
//! * **by rate** — name the target directly. Validated against the
//!   *anchored* rate of the current segment (the rate snapshotted when
//!   that segment was armed), not the live interpolated value. A
//!   mid-ramp re-target between anchor and live is therefore accepted
//!   and plays out as a shallow decreasing segment — deliberate, so a
//!   schedule armed too steep can be corrected without waiting out the
//!   window.
//! * **by APR** — name a yearly rate of increase and a settlement
//!   instant; the target is computed from the *live* rate, pro-rated
//!   over the window. Capped by the token's APR ceiling.
//!
//! ## Transfer surface
//!
//! This token is an accounting instrument, not a medium of exchange.
//! Under the default [`TransferPolicy::Disabled`] the entire legacy
//! transfer surface — `transfer`, `approve`, `transfer_from` — fails
//! without mutating anything, and `allowance` reports zero for every
//! pair. Deployments that need vetted movement (market-maker rebalancing
//! during the lock window) run [`TransferPolicy::Allowlist`], which
//! admits transfers only toward destinations the rate-setter has listed.
//!
//! ## Display suppression
//!
//! A migration switch: when engaged, `balance_of` reports zero for every
//! account while `total_supply` and all share accounting stay live.
//! Downstream indexers see holders flatten without the supply lying.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use solera_ledger::config;
use solera_ledger::identity::{require_role, Address, Role, RoleError};
use solera_ledger::rate::{Rate, RateTimeline, SchedulePhase, Timestamp};
use solera_ledger::shares::{self, Assets, ShareError, ShareLedger, Shares};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during token operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The proposed target is below the anchored rate of the current
    /// segment. Balances never shrink below what the anchor promised.
    #[error("rate decrease not allowed: proposed {proposed} is below the anchored rate {floor}")]
    NegativeRebaseNotAllowed {
        /// The rejected target rate.
        proposed: Rate,
        /// The anchored rate it fell below.
        floor: Rate,
    },

    /// The schedule must settle strictly in the future.
    #[error("rebase must settle in the future: end {end} is not after now {now}")]
    UpdateMustBeInFuture {
        /// The rejected settlement instant.
        end: Timestamp,
        /// The clock the caller supplied.
        now: Timestamp,
    },

    /// The requested APR exceeds the token's configured ceiling.
    #[error("apr {apr} exceeds the configured ceiling {ceiling}")]
    AprTooHigh {
        /// The rejected APR, in rate units per year.
        apr: Rate,
        /// The token's ceiling.
        ceiling: Rate,
    },

    /// The computed or named target exceeds the protocol rate ceiling.
    /// `proposed` is a `u128` because an APR-derived target can blow past
    /// the representable rate range before the check catches it.
    #[error("target rate {proposed} exceeds the protocol ceiling {ceiling}")]
    RateAboveCeiling {
        /// The rejected target.
        proposed: u128,
        /// The protocol-wide ceiling.
        ceiling: Rate,
    },

    /// Direct transfers are not part of this token's surface.
    #[error("direct transfers are not supported by this token")]
    TransferNotSupported,

    /// Approvals are not part of this token's surface.
    #[error("approvals are not supported by this token")]
    ApprovalsNotSupported,

    /// Delegated transfers are not part of this token's surface.
    #[error("delegated transfers are not supported by this token")]
    TransferFromNotSupported,

    /// The transfer destination has not been allowlisted.
    #[error("destination {destination} is not on the transfer allowlist")]
    NotWhitelisted {
        /// The destination that was refused.
        destination: Address,
    },

    /// The spender's allowance does not cover the delegated transfer.
    #[error("allowance granted to {spender} is {allowed}, transfer requires {requested}")]
    InsufficientAllowance {
        /// The account attempting the delegated transfer.
        spender: Address,
        /// The current allowance.
        allowed: Assets,
        /// The amount the transfer needs.
        requested: Assets,
    },

    /// Allowlist management on a token whose policy has no allowlist.
    #[error("transfer policy of this token does not use an allowlist")]
    NoAllowlist,

    /// Share accounting failed.
    #[error(transparent)]
    Shares(#[from] ShareError),

    /// The caller lacks the required role.
    #[error(transparent)]
    Role(#[from] RoleError),
}

// ---------------------------------------------------------------------------
// Capabilities & Policy
// ---------------------------------------------------------------------------

/// What a deployment can rely on this token to do — and to refuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capability {
    /// Supply is created and destroyed through the minter role.
    Mintable,
    /// The share rate moves on a governance-armed schedule.
    RateAdjustable,
    /// Free transfer is never available. The allowlist policy relaxes
    /// this only toward destinations vetted by the rate-setter.
    NonTransferable,
}

/// How the token treats the legacy transfer surface.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransferPolicy {
    /// The entire surface fails. The default, and what mainnet runs.
    #[default]
    Disabled,
    /// Transfers are admitted only toward listed destinations, with
    /// allowances for the delegated path. The set is managed by the
    /// rate-setter.
    Allowlist(BTreeSet<Address>),
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// The observable record of a supply or holding movement. Mints carry a
/// null source, burns a null destination — the same shape downstream
/// indexers already understand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferNote {
    /// Unique note identifier (UUID v4).
    pub id: Uuid,
    /// Where the value came from. `None` for mints.
    pub source: Option<Address>,
    /// Where the value went. `None` for burns.
    pub destination: Option<Address>,
    /// The movement in display asset units, as requested.
    pub assets: Assets,
    /// The movement in shares, as booked.
    pub shares: Shares,
    /// When the movement happened.
    pub at: Timestamp,
}

/// The observable record of an armed rebase schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebaseNote {
    /// Unique note identifier (UUID v4).
    pub id: Uuid,
    /// The live rate snapshotted as the new segment's anchor.
    pub anchored_rate: Rate,
    /// The rate the segment will settle at.
    pub target_rate: Rate,
    /// When the segment settles.
    pub update_end: Timestamp,
    /// When the segment was armed.
    pub at: Timestamp,
}

// ---------------------------------------------------------------------------
// TokenConfig
// ---------------------------------------------------------------------------

/// Construction parameters for a [`RebasingToken`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Full display name, e.g. "Vintage SLR".
    pub name: String,
    /// Ticker, e.g. "vSLR".
    pub symbol: String,
    /// Display decimals; also fixes the rate base at `10^decimals`.
    pub decimals: u8,
    /// Initial holder of the minter role.
    pub minter: Address,
    /// Initial holder of the rate-setter role.
    pub rate_setter: Address,
    /// Ceiling for APR-style rebases, in rate units per year.
    pub max_apr: Rate,
    /// Transfer surface policy.
    pub transfer_policy: TransferPolicy,
}

impl TokenConfig {
    /// A config with protocol defaults: standard decimals, the default
    /// APR ceiling, and the transfer surface disabled.
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        minter: Address,
        rate_setter: Address,
    ) -> Self {
        let base = config::rate_base(config::DISPLAY_DECIMALS);
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals: config::DISPLAY_DECIMALS,
            minter,
            rate_setter,
            max_apr: config::apr_from_bps(config::DEFAULT_MAX_APR_BPS, base),
            transfer_policy: TransferPolicy::Disabled,
        }
    }
}

// ---------------------------------------------------------------------------
// RebasingToken
// ---------------------------------------------------------------------------

/// A non-transferable, rate-rebasing deposit receipt.
///
/// Owns the share ledger and the rate timeline; everything else in the
/// deployment reads balances through here so suppression and policy are
/// applied in exactly one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebasingToken {
    name: String,
    symbol: String,
    decimals: u8,
    /// `10^decimals`, the rate at which one share equals one asset unit.
    base: Rate,
    minter: Address,
    rate_setter: Address,
    max_apr: Rate,
    display_suppressed: bool,
    transfer_policy: TransferPolicy,
    /// allowances[owner][spender]; only populated under the allowlist
    /// policy. Nested maps so snapshots stay plain JSON.
    allowances: HashMap<Address, HashMap<Address, Assets>>,
    ledger: ShareLedger,
    timeline: RateTimeline,
}

impl RebasingToken {
    /// Creates a token with a flat rate of one asset per share.
    ///
    /// The rate starts at the base and the validation rules keep every
    /// later target at or above the segment anchors that descend from
    /// it, so a share is never displayed below its deposit value.
    pub fn new(cfg: TokenConfig, now: Timestamp) -> Self {
        let decimals = cfg.decimals.min(config::MAX_DECIMALS);
        let base = config::rate_base(decimals);
        Self {
            name: cfg.name,
            symbol: cfg.symbol,
            decimals,
            base,
            minter: cfg.minter,
            rate_setter: cfg.rate_setter,
            max_apr: cfg.max_apr,
            display_suppressed: false,
            transfer_policy: cfg.transfer_policy,
            allowances: HashMap::new(),
            ledger: ShareLedger::new(),
            timeline: RateTimeline::flat(base, now),
        }
    }

    // -- metadata -----------------------------------------------------------

    /// Full display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Display decimals.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// The fixed-point base: `10^decimals`.
    pub fn base(&self) -> Rate {
        self.base
    }

    /// Current holder of the minter role.
    pub fn minter(&self) -> &Address {
        &self.minter
    }

    /// Current holder of the rate-setter role.
    pub fn rate_setter(&self) -> &Address {
        &self.rate_setter
    }

    /// Ceiling for APR-style rebases.
    pub fn max_apr(&self) -> Rate {
        self.max_apr
    }

    /// Whether `balance_of` is currently reporting zero for everyone.
    pub fn is_display_suppressed(&self) -> bool {
        self.display_suppressed
    }

    /// The transfer surface policy in force.
    pub fn transfer_policy(&self) -> &TransferPolicy {
        &self.transfer_policy
    }

    /// What this token does and refuses to do. Fixed for the life of
    /// the deployment.
    pub fn capabilities(&self) -> &'static [Capability] {
        &[
            Capability::Mintable,
            Capability::RateAdjustable,
            Capability::NonTransferable,
        ]
    }

    // -- rate views ---------------------------------------------------------

    /// The live share rate at instant `now`.
    pub fn share_rate(&self, now: Timestamp) -> Rate {
        self.timeline.current_rate(now)
    }

    /// Where the rate schedule sits at instant `now`.
    pub fn schedule_phase(&self, now: Timestamp) -> SchedulePhase {
        self.timeline.phase(now)
    }

    /// The full timeline, for status reporting.
    pub fn timeline(&self) -> &RateTimeline {
        &self.timeline
    }

    /// Converts an asset amount to shares at the live rate.
    pub fn assets_to_shares(&self, assets: Assets, now: Timestamp) -> Result<Shares, TokenError> {
        Ok(shares::assets_to_shares(
            assets,
            self.share_rate(now),
            self.base,
        )?)
    }

    /// Converts a share count to assets at the live rate.
    pub fn shares_to_assets(&self, count: Shares, now: Timestamp) -> Result<Assets, TokenError> {
        Ok(shares::shares_to_assets(
            count,
            self.share_rate(now),
            self.base,
        )?)
    }

    // -- balance views ------------------------------------------------------

    /// The display balance of an account at instant `now`: its shares
    /// valued at the live rate, or zero while display is suppressed.
    pub fn balance_of(&self, account: &Address, now: Timestamp) -> Result<Assets, TokenError> {
        if self.display_suppressed {
            return Ok(0);
        }
        Ok(self
            .ledger
            .balance_in_assets(account, self.share_rate(now), self.base)?)
    }

    /// The display value of the entire supply at instant `now`. Not
    /// affected by display suppression: the supply never lies, only the
    /// per-holder view goes dark.
    pub fn total_supply(&self, now: Timestamp) -> Result<Assets, TokenError> {
        Ok(self.ledger.total_assets(self.share_rate(now), self.base)?)
    }

    /// The raw share holding of an account. Suppression does not apply —
    /// shares are the accounting record, not the display.
    pub fn shares_of(&self, account: &Address) -> Shares {
        self.ledger.shares_of(account)
    }

    /// The total share supply.
    pub fn total_shares(&self) -> Shares {
        self.ledger.total_shares()
    }

    /// The number of accounts holding shares.
    pub fn holder_count(&self) -> usize {
        self.ledger.holder_count()
    }

    // -- supply (minter role) -----------------------------------------------

    /// Mints the share equivalent of `assets` to `account` at the live
    /// rate. Gated on the minter role.
    pub fn mint_assets(
        &mut self,
        caller: &Address,
        account: &Address,
        assets: Assets,
        now: Timestamp,
    ) -> Result<TransferNote, TokenError> {
        require_role(Role::Minter, &self.minter, caller)?;

        let booked = self.assets_to_shares(assets, now)?;
        self.ledger.mint(account, booked)?;

        Ok(TransferNote {
            id: Uuid::new_v4(),
            source: None,
            destination: Some(*account),
            assets,
            shares: booked,
            at: now,
        })
    }

    /// Burns the share equivalent of `assets` from `account` at the live
    /// rate. Gated on the minter role.
    pub fn burn_assets(
        &mut self,
        caller: &Address,
        account: &Address,
        assets: Assets,
        now: Timestamp,
    ) -> Result<TransferNote, TokenError> {
        require_role(Role::Minter, &self.minter, caller)?;

        let booked = self.assets_to_shares(assets, now)?;
        self.ledger.burn(account, booked)?;

        Ok(TransferNote {
            id: Uuid::new_v4(),
            source: Some(*account),
            destination: None,
            assets,
            shares: booked,
            at: now,
        })
    }

    // -- rebase (rate-setter role) ------------------------------------------

    /// Arms a schedule toward an explicitly named target rate.
    ///
    /// The floor for the target is the *anchored* rate of the segment
    /// being replaced — see the module docs for why that asymmetry is
    /// kept on purpose.
    pub fn rebase_by_rate(
        &mut self,
        caller: &Address,
        target: Rate,
        end: Timestamp,
        now: Timestamp,
    ) -> Result<RebaseNote, TokenError> {
        require_role(Role::RateSetter, &self.rate_setter, caller)?;
        self.arm_schedule(u128::from(target), end, now)
    }

    /// Arms a schedule whose target is the live rate grown by `apr`
    /// (rate units per year) pro-rated over the window ending at `end`.
    pub fn rebase_by_apr(
        &mut self,
        caller: &Address,
        apr: Rate,
        end: Timestamp,
        now: Timestamp,
    ) -> Result<RebaseNote, TokenError> {
        require_role(Role::RateSetter, &self.rate_setter, caller)?;

        if apr > self.max_apr {
            return Err(TokenError::AprTooHigh {
                apr,
                ceiling: self.max_apr,
            });
        }

        // A window in the past yields a zero span here; arm_schedule
        // rejects the end-instant itself with the proper error.
        let span = end.saturating_sub(now);
        let increase = u128::from(apr) * u128::from(span) / u128::from(config::SECONDS_PER_YEAR);
        let target = u128::from(self.share_rate(now)) + increase;

        self.arm_schedule(target, end, now)
    }

    /// Shared rebase validation and arming. `target` arrives as a
    /// `u128` because the APR path can compute past the rate range;
    /// everything in range is narrowed after the ceiling check.
    fn arm_schedule(
        &mut self,
        target: u128,
        end: Timestamp,
        now: Timestamp,
    ) -> Result<RebaseNote, TokenError> {
        let floor = self.timeline.last_rate();
        if target < u128::from(floor) {
            return Err(TokenError::NegativeRebaseNotAllowed {
                proposed: target as Rate,
                floor,
            });
        }
        if target > u128::from(config::MAX_RATE) {
            return Err(TokenError::RateAboveCeiling {
                proposed: target,
                ceiling: config::MAX_RATE,
            });
        }
        if end <= now {
            return Err(TokenError::UpdateMustBeInFuture { end, now });
        }

        let target = target as Rate;
        let anchored = self.timeline.reschedule(target, end, now);
        Ok(RebaseNote {
            id: Uuid::new_v4(),
            anchored_rate: anchored,
            target_rate: target,
            update_end: end,
            at: now,
        })
    }

    // -- administration (rate-setter role) ------------------------------------

    /// Toggles display suppression.
    pub fn set_display_suppressed(
        &mut self,
        caller: &Address,
        suppressed: bool,
    ) -> Result<(), TokenError> {
        require_role(Role::RateSetter, &self.rate_setter, caller)?;
        self.display_suppressed = suppressed;
        Ok(())
    }

    /// Hands the minter role to a new address.
    pub fn set_minter(&mut self, caller: &Address, new_minter: Address) -> Result<(), TokenError> {
        require_role(Role::RateSetter, &self.rate_setter, caller)?;
        self.minter = new_minter;
        Ok(())
    }

    /// Hands the rate-setter role to a new address. The old holder loses
    /// every gate this file checks, including this one.
    pub fn set_rate_setter(
        &mut self,
        caller: &Address,
        new_rate_setter: Address,
    ) -> Result<(), TokenError> {
        require_role(Role::RateSetter, &self.rate_setter, caller)?;
        self.rate_setter = new_rate_setter;
        Ok(())
    }

    /// Adds a destination to the transfer allowlist.
    pub fn allow_destination(
        &mut self,
        caller: &Address,
        destination: Address,
    ) -> Result<(), TokenError> {
        require_role(Role::RateSetter, &self.rate_setter, caller)?;
        match &mut self.transfer_policy {
            TransferPolicy::Disabled => Err(TokenError::NoAllowlist),
            TransferPolicy::Allowlist(listed) => {
                listed.insert(destination);
                Ok(())
            }
        }
    }

    /// Removes a destination from the transfer allowlist.
    pub fn revoke_destination(
        &mut self,
        caller: &Address,
        destination: &Address,
    ) -> Result<(), TokenError> {
        require_role(Role::RateSetter, &self.rate_setter, caller)?;
        match &mut self.transfer_policy {
            TransferPolicy::Disabled => Err(TokenError::NoAllowlist),
            TransferPolicy::Allowlist(listed) => {
                listed.remove(destination);
                Ok(())
            }
        }
    }

    // -- legacy transfer surface ----------------------------------------------

    /// Moves `assets` worth of shares from the caller to `to`.
    ///
    /// Fails with [`TokenError::TransferNotSupported`] under the default
    /// policy; under the allowlist policy the destination must be listed.
    pub fn transfer(
        &mut self,
        caller: &Address,
        to: &Address,
        assets: Assets,
        now: Timestamp,
    ) -> Result<TransferNote, TokenError> {
        match &self.transfer_policy {
            TransferPolicy::Disabled => Err(TokenError::TransferNotSupported),
            TransferPolicy::Allowlist(listed) => {
                if !listed.contains(to) {
                    return Err(TokenError::NotWhitelisted { destination: *to });
                }
                let booked = self.assets_to_shares(assets, now)?;
                self.ledger.move_shares(caller, to, booked)?;
                Ok(TransferNote {
                    id: Uuid::new_v4(),
                    source: Some(*caller),
                    destination: Some(*to),
                    assets,
                    shares: booked,
                    at: now,
                })
            }
        }
    }

    /// Grants `spender` the right to move up to `assets` out of the
    /// caller's holding. Fails under the default policy.
    pub fn approve(
        &mut self,
        caller: &Address,
        spender: &Address,
        assets: Assets,
    ) -> Result<(), TokenError> {
        match &self.transfer_policy {
            TransferPolicy::Disabled => Err(TokenError::ApprovalsNotSupported),
            TransferPolicy::Allowlist(_) => {
                let per_spender = self.allowances.entry(*caller).or_default();
                if assets == 0 {
                    per_spender.remove(spender);
                    if per_spender.is_empty() {
                        self.allowances.remove(caller);
                    }
                } else {
                    per_spender.insert(*spender, assets);
                }
                Ok(())
            }
        }
    }

    /// The remaining allowance from `owner` to `spender`. Always zero
    /// under the default policy — the legacy surface reports inert, it
    /// never errors on reads.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Assets {
        match &self.transfer_policy {
            TransferPolicy::Disabled => 0,
            TransferPolicy::Allowlist(_) => self
                .allowances
                .get(owner)
                .and_then(|per_spender| per_spender.get(spender))
                .copied()
                .unwrap_or(0),
        }
    }

    /// Moves `assets` worth of shares out of `from` on the caller's
    /// allowance. Fails under the default policy; under the allowlist
    /// policy the destination must be listed and the allowance must
    /// cover the amount.
    pub fn transfer_from(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        assets: Assets,
        now: Timestamp,
    ) -> Result<TransferNote, TokenError> {
        match &self.transfer_policy {
            TransferPolicy::Disabled => Err(TokenError::TransferFromNotSupported),
            TransferPolicy::Allowlist(listed) => {
                if !listed.contains(to) {
                    return Err(TokenError::NotWhitelisted { destination: *to });
                }
                let allowed = self.allowance(from, caller);
                if allowed < assets {
                    return Err(TokenError::InsufficientAllowance {
                        spender: *caller,
                        allowed,
                        requested: assets,
                    });
                }

                let booked = self.assets_to_shares(assets, now)?;
                self.ledger.move_shares(from, to, booked)?;

                // Consume allowance only after the movement succeeded.
                let remaining = allowed - assets;
                let per_spender = self.allowances.entry(*from).or_default();
                if remaining == 0 {
                    per_spender.remove(caller);
                    if per_spender.is_empty() {
                        self.allowances.remove(from);
                    }
                } else {
                    per_spender.insert(*caller, remaining);
                }

                Ok(TransferNote {
                    id: Uuid::new_v4(),
                    source: Some(*from),
                    destination: Some(*to),
                    assets,
                    shares: booked,
                    at: now,
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
