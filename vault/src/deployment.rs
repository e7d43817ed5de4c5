//! # Deployment
//!
//! One Solera deployment wired together: the base asset ledger, the
//! rebasing token, the lock vault, and the bridge sink, with the custody
//! and escrow accounts derived deterministically from the network name.
//!
//! This is the unit a node serves and snapshots. All operations route
//! through here so the borrow of each ledger is split exactly once and
//! the node layer never touches two components out of step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use solera_ledger::config;
use solera_ledger::identity::Address;
use solera_ledger::rate::{Rate, SchedulePhase, Timestamp};
use solera_ledger::shares::{Assets, Shares};

use crate::base_asset::{AssetError, BaseAsset, CollateralLedger};
use crate::bridge::{BridgeTicket, Destination, StagedBridge};
use crate::lock_vault::{
    DepositReceipt, LockVault, RedeemReceipt, RedesignateReceipt, VaultConfig, VaultError,
};
use crate::rebasing_token::{
    Capability, RebaseNote, RebasingToken, TokenConfig, TokenError, TransferPolicy,
};

// ---------------------------------------------------------------------------
// DeploymentConfig
// ---------------------------------------------------------------------------

/// Everything needed to bootstrap a deployment from nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Network identifier, one of the `NETWORK_ID_*` constants.
    pub network: u32,
    /// Token display name.
    pub token_name: String,
    /// Token ticker.
    pub token_symbol: String,
    /// Token display decimals.
    pub token_decimals: u8,
    /// Base asset ticker.
    pub asset_symbol: String,
    /// Initial governor of the vault.
    pub governor: Address,
    /// Initial rate-setter of the token.
    pub rate_setter: Address,
    /// Ceiling for APR-style rebases.
    pub max_apr: Rate,
    /// Transfer surface policy for the token.
    pub transfer_policy: TransferPolicy,
}

impl DeploymentConfig {
    /// Protocol-default configuration on the given network.
    pub fn for_network(network: u32, governor: Address, rate_setter: Address) -> Self {
        let base = config::rate_base(config::DISPLAY_DECIMALS);
        Self {
            network,
            token_name: "Vintage SLR".to_string(),
            token_symbol: "vSLR".to_string(),
            token_decimals: config::DISPLAY_DECIMALS,
            asset_symbol: "SLR".to_string(),
            governor,
            rate_setter,
            max_apr: config::apr_from_bps(config::DEFAULT_MAX_APR_BPS, base),
            transfer_policy: TransferPolicy::Disabled,
        }
    }

    /// A devnet deployment with protocol defaults.
    pub fn devnet(governor: Address, rate_setter: Address) -> Self {
        Self::for_network(config::NETWORK_ID_DEVNET, governor, rate_setter)
    }
}

// ---------------------------------------------------------------------------
// Deployment
// ---------------------------------------------------------------------------

/// A fully wired deployment. Serializes as one document; a node snapshot
/// is exactly this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    network: u32,
    created_at: DateTime<Utc>,
    asset: CollateralLedger,
    token: RebasingToken,
    vault: LockVault,
    bridge: StagedBridge,
}

impl Deployment {
    /// Bootstraps a deployment: derives the custody and bridge escrow
    /// accounts from the network name, hands the custody account the
    /// minter role, and starts the token flat at its base rate.
    pub fn bootstrap(cfg: DeploymentConfig, now: Timestamp) -> Self {
        let network_name = config::network_name(cfg.network);
        let custody = Address::derive(&format!(
            "{}/{}/custody",
            config::PROTOCOL_FINGERPRINT,
            network_name
        ));
        let escrow = Address::derive(&format!(
            "{}/{}/bridge-escrow",
            config::PROTOCOL_FINGERPRINT,
            network_name
        ));

        let token = RebasingToken::new(
            TokenConfig {
                name: cfg.token_name,
                symbol: cfg.token_symbol,
                decimals: cfg.token_decimals,
                minter: custody,
                rate_setter: cfg.rate_setter,
                max_apr: cfg.max_apr,
                transfer_policy: cfg.transfer_policy,
            },
            now,
        );
        let vault = LockVault::new(VaultConfig {
            custody,
            governor: cfg.governor,
        });

        Self {
            network: cfg.network,
            created_at: DateTime::from_timestamp(now as i64, 0).unwrap_or_default(),
            asset: CollateralLedger::new(cfg.asset_symbol, cfg.token_decimals),
            token,
            vault,
            bridge: StagedBridge::new(escrow),
        }
    }

    // -- component views ------------------------------------------------------

    /// Network identifier.
    pub fn network(&self) -> u32 {
        self.network
    }

    /// When the deployment was bootstrapped.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The base asset ledger.
    pub fn asset(&self) -> &CollateralLedger {
        &self.asset
    }

    /// The rebasing token.
    pub fn token(&self) -> &RebasingToken {
        &self.token
    }

    /// The lock vault.
    pub fn vault(&self) -> &LockVault {
        &self.vault
    }

    /// The bridge sink with its ticket log.
    pub fn sink(&self) -> &StagedBridge {
        &self.bridge
    }

    // -- depositor operations ---------------------------------------------------

    /// Mints base asset to an account. Devnet and testnet plumbing; the
    /// node refuses to expose this on mainnet.
    pub fn fund(&mut self, account: &Address, amount: Assets) -> Result<(), AssetError> {
        self.asset.mint(account, amount)
    }

    /// Deposits base asset into the vault. See [`LockVault::deposit`].
    pub fn deposit(
        &mut self,
        caller: &Address,
        amount: Assets,
        destination: Destination,
        now: Timestamp,
    ) -> Result<DepositReceipt, VaultError> {
        self.vault
            .deposit(&mut self.asset, &mut self.token, caller, amount, destination, now)
    }

    /// Replaces the caller's bridge designation.
    pub fn redesignate(
        &mut self,
        caller: &Address,
        destination: Destination,
        now: Timestamp,
    ) -> Result<RedesignateReceipt, VaultError> {
        self.vault.redesignate(caller, destination, now)
    }

    /// Redeems display balance for base asset. See [`LockVault::redeem`].
    pub fn redeem(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: Assets,
        now: Timestamp,
    ) -> Result<RedeemReceipt, VaultError> {
        self.vault
            .redeem(&mut self.asset, &mut self.token, caller, to, amount, now)
    }

    // -- governor operations ------------------------------------------------

    /// Forwards custody to the bridge sink. See [`LockVault::bridge`].
    pub fn bridge(
        &mut self,
        caller: &Address,
        destination: &Destination,
        amount: Option<Assets>,
        now: Timestamp,
    ) -> Result<BridgeTicket, VaultError> {
        self.vault
            .bridge(&mut self.asset, &mut self.bridge, caller, destination, amount, now)
    }

    /// Pauses or resumes deposits and redesignations.
    pub fn set_frozen(&mut self, caller: &Address, frozen: bool) -> Result<(), VaultError> {
        self.vault.set_frozen(caller, frozen)
    }

    /// Opens or closes the redemption window.
    pub fn set_redemptions_open(&mut self, caller: &Address, open: bool) -> Result<(), VaultError> {
        self.vault.set_redemptions_open(caller, open)
    }

    /// Hands the governor role to a new address.
    pub fn transfer_governance(
        &mut self,
        caller: &Address,
        new_governor: Address,
    ) -> Result<(), VaultError> {
        self.vault.transfer_governance(caller, new_governor)
    }

    // -- rate-setter operations -----------------------------------------------

    /// Arms a rebase toward an explicit target rate.
    pub fn rebase_by_rate(
        &mut self,
        caller: &Address,
        target: Rate,
        end: Timestamp,
        now: Timestamp,
    ) -> Result<RebaseNote, TokenError> {
        self.token.rebase_by_rate(caller, target, end, now)
    }

    /// Arms a rebase from a yearly rate of increase.
    pub fn rebase_by_apr(
        &mut self,
        caller: &Address,
        apr: Rate,
        end: Timestamp,
        now: Timestamp,
    ) -> Result<RebaseNote, TokenError> {
        self.token.rebase_by_apr(caller, apr, end, now)
    }

    /// Toggles display suppression on the token.
    pub fn set_display_suppressed(
        &mut self,
        caller: &Address,
        suppressed: bool,
    ) -> Result<(), TokenError> {
        self.token.set_display_suppressed(caller, suppressed)
    }

    // -- status ---------------------------------------------------------------

    /// A point-in-time summary of the whole deployment.
    pub fn status(&self, now: Timestamp) -> Result<DeploymentStatus, TokenError> {
        Ok(DeploymentStatus {
            network: config::network_name(self.network),
            created_at: self.created_at,
            token_name: self.token.name().to_string(),
            token_symbol: self.token.symbol().to_string(),
            asset_symbol: self.asset.symbol().to_string(),
            capabilities: self.token.capabilities().to_vec(),
            frozen: self.vault.is_frozen(),
            redemptions_open: self.vault.redemptions_open(),
            display_suppressed: self.token.is_display_suppressed(),
            schedule_phase: self.token.schedule_phase(now),
            current_rate: self.token.share_rate(now),
            target_rate: self.token.timeline().next_rate(),
            update_end: self.token.timeline().update_end(),
            total_shares: self.token.total_shares(),
            total_supply: self.token.total_supply(now)?,
            custody_balance: self.asset.balance_of(self.vault.custody()),
            holders: self.token.holder_count(),
            bridge_transfers: self.bridge.tickets().len(),
            designations: self.vault.designations().len(),
        })
    }
}

/// What [`Deployment::status`] reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentStatus {
    /// Human name of the network.
    pub network: String,
    /// When the deployment was bootstrapped.
    pub created_at: DateTime<Utc>,
    /// Token display name.
    pub token_name: String,
    /// Token ticker.
    pub token_symbol: String,
    /// Base asset ticker.
    pub asset_symbol: String,
    /// The token's capability set.
    pub capabilities: Vec<Capability>,
    /// Whether deposits and redesignations are paused.
    pub frozen: bool,
    /// Whether the redemption window is open.
    pub redemptions_open: bool,
    /// Whether per-holder balances currently read zero.
    pub display_suppressed: bool,
    /// Where the rate schedule sits right now.
    pub schedule_phase: SchedulePhase,
    /// The live share rate.
    pub current_rate: Rate,
    /// The rate the current segment settles at.
    pub target_rate: Rate,
    /// When the current segment settles.
    pub update_end: Timestamp,
    /// Total shares outstanding.
    pub total_shares: Shares,
    /// Display value of the entire supply.
    pub total_supply: Assets,
    /// Base asset held in custody.
    pub custody_balance: Assets,
    /// Number of share holders.
    pub holders: usize,
    /// Number of bridge tickets issued so far.
    pub bridge_transfers: usize,
    /// Number of designations on record.
    pub designations: usize,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
