//! # Bridge Sink
//!
//! Pooled custody leaves a deployment exactly one way: the governor asks
//! the vault to forward value, the vault grants the sink an allowance,
//! and the sink pulls the funds into its own escrow account. The
//! approve-then-pull shape means the sink never holds authority it wasn't
//! just handed, and a failed pull leaves custody where it was.
//!
//! [`BridgeSink`] is the trait the vault forwards into; [`StagedBridge`]
//! is the in-process implementation that escrows pulled funds and records
//! a [`BridgeTicket`] per transfer. Deployments that settle to a live
//! bridge swap in their own sink; the vault neither knows nor cares.
//!
//! Destinations are opaque 32-byte identifiers on the receiving chain —
//! not Solera addresses — so they get their own type and their own hex
//! rendering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use solera_ledger::identity::Address;
use solera_ledger::rate::Timestamp;
use solera_ledger::shares::Assets;

use crate::base_asset::{AssetError, BaseAsset};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while parsing a destination identifier.
#[derive(Debug, Error)]
pub enum DestinationError {
    /// The string is not valid hex.
    #[error("invalid destination hex: {0}")]
    InvalidHex(String),

    /// The decoded bytes have the wrong length.
    #[error("invalid destination length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes.
        got: usize,
    },
}

/// Errors that can occur while forwarding custody to a sink.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The all-zero destination is a burn, not a bridge.
    #[error("bridge destination cannot be the null identifier")]
    NullDestination,

    /// Forwarding zero value records nothing on the far side.
    #[error("cannot forward zero value to the bridge")]
    ZeroForward,

    /// The underlying asset movement failed.
    #[error(transparent)]
    Asset(#[from] AssetError),
}

// ---------------------------------------------------------------------------
// Destination
// ---------------------------------------------------------------------------

/// A 32-byte account identifier on the destination chain.
///
/// Rendered as 64 lowercase hex characters. Parsing tolerates an `0x`
/// prefix because every wallet on earth exports addresses with one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Destination([u8; 32]);

impl Destination {
    /// The all-zero identifier. Never a valid bridge target.
    pub const NULL: Destination = Destination([0u8; 32]);

    /// Wraps raw 32-byte material as a destination.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns `true` if this is the all-zero identifier.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Returns the raw 32-byte form.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parses a destination from hex, with or without an `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, DestinationError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes =
            hex::decode(stripped).map_err(|e| DestinationError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(DestinationError::InvalidLength {
                expected: 32,
                got: bytes.len(),
            });
        }
        let mut raw = [0u8; 32];
        raw.copy_from_slice(&bytes);
        Ok(Self(raw))
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Destination({})", hex::encode(self.0))
    }
}

impl FromStr for Destination {
    type Err = DestinationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Destination {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(self.0))
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Destination {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Destination::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            if bytes.len() != 32 {
                return Err(serde::de::Error::custom(format!(
                    "expected 32-byte destination, got {}",
                    bytes.len()
                )));
            }
            let mut raw = [0u8; 32];
            raw.copy_from_slice(&bytes);
            Ok(Destination(raw))
        }
    }
}

// ---------------------------------------------------------------------------
// BridgeTicket
// ---------------------------------------------------------------------------

/// The receipt a sink returns for each forwarded transfer. The far side
/// of the bridge reconciles against these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeTicket {
    /// Unique ticket identifier (UUID v4).
    pub id: Uuid,
    /// Where on the destination chain the value is headed.
    pub destination: Destination,
    /// How much collateral was forwarded.
    pub amount: Assets,
    /// When the transfer was initiated.
    pub initiated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// BridgeSink
// ---------------------------------------------------------------------------

/// The far edge of a deployment: something that consumes an approved
/// custody allowance and takes responsibility for delivery.
pub trait BridgeSink {
    /// The address under which this sink consumes allowances. The vault
    /// approves this account before asking the sink to pull.
    fn escrow(&self) -> &Address;

    /// Pulls `amount` out of `custodian` (using the allowance granted to
    /// [`escrow`](Self::escrow)) for delivery to `destination`.
    ///
    /// Implementations must either complete the pull and return a ticket
    /// or leave the asset ledger untouched.
    fn initiate_transfer(
        &mut self,
        asset: &mut dyn BaseAsset,
        custodian: &Address,
        destination: &Destination,
        amount: Assets,
        now: Timestamp,
    ) -> Result<BridgeTicket, BridgeError>;
}

// ---------------------------------------------------------------------------
// StagedBridge
// ---------------------------------------------------------------------------

/// A sink that escrows pulled custody in its own account and keeps a
/// ticket log. Stands in for a live bridge in deployments and tests;
/// the escrow account is where an external relayer would pick funds up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedBridge {
    /// The sink's own account: allowances are granted to it and pulled
    /// funds land in it.
    escrow: Address,
    /// Every transfer this sink has initiated, in order.
    tickets: Vec<BridgeTicket>,
}

impl StagedBridge {
    /// Creates a sink escrowing into the given account.
    pub fn new(escrow: Address) -> Self {
        Self {
            escrow,
            tickets: Vec::new(),
        }
    }

    /// Every ticket issued so far, oldest first.
    pub fn tickets(&self) -> &[BridgeTicket] {
        &self.tickets
    }

    /// Lifetime sum of forwarded collateral. `u128` because the same
    /// units can cross more than once over a deployment's life.
    pub fn total_forwarded(&self) -> u128 {
        self.tickets.iter().map(|t| u128::from(t.amount)).sum()
    }
}

impl BridgeSink for StagedBridge {
    fn escrow(&self) -> &Address {
        &self.escrow
    }

    fn initiate_transfer(
        &mut self,
        asset: &mut dyn BaseAsset,
        custodian: &Address,
        destination: &Destination,
        amount: Assets,
        now: Timestamp,
    ) -> Result<BridgeTicket, BridgeError> {
        if destination.is_null() {
            return Err(BridgeError::NullDestination);
        }
        if amount == 0 {
            return Err(BridgeError::ZeroForward);
        }

        let escrow = self.escrow;
        asset.transfer_from(&escrow, custodian, &escrow, amount)?;

        let ticket = BridgeTicket {
            id: Uuid::new_v4(),
            destination: *destination,
            amount,
            initiated_at: now,
        };
        self.tickets.push(ticket.clone());
        Ok(ticket)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
