//! # Account Addresses
//!
//! An address is the ledger-facing identity of a participant. It is a
//! 32-byte BLAKE3 digest rendered through Bech32:
//!
//! ```text
//! label / key material (any bytes)
//!     -> BLAKE3(bytes) -> 32 bytes
//!     -> Bech32("slr", hash) -> slr1qw508d6qe...
//! ```
//!
//! The `slr` human-readable prefix (HRP) makes addresses immediately
//! recognizable. Bech32 encoding provides built-in error detection — it
//! can detect up to 4 character errors — which matters when operators are
//! copy-pasting addresses into governance tooling.
//!
//! ## The null address
//!
//! All-zero bytes form the [`Address::NULL`] sentinel. It is the "source"
//! of minted value and the "destination" of burned value in transfer
//! notifications, and it can never hold a balance: the share ledger
//! rejects it on both sides of every movement.

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The human-readable prefix for all Solera addresses.
const ADDRESS_HRP: &str = "slr";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while parsing an address.
#[derive(Debug, Error)]
pub enum AddressError {
    /// The Bech32 string could not be decoded.
    #[error("bech32 decode error: {0}")]
    Bech32Decode(String),

    /// The decoded address has an unexpected human-readable prefix.
    #[error("invalid HRP: expected '{expected}', got '{got}'")]
    InvalidHrp {
        /// The expected HRP.
        expected: String,
        /// The HRP that was actually found.
        got: String,
    },

    /// The decoded data has an unexpected length.
    #[error("invalid address data length: expected {expected} bytes, got {got}")]
    InvalidDataLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes.
        got: usize,
    },
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A Solera account address — the primary identity format across the ledger.
///
/// Internally a fixed 32-byte array; the Bech32 string is computed on the
/// fly. Equality, ordering, and hashing all operate on the raw bytes, so an
/// `Address` works as a map key and sorts deterministically in allowlists.
///
/// # Examples
///
/// ```
/// use solera_ledger::identity::Address;
///
/// let alice = Address::derive("alice");
/// let encoded = alice.to_bech32();
/// assert!(encoded.starts_with("slr1"));
///
/// let recovered: Address = encoded.parse().unwrap();
/// assert_eq!(alice, recovered);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 32]);

impl Address {
    /// The all-zero sentinel. Appears in transfer notifications as the
    /// source of mints and the destination of burns; never a real account.
    pub const NULL: Address = Address([0u8; 32]);

    /// Wraps raw 32-byte material as an address.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derives an address from an arbitrary label by BLAKE3-hashing it.
    ///
    /// Deterministic: the same label always produces the same address.
    /// This is how deployments mint their internal accounts (vault custody,
    /// bridge escrow) and how fixtures name their participants.
    pub fn derive(label: &str) -> Self {
        let digest = blake3::hash(label.as_bytes());
        Self(*digest.as_bytes())
    }

    /// Returns `true` if this is the all-zero sentinel.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Returns the raw 32-byte form.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encodes this address as a Bech32 string.
    ///
    /// The output has the form `slr1<bech32-encoded-bytes>` and includes
    /// a checksum for error detection.
    pub fn to_bech32(&self) -> String {
        let hrp = Hrp::parse(ADDRESS_HRP).expect("static HRP is valid");
        bech32::encode::<Bech32>(hrp, &self.0)
            .expect("encoding a 32-byte payload should never fail")
    }

    /// Parses a Bech32-encoded address string.
    ///
    /// Validates the HRP, checksum, and data length.
    pub fn from_bech32(addr: &str) -> Result<Self, AddressError> {
        let (hrp, data) =
            bech32::decode(addr).map_err(|e| AddressError::Bech32Decode(e.to_string()))?;

        let expected_hrp = Hrp::parse(ADDRESS_HRP).expect("static HRP is valid");
        if hrp != expected_hrp {
            return Err(AddressError::InvalidHrp {
                expected: ADDRESS_HRP.to_string(),
                got: hrp.to_string(),
            });
        }

        if data.len() != 32 {
            return Err(AddressError::InvalidDataLength {
                expected: 32,
                got: data.len(),
            });
        }

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&data);
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_bech32())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_bech32())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bech32(s)
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_bech32())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Address::from_bech32(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            if bytes.len() != 32 {
                return Err(serde::de::Error::custom(format!(
                    "expected 32-byte address, got {}",
                    bytes.len()
                )));
            }
            let mut raw = [0u8; 32];
            raw.copy_from_slice(&bytes);
            Ok(Address(raw))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
