//! # Identity Module
//!
//! Account identity for the Solera ledger. Every participant is identified
//! by a 32-byte address with a Bech32 rendering (human-readable,
//! checksummed, hard to fat-finger), and every privileged operation names
//! its caller explicitly.
//!
//! The identity stack is deliberately small:
//!
//! 1. **Address** — BLAKE3-derived 32-byte account identifier with the
//!    `slr` HRP. This is what operators see, share, and paste into
//!    governance tooling. The all-zero [`Address::NULL`] sentinel marks
//!    mint sources and burn destinations.
//! 2. **Roles** — minter, rate-setter, and governor gates checked against
//!    an explicit caller address on every privileged call.
//!
//! ## Design Decisions
//!
//! - Bech32 (not Bech32m) for addresses — we're encoding raw 32-byte
//!   digests, not witness programs. The error-detection properties of
//!   Bech32 are sufficient for our use case.
//! - Authorization is explicit-caller, not ambient: operations take the
//!   caller's address as an argument and check it against the stored role
//!   holder. Rotation is a single field write; auditing is a grep.

pub mod address;
pub mod roles;

pub use address::{Address, AddressError};
pub use roles::{require_role, Role, RoleError};
