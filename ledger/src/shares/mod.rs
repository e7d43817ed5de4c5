//! # Shares Module
//!
//! Rate-independent balance accounting. Holdings live here as share
//! counts; their asset value is a view computed against whatever rate the
//! caller supplies. Keeping the two representations strictly separated is
//! what makes a rebase O(1): the rate moves, the ledger doesn't.
//!
//! The conversion functions are free-standing and pure so that every
//! layer — token, vault, tests — applies exactly the same floor-rounding
//! arithmetic. There is one way to turn assets into shares in this
//! codebase, and it lives in this module.

pub mod ledger;

pub use ledger::{assets_to_shares, shares_to_assets, Assets, ShareError, ShareLedger, Shares};
