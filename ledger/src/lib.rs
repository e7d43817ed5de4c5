// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Solera Ledger — Core Library
//!
//! This is the accounting heart of Solera: a rebasing deposit ledger built
//! for the world where balances must grow on a published schedule and
//! auditors must be able to re-derive every number from first principles.
//!
//! Solera takes a pragmatic stance: balances are share counts (because
//! per-holder rebase loops are how exploits happen), the share rate moves
//! along a linear timeline (because step functions invite sniping), and
//! every conversion floors (because rounding in the user's favor is how
//! vaults go insolvent one dust-grain at a time).
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the actual concerns of a
//! deposit program:
//!
//! - **identity** — Addresses and role gates. Your address, your authority.
//! - **rate** — The governance-scheduled rate timeline. Pure geometry.
//! - **shares** — Share balances and asset conversions. The source of truth.
//! - **config** — Protocol constants and network parameters.
//!
//! ## Design Philosophy
//!
//! 1. Shares are stored; asset values are derived. Never the reverse.
//! 2. Time is an explicit argument. Nothing in this crate reads a clock.
//! 3. All amount arithmetic is checked. Overflow is an error, not a panic.
//! 4. If it touches money, it has tests. Plural.

pub mod config;
pub mod identity;
pub mod rate;
pub mod shares;
