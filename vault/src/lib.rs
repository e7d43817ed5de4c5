//! # Solera Vault
//!
//! The deposit-side machinery of a Solera deployment. The ledger crate
//! knows how shares and rates behave; this crate knows who may move them
//! and where the pooled value goes:
//!
//! - **Rebasing Token** — the non-transferable deposit receipt whose
//!   display balance grows along a governance-armed rate schedule.
//! - **Lock Vault** — deposit, designate, redeem, and bridge operations
//!   over a pooled custody account, each behind its own gate.
//! - **Bridge** — destination identifiers, the sink trait, and a staged
//!   in-process sink that records every forwarded batch.
//! - **Base Asset** — the collateral ledger trait the vault pulls from
//!   and pays into, plus an in-memory implementation for nodes and tests.
//! - **Deployment** — all of the above wired together, bootstrapped
//!   deterministically and serializable as one snapshot document.
//!
//! ## Design Principles
//!
//! 1. Balances are stored as shares; display assets are derived at query
//!    time. No operation walks holders to pay yield.
//! 2. Authorization is explicit: every privileged operation takes the
//!    caller and checks it against the role on record.
//! 3. All monetary operations check for overflow — `checked_add` and
//!    `checked_sub` everywhere, because wrapping arithmetic and money do
//!    not mix.
//! 4. Operations either complete or leave every ledger untouched; each
//!    multi-step path carries its own unwind.
//! 5. Every public type is serializable (serde) for wire transport and
//!    persistent storage.

pub mod base_asset;
pub mod bridge;
pub mod deployment;
pub mod lock_vault;
pub mod rebasing_token;
