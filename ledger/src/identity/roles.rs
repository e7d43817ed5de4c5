//! # Role Gates
//!
//! Every privileged mutation in Solera names the caller explicitly — there
//! is no ambient "current sender" smuggled in through thread-local state.
//! A component that owns a privileged operation stores the address of the
//! role holder and checks the caller against it with [`require_role`].
//!
//! Three roles exist:
//!
//! * **Minter** — may create and destroy token supply. Held by the vault's
//!   custody account after deployment wiring, so only deposits mint.
//! * **RateSetter** — may schedule rebases and toggle display suppression.
//! * **Governor** — may freeze the lock window, open redemptions, forward
//!   custody to the bridge, and hand governance over.
//!
//! Roles are plain addresses, which makes rotation a one-field write and
//! keeps the authorization story auditable: grep for `require_role` and
//! you have the complete privileged surface.

use std::fmt;

use thiserror::Error;

use super::address::Address;

/// The privileged capabilities recognized across the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// May mint and burn token supply.
    Minter,
    /// May schedule rebases and toggle display behavior.
    RateSetter,
    /// May operate the vault's lock, redemption, and bridge controls.
    Governor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Minter => write!(f, "minter"),
            Role::RateSetter => write!(f, "rate-setter"),
            Role::Governor => write!(f, "governor"),
        }
    }
}

/// Errors produced by role checks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoleError {
    /// The caller does not hold the role required for this operation.
    #[error("unauthorized: {caller} does not hold the {role} role")]
    Unauthorized {
        /// The role the operation requires.
        role: Role,
        /// The address that attempted the call.
        caller: Address,
    },
}

/// Checks that `caller` is the current holder of `role`.
///
/// Returns [`RoleError::Unauthorized`] naming both the missing role and
/// the offending caller, so rejection logs are useful without a debugger.
pub fn require_role(role: Role, holder: &Address, caller: &Address) -> Result<(), RoleError> {
    if caller == holder {
        Ok(())
    } else {
        Err(RoleError::Unauthorized {
            role,
            caller: *caller,
        })
    }
}
