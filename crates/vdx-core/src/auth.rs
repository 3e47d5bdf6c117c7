//! # Owner/Deputy Authority
//!
//! The capability set guarding privileged operations. Each stateful
//! component owns one [`Authority`]; a privileged call checks
//! `caller ∈ {owner, deputy}` and nothing else — there is no role
//! inheritance.
//!
//! Two handover flows are supported:
//!
//! - **Direct** ([`Authority::transfer_ownership`]): the owner reassigns
//!   ownership in one call. Used by the registries.
//! - **Two-step** ([`Authority::offer_ownership`] +
//!   [`Authority::claim_ownership`]): the owner nominates a pending owner
//!   who must claim explicitly. Used by the token ledger, where a typo'd
//!   direct transfer would irrecoverably orphan the supply.
//!
//! The deputy is settable by the owner or the current deputy, and can be
//! cleared by setting it to `None`.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::AuthError;

/// Owner, optional deputy, and optional pending owner for a component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Authority {
    owner: Address,
    deputy: Option<Address>,
    pending_owner: Option<Address>,
}

impl Authority {
    /// Create an authority rooted at the deploying owner.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            deputy: None,
            pending_owner: None,
        }
    }

    /// The current owner.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// The current deputy, if set.
    pub fn deputy(&self) -> Option<Address> {
        self.deputy
    }

    /// The pending owner of a two-step handover, if one is in flight.
    pub fn pending_owner(&self) -> Option<Address> {
        self.pending_owner
    }

    /// Check that `caller` is the owner.
    pub fn require_owner(&self, caller: Address) -> Result<(), AuthError> {
        if caller != self.owner {
            return Err(AuthError::NotOwner {
                caller: caller.to_hex(),
            });
        }
        Ok(())
    }

    /// Check that `caller` is the owner or the deputy.
    pub fn require_privileged(&self, caller: Address) -> Result<(), AuthError> {
        if caller == self.owner || Some(caller) == self.deputy {
            return Ok(());
        }
        Err(AuthError::NotPrivileged {
            caller: caller.to_hex(),
        })
    }

    /// Directly reassign ownership. Owner-only; the zero address is
    /// rejected. Clears any in-flight two-step handover.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), AuthError> {
        self.require_owner(caller)?;
        if new_owner.is_zero() {
            return Err(AuthError::ZeroAddressOwner);
        }
        self.owner = new_owner;
        self.pending_owner = None;
        Ok(())
    }

    /// Nominate a pending owner. Owner-only; the zero address is rejected.
    /// The nomination replaces any previous pending owner.
    pub fn offer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), AuthError> {
        self.require_owner(caller)?;
        if new_owner.is_zero() {
            return Err(AuthError::ZeroAddressOwner);
        }
        self.pending_owner = Some(new_owner);
        Ok(())
    }

    /// Complete a two-step handover. Only the pending owner may claim.
    ///
    /// Returns the previous owner so callers can include it in the emitted
    /// event.
    pub fn claim_ownership(&mut self, caller: Address) -> Result<Address, AuthError> {
        if self.pending_owner != Some(caller) {
            return Err(AuthError::NotPendingOwner {
                caller: caller.to_hex(),
            });
        }
        let previous = self.owner;
        self.owner = caller;
        self.pending_owner = None;
        Ok(previous)
    }

    /// Set or clear the deputy. Permitted for the owner or the current
    /// deputy.
    pub fn set_deputy(
        &mut self,
        caller: Address,
        deputy: Option<Address>,
    ) -> Result<(), AuthError> {
        self.require_privileged(caller)?;
        self.deputy = deputy;
        Ok(())
    }
}
