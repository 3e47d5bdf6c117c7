// SPDX-License-Identifier: MIT
//! # Issuer Registry
//!
//! The whitelist of entities authorized to attest user certificates.
//!
//! ## Lifecycle
//!
//! ```text
//! (unknown) ──add_issuer──▶ Active ──remove_issuer──▶ Inactive
//!                             ▲                          │
//!                             └────────add_issuer────────┘
//! ```
//!
//! Removal never deletes: an issuer record, once created, stays on the
//! books forever and only toggles between `Active` and `Inactive`.
//! Re-adding an inactive issuer reactivates the existing record in place —
//! the total issuer count is non-decreasing.
//!
//! Add/remove are restricted to the registry's owner or deputy.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use vdx_core::{Address, Authority, EventJournal, LogRecord};

use crate::error::RegistryError;
use crate::status::RegistryStatus;

// ── Issuer status ──────────────────────────────────────────────────────

/// Lifecycle status of an issuer.
///
/// Unknown addresses report [`None`](IssuerStatus::None).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssuerStatus {
    /// No record exists for this address.
    None,
    /// The issuer may attest new certificates.
    Active,
    /// The issuer has been deactivated; existing certificates remain
    /// queryable but no new ones may be added.
    Inactive,
}

impl IssuerStatus {
    /// The wire code carried on emitted events and index reads.
    pub fn code(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Active => 1,
            Self::Inactive => 2,
        }
    }

    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }
}

impl std::fmt::Display for IssuerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Records ────────────────────────────────────────────────────────────

/// A registered issuer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerRecord {
    /// The issuer's account address.
    pub address: Address,
    /// Display name (e.g. the institution's name).
    pub name: String,
    /// Current lifecycle status.
    pub status: IssuerStatus,
}

struct IssuersState {
    /// Records in registration order; index order is stable because
    /// records are never removed.
    records: Vec<IssuerRecord>,
    /// `address → position in records`.
    by_address: HashMap<Address, usize>,
    authority: Authority,
}

// ── Registry ───────────────────────────────────────────────────────────

/// The issuer whitelist.
pub struct IssuerRegistry {
    state: RwLock<IssuersState>,
    journal: EventJournal,
}

impl IssuerRegistry {
    /// Create a registry owned by the deploying account.
    pub fn new(owner: Address) -> Self {
        Self {
            state: RwLock::new(IssuersState {
                records: Vec::new(),
                by_address: HashMap::new(),
                authority: Authority::new(owner),
            }),
            journal: EventJournal::new(),
        }
    }

    /// Add an issuer, or reactivate an inactive one.
    ///
    /// Owner/deputy only. Returns [`RegistryStatus::Success`] when state
    /// changed (new record or reactivation) and
    /// [`RegistryStatus::AlreadyExists`] when the issuer was already
    /// active; both outcomes emit `LogAddIssuer`.
    pub fn add_issuer(
        &self,
        caller: Address,
        issuer: Address,
        name: impl Into<String>,
    ) -> Result<RegistryStatus, RegistryError> {
        let mut state = self.state.write();
        state.authority.require_privileged(caller)?;

        let status = match state.by_address.get(&issuer).copied() {
            Some(position) => match state.records[position].status {
                IssuerStatus::Active => RegistryStatus::AlreadyExists,
                // Reactivation toggles the existing record; no new entry.
                IssuerStatus::Inactive | IssuerStatus::None => {
                    state.records[position].status = IssuerStatus::Active;
                    RegistryStatus::Success
                }
            },
            None => {
                let record = IssuerRecord {
                    address: issuer,
                    name: name.into(),
                    status: IssuerStatus::Active,
                };
                let position = state.records.len();
                state.by_address.insert(issuer, position);
                state.records.push(record);
                RegistryStatus::Success
            }
        };
        drop(state);

        self.journal.emit(
            "LogAddIssuer",
            json!({ "issuer": issuer, "status": status.code() }),
        );
        Ok(status)
    }

    /// Deactivate an issuer.
    ///
    /// Owner/deputy only. `Active → Inactive` reports
    /// [`RegistryStatus::Success`]; an already-inactive issuer reports
    /// [`RegistryStatus::AlreadyInactive`]; an unknown address reports
    /// [`RegistryStatus::NotFound`]. All outcomes emit `LogRemoveIssuer`.
    pub fn remove_issuer(
        &self,
        caller: Address,
        issuer: Address,
    ) -> Result<RegistryStatus, RegistryError> {
        let mut state = self.state.write();
        state.authority.require_privileged(caller)?;

        let status = match state.by_address.get(&issuer).copied() {
            Some(position) => match state.records[position].status {
                IssuerStatus::Active => {
                    state.records[position].status = IssuerStatus::Inactive;
                    RegistryStatus::Success
                }
                IssuerStatus::Inactive => RegistryStatus::AlreadyInactive,
                IssuerStatus::None => RegistryStatus::NotFound,
            },
            None => RegistryStatus::NotFound,
        };
        drop(state);

        self.journal.emit(
            "LogRemoveIssuer",
            json!({ "issuer": issuer, "status": status.code() }),
        );
        Ok(status)
    }

    // -- Reads -------------------------------------------------------------

    /// The lifecycle status of `issuer`; `None` for unknown addresses.
    pub fn issuer_status(&self, issuer: Address) -> IssuerStatus {
        let state = self.state.read();
        state
            .by_address
            .get(&issuer)
            .map(|&position| state.records[position].status)
            .unwrap_or(IssuerStatus::None)
    }

    /// Whether `issuer` is currently active.
    pub fn is_active(&self, issuer: Address) -> bool {
        self.issuer_status(issuer) == IssuerStatus::Active
    }

    /// The issuer record at `index`, in registration order.
    pub fn issuer_at(&self, index: usize) -> Option<IssuerRecord> {
        self.state.read().records.get(index).cloned()
    }

    /// Total issuers ever registered. Never decreases.
    pub fn total_issuers(&self) -> usize {
        self.state.read().records.len()
    }

    /// Issuers currently in `Active` status.
    pub fn active_issuers(&self) -> usize {
        self.state
            .read()
            .records
            .iter()
            .filter(|r| r.status == IssuerStatus::Active)
            .count()
    }

    // -- Ownership ---------------------------------------------------------

    /// The current owner.
    pub fn owner(&self) -> Address {
        self.state.read().authority.owner()
    }

    /// The current deputy, if set.
    pub fn deputy(&self) -> Option<Address> {
        self.state.read().authority.deputy()
    }

    /// Directly reassign ownership. Owner-only; zero address rejected.
    pub fn transfer_ownership(
        &self,
        caller: Address,
        new_owner: Address,
    ) -> Result<LogRecord, RegistryError> {
        self.state
            .write()
            .authority
            .transfer_ownership(caller, new_owner)?;
        Ok(self.journal.emit(
            "OwnershipTransferred",
            json!({ "previousOwner": caller, "newOwner": new_owner }),
        ))
    }

    /// Set or clear the deputy. Owner or current deputy only.
    pub fn set_deputy(
        &self,
        caller: Address,
        deputy: Option<Address>,
    ) -> Result<LogRecord, RegistryError> {
        self.state.write().authority.set_deputy(caller, deputy)?;
        Ok(self.journal.emit(
            "DeputyModified",
            json!({ "newDeputy": deputy }),
        ))
    }

    /// This registry's event journal.
    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }
}

impl std::fmt::Debug for IssuerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuerRegistry")
            .field("total", &self.total_issuers())
            .field("active", &self.active_issuers())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
