// SPDX-License-Identifier: MIT
//! # Token Ledger
//!
//! Balance and allowance accounting with a fixed supply. The ledger plays
//! the role of the marketplace's payment token: seekers approve the escrow
//! to draw request fees, and settlement routes issuer rewards and user
//! payouts back through ordinary transfers.
//!
//! ## Invariants
//!
//! - Total supply is fixed at construction and conserved: the sum of all
//!   balances equals the minted supply after every operation.
//! - Balances and allowances never go negative and never wrap; checked
//!   arithmetic maps under/overflow to structured errors.
//! - The zero address is never a valid destination.
//! - A failed operation leaves no observable state change. All
//!   multi-account mutation happens under a single write lock.
//!
//! ## Ownership
//!
//! Handover is two-step: the owner offers, the nominee claims. A direct
//! single-call transfer is deliberately not exposed here — a typo'd
//! destination would orphan nothing less than the mint account.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::{json, Value};

use vdx_core::{Address, Authority, EventJournal, LogRecord, TokenAmount};

use crate::error::LedgerError;
use crate::receiver::TransferReceiver;

// ---------------------------------------------------------------------------
// Ledger state
// ---------------------------------------------------------------------------

/// Balances, allowances, and authority, guarded by one lock so that every
/// multi-entry mutation is atomic.
struct LedgerState {
    balances: HashMap<Address, TokenAmount>,
    /// `(owner, spender) → remaining allowance`.
    allowances: HashMap<(Address, Address), TokenAmount>,
    authority: Authority,
}

impl LedgerState {
    fn balance_of(&self, account: Address) -> TokenAmount {
        self.balances.get(&account).copied().unwrap_or(TokenAmount::ZERO)
    }

    fn allowance(&self, owner: Address, spender: Address) -> TokenAmount {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    /// Move `amount` from `from` to `to`, checking the sender's balance.
    fn move_balance(
        &mut self,
        from: Address,
        to: Address,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        let from_balance = self.balance_of(from);
        let debited = from_balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                available: from_balance.raw(),
                requested: amount.raw(),
            })?;
        // A self-transfer must not double-count: the balance check above is
        // the whole operation.
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;
        self.balances.insert(from, debited);
        self.balances.insert(to, credited);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Token ledger
// ---------------------------------------------------------------------------

/// The marketplace token ledger.
///
/// Thread-safe shared service; every operation takes the acting account as
/// its first parameter.
pub struct TokenLedger {
    state: RwLock<LedgerState>,
    receivers: DashMap<Address, Arc<dyn TransferReceiver>>,
    total_supply: TokenAmount,
    journal: EventJournal,
}

impl TokenLedger {
    /// Create a ledger with the full supply credited to `owner`.
    ///
    /// Emits the conventional mint `Transfer` from the zero address.
    pub fn new(owner: Address, total_supply: TokenAmount) -> Self {
        let mut balances = HashMap::new();
        balances.insert(owner, total_supply);
        let ledger = Self {
            state: RwLock::new(LedgerState {
                balances,
                allowances: HashMap::new(),
                authority: Authority::new(owner),
            }),
            receivers: DashMap::new(),
            total_supply,
            journal: EventJournal::new(),
        };
        ledger.journal.emit(
            "Transfer",
            json!({
                "from": Address::ZERO,
                "to": owner,
                "amount": total_supply,
            }),
        );
        ledger
    }

    /// The fixed total supply.
    pub fn total_supply(&self) -> TokenAmount {
        self.total_supply
    }

    /// The balance of `account`, zero for unknown accounts.
    pub fn balance_of(&self, account: Address) -> TokenAmount {
        self.state.read().balance_of(account)
    }

    /// The remaining allowance granted by `owner` to `spender`.
    pub fn allowance(&self, owner: Address, spender: Address) -> TokenAmount {
        self.state.read().allowance(owner, spender)
    }

    /// The current ledger owner (the mint account at construction).
    pub fn owner(&self) -> Address {
        self.state.read().authority.owner()
    }

    /// The pending owner of an in-flight handover, if any.
    pub fn pending_owner(&self) -> Option<Address> {
        self.state.read().authority.pending_owner()
    }

    /// This ledger's event journal.
    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    // -- Ownership ---------------------------------------------------------

    /// Nominate a new owner. Owner-only; completed by
    /// [`claim_ownership`](Self::claim_ownership).
    pub fn offer_ownership(
        &self,
        caller: Address,
        new_owner: Address,
    ) -> Result<LogRecord, LedgerError> {
        self.state.write().authority.offer_ownership(caller, new_owner)?;
        Ok(self.journal.emit(
            "OwnershipOffered",
            json!({ "owner": caller, "pendingOwner": new_owner }),
        ))
    }

    /// Complete a handover. Only the nominated pending owner may claim.
    pub fn claim_ownership(&self, caller: Address) -> Result<LogRecord, LedgerError> {
        let previous = self.state.write().authority.claim_ownership(caller)?;
        Ok(self.journal.emit(
            "OwnershipTransferred",
            json!({ "previousOwner": previous, "newOwner": caller }),
        ))
    }

    // -- Transfers ---------------------------------------------------------

    /// Transfer `amount` from the caller to `to`.
    pub fn transfer(
        &self,
        caller: Address,
        to: Address,
        amount: TokenAmount,
    ) -> Result<LogRecord, LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddressDestination);
        }
        self.state.write().move_balance(caller, to, amount)?;
        Ok(self.journal.emit(
            "Transfer",
            json!({ "from": caller, "to": to, "amount": amount }),
        ))
    }

    /// Transfer `amount` from `from` to `to`, spending the caller's
    /// allowance.
    pub fn transfer_from(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        amount: TokenAmount,
    ) -> Result<LogRecord, LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddressDestination);
        }
        let mut state = self.state.write();
        let allowed = state.allowance(from, caller);
        let remaining = allowed
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientAllowance {
                allowed: allowed.raw(),
                requested: amount.raw(),
            })?;
        state.move_balance(from, to, amount)?;
        state.allowances.insert((from, caller), remaining);
        drop(state);
        Ok(self.journal.emit(
            "Transfer",
            json!({ "from": from, "to": to, "amount": amount, "spender": caller }),
        ))
    }

    // -- Allowances --------------------------------------------------------

    /// Set the caller's allowance for `spender` to exactly `amount`.
    pub fn approve(
        &self,
        caller: Address,
        spender: Address,
        amount: TokenAmount,
    ) -> Result<LogRecord, LedgerError> {
        self.state
            .write()
            .allowances
            .insert((caller, spender), amount);
        Ok(self.journal.emit(
            "Approval",
            json!({ "owner": caller, "spender": spender, "amount": amount }),
        ))
    }

    /// Raise the caller's allowance for `spender` by `delta`.
    pub fn increase_approval(
        &self,
        caller: Address,
        spender: Address,
        delta: TokenAmount,
    ) -> Result<LogRecord, LedgerError> {
        let mut state = self.state.write();
        let current = state.allowance(caller, spender);
        let raised = current
            .checked_add(delta)
            .ok_or(LedgerError::AmountOverflow)?;
        state.allowances.insert((caller, spender), raised);
        drop(state);
        Ok(self.journal.emit(
            "Approval",
            json!({ "owner": caller, "spender": spender, "amount": raised }),
        ))
    }

    /// Lower the caller's allowance for `spender` by `delta`, clamping at
    /// zero — an over-large decrease zeroes the allowance rather than
    /// failing.
    pub fn decrease_approval(
        &self,
        caller: Address,
        spender: Address,
        delta: TokenAmount,
    ) -> Result<LogRecord, LedgerError> {
        let mut state = self.state.write();
        let current = state.allowance(caller, spender);
        let lowered = current.checked_sub(delta).unwrap_or_else(|| {
            tracing::debug!(
                owner = %caller,
                spender = %spender,
                "decrease_approval clamped to zero"
            );
            TokenAmount::ZERO
        });
        state.allowances.insert((caller, spender), lowered);
        drop(state);
        Ok(self.journal.emit(
            "Approval",
            json!({ "owner": caller, "spender": spender, "amount": lowered }),
        ))
    }

    // -- Transfer with callback --------------------------------------------

    /// Register a receiver hook at `at`, making it a valid
    /// transfer-with-callback destination.
    pub fn register_receiver(&self, at: Address, receiver: Arc<dyn TransferReceiver>) {
        self.receivers.insert(at, receiver);
    }

    /// Whether `at` has a registered receiver hook.
    pub fn has_receiver(&self, at: Address) -> bool {
        self.receivers.contains_key(&at)
    }

    /// Transfer `amount` from the caller to `to` and invoke `to`'s
    /// registered receiver hook with `data`.
    ///
    /// The destination must have a registered [`TransferReceiver`] — plain
    /// accounts are rejected. Balances are committed before the hook runs
    /// (the hook may legitimately re-enter the ledger); if the hook fails,
    /// the movement is unwound with a compensating reversal and the error
    /// is surfaced.
    pub fn transfer_and_callback(
        &self,
        caller: Address,
        to: Address,
        amount: TokenAmount,
        data: &Value,
    ) -> Result<LogRecord, LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddressDestination);
        }
        let receiver = self
            .receivers
            .get(&to)
            .map(|r| Arc::clone(r.value()))
            .ok_or_else(|| LedgerError::ReceiverNotRegistered {
                destination: to.to_hex(),
            })?;

        self.state.write().move_balance(caller, to, amount)?;

        // State is committed; the hook runs with no lock held.
        if let Err(reason) = receiver.on_tokens_received(caller, amount, data) {
            // Compensating reversal. The credit we just made guarantees the
            // destination balance covers it.
            let mut state = self.state.write();
            if let Err(unwind) = state.move_balance(to, caller, amount) {
                tracing::warn!(
                    destination = %to,
                    error = %unwind,
                    "callback unwind could not restore balances"
                );
            }
            return Err(LedgerError::CallbackFailed { reason });
        }

        Ok(self.journal.emit(
            "TransferAndCallback",
            json!({ "from": caller, "to": to, "amount": amount }),
        ))
    }
}

impl std::fmt::Debug for TokenLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenLedger")
            .field("total_supply", &self.total_supply)
            .field("accounts", &self.state.read().balances.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
