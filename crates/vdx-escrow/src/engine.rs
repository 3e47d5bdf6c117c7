//! # Escrow Engine
//!
//! The marketplace's request broker. The engine owns two things
//! exclusively: per-seeker fund buckets (available vs. in-flight) and
//! per-user request sequences. It reads — never writes — the certificate
//! store, the issuer registry behind it, and the public-key registry.
//!
//! ## Funding model
//!
//! The engine holds one account on the token ledger (`escrow_address`).
//! Seeker deposits and request top-ups are `transfer_from` pulls against
//! the seeker's wallet allowance into that account; refunds and settlement
//! payouts are plain transfers out of it. The sum of all fund buckets never
//! exceeds the escrow account's ledger balance.
//!
//! ## Atomicity
//!
//! Every operation validates, then moves ledger funds, then commits its
//! record and bucket mutations — all under the engine's write lock. A
//! ledger failure therefore surfaces before any engine state has changed,
//! and concurrent submissions against the same `(user, certificate)` pair
//! serialize on the lock.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use vdx_core::{Address, Authority, ContentHash, EventJournal, LogRecord, TokenAmount};
use vdx_ledger::TokenLedger;
use vdx_registry::{CertificateStore, PublicKeyRegistry};

use crate::error::EscrowError;
use crate::request::{DataRequest, RequestStatus};

// ── Configuration ──────────────────────────────────────────────────────

/// Owner-settable engine parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EscrowConfig {
    /// Fixed price a seeker commits per request.
    pub tokens_per_request: TokenAmount,
    /// Basis points of the price routed to the certifying issuer on
    /// settlement; the remainder is paid to the user.
    pub issuer_reward_bps: u16,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            // 25 tokens at 6 decimals.
            tokens_per_request: TokenAmount::new(25_000_000),
            issuer_reward_bps: 60,
        }
    }
}

// ── Fund buckets ───────────────────────────────────────────────────────

/// A seeker's escrow-held funds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct SeekerFunds {
    /// Deposited but not committed to any open request.
    available: TokenAmount,
    /// Committed to open (`Initial`/`UserCompleted`) requests.
    inflight: TokenAmount,
}

// ── Engine state ───────────────────────────────────────────────────────

struct EngineState {
    funds: HashMap<Address, SeekerFunds>,
    /// Per-user request sequences in submission order.
    requests: HashMap<Address, Vec<DataRequest>>,
    config: EscrowConfig,
    authority: Authority,
}

// ── The engine ─────────────────────────────────────────────────────────

/// The request-lifecycle escrow.
pub struct EscrowEngine {
    ledger: Arc<TokenLedger>,
    certificates: Arc<CertificateStore>,
    public_keys: Arc<PublicKeyRegistry>,
    escrow_address: Address,
    state: RwLock<EngineState>,
    journal: EventJournal,
}

impl EscrowEngine {
    /// Create an engine with the default configuration.
    ///
    /// `escrow_address` is the engine's own account on `ledger`; seekers
    /// grant their allowances to it.
    pub fn new(
        owner: Address,
        escrow_address: Address,
        ledger: Arc<TokenLedger>,
        certificates: Arc<CertificateStore>,
        public_keys: Arc<PublicKeyRegistry>,
    ) -> Self {
        Self::with_config(
            owner,
            escrow_address,
            ledger,
            certificates,
            public_keys,
            EscrowConfig::default(),
        )
    }

    /// Create an engine with an explicit configuration.
    pub fn with_config(
        owner: Address,
        escrow_address: Address,
        ledger: Arc<TokenLedger>,
        certificates: Arc<CertificateStore>,
        public_keys: Arc<PublicKeyRegistry>,
        config: EscrowConfig,
    ) -> Self {
        Self {
            ledger,
            certificates,
            public_keys,
            escrow_address,
            state: RwLock::new(EngineState {
                funds: HashMap::new(),
                requests: HashMap::new(),
                config,
                authority: Authority::new(owner),
            }),
            journal: EventJournal::new(),
        }
    }

    /// The engine's account address on the token ledger.
    pub fn escrow_address(&self) -> Address {
        self.escrow_address
    }

    // -- Seeker funds ------------------------------------------------------

    /// Pull `amount` from the caller's wallet into their available balance.
    ///
    /// Requires a prior ledger allowance of at least `amount` granted to
    /// the escrow address. Fails with no state change if the allowance or
    /// wallet balance is insufficient.
    pub fn increase_available_balance(
        &self,
        seeker: Address,
        amount: TokenAmount,
    ) -> Result<LogRecord, EscrowError> {
        let mut guard = self.state.write();
        let state = &mut *guard;

        let current = state.funds.get(&seeker).copied().unwrap_or_default();
        let raised = current
            .available
            .checked_add(amount)
            .ok_or(EscrowError::AmountOverflow)?;

        self.ledger
            .transfer_from(self.escrow_address, seeker, self.escrow_address, amount)?;
        state.funds.insert(
            seeker,
            SeekerFunds {
                available: raised,
                inflight: current.inflight,
            },
        );
        drop(guard);

        Ok(self.journal.emit(
            "LogAvailableBalanceIncreased",
            json!({ "seeker": seeker, "amount": amount, "availableBalance": raised }),
        ))
    }

    /// Return the caller's entire available balance to their wallet.
    ///
    /// Fails with [`EscrowError::NothingToRefund`] when the available
    /// balance is zero — including on an immediate second call.
    pub fn refund_available_balance(&self, seeker: Address) -> Result<LogRecord, EscrowError> {
        self.refund_available(seeker)
    }

    /// Owner/deputy variant of
    /// [`refund_available_balance`](Self::refund_available_balance) for
    /// operational recovery.
    pub fn refund_available_balance_admin(
        &self,
        caller: Address,
        seeker: Address,
    ) -> Result<LogRecord, EscrowError> {
        self.state.read().authority.require_privileged(caller)?;
        self.refund_available(seeker)
    }

    fn refund_available(&self, seeker: Address) -> Result<LogRecord, EscrowError> {
        let mut guard = self.state.write();
        let state = &mut *guard;

        let entry = state
            .funds
            .get_mut(&seeker)
            .filter(|f| !f.available.is_zero())
            .ok_or_else(|| EscrowError::NothingToRefund {
                seeker: seeker.to_hex(),
            })?;
        let amount = entry.available;

        self.ledger.transfer(self.escrow_address, seeker, amount)?;
        entry.available = TokenAmount::ZERO;
        drop(guard);

        Ok(self.journal.emit(
            "LogAvailableBalanceRefunded",
            json!({ "seeker": seeker, "amount": amount }),
        ))
    }

    /// A seeker's uncommitted escrow-held balance.
    pub fn available_balance(&self, seeker: Address) -> TokenAmount {
        self.state
            .read()
            .funds
            .get(&seeker)
            .map(|f| f.available)
            .unwrap_or(TokenAmount::ZERO)
    }

    /// A seeker's balance committed to open requests.
    pub fn inflight_balance(&self, seeker: Address) -> TokenAmount {
        self.state
            .read()
            .funds
            .get(&seeker)
            .map(|f| f.inflight)
            .unwrap_or(TokenAmount::ZERO)
    }

    // -- Request lifecycle -------------------------------------------------

    /// Submit a request for the data behind `(user, certificate_hash)`.
    ///
    /// Preconditions: the seeker is registered in the public-key registry,
    /// the certificate exists and is neither revoked nor expired, and no
    /// open request exists for the pair. The price is drawn from the
    /// seeker's available balance first; any shortfall is pulled from the
    /// wallet allowance. The full price moves into the in-flight bucket
    /// and the request is created in `Initial` state.
    pub fn submit_request(
        &self,
        seeker: Address,
        user: Address,
        certificate_hash: ContentHash,
    ) -> Result<DataRequest, EscrowError> {
        if !self.public_keys.is_registered(seeker) {
            return Err(EscrowError::SeekerNotRegistered {
                seeker: seeker.to_hex(),
            });
        }
        if user.is_zero() || !self.certificates.is_valid(user, certificate_hash) {
            return Err(EscrowError::CertificateInvalid {
                user: user.to_hex(),
                hash: certificate_hash.to_hex(),
            });
        }

        let mut guard = self.state.write();
        let state = &mut *guard;

        let open_exists = state.requests.get(&user).is_some_and(|seq| {
            seq.iter()
                .any(|r| r.certificate_hash == certificate_hash && !r.status.is_terminal())
        });
        if open_exists {
            return Err(EscrowError::RequestAlreadyOpen {
                user: user.to_hex(),
                hash: certificate_hash.to_hex(),
            });
        }

        let price = state.config.tokens_per_request;
        let current = state.funds.get(&seeker).copied().unwrap_or_default();
        let from_available = current.available.min(price);
        let shortfall = price
            .checked_sub(from_available)
            .ok_or(EscrowError::AmountOverflow)?;
        let new_available = current
            .available
            .checked_sub(from_available)
            .ok_or(EscrowError::AmountOverflow)?;
        let new_inflight = current
            .inflight
            .checked_add(price)
            .ok_or(EscrowError::AmountOverflow)?;

        // Pull the shortfall before committing anything; an allowance or
        // balance failure leaves both buckets untouched.
        if !shortfall.is_zero() {
            self.ledger
                .transfer_from(self.escrow_address, seeker, self.escrow_address, shortfall)?;
        }

        state.funds.insert(
            seeker,
            SeekerFunds {
                available: new_available,
                inflight: new_inflight,
            },
        );
        let request = DataRequest::submitted(seeker, user, certificate_hash, price);
        state.requests.entry(user).or_default().push(request.clone());
        drop(guard);

        self.journal.emit(
            "LogRequestSubmitted",
            json!({
                "seeker": seeker,
                "userAddress": user,
                "certificateHash": certificate_hash,
                "price": price,
                "status": RequestStatus::Initial.code(),
            }),
        );
        Ok(request)
    }

    /// The user declines an `Initial` request against one of their
    /// certificates. The committed price refunds to the seeker's available
    /// balance in full — no issuer reward.
    pub fn user_deny_request(
        &self,
        caller: Address,
        certificate_hash: ContentHash,
    ) -> Result<DataRequest, EscrowError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let request = Self::latest_request_mut(&mut state.requests, caller, certificate_hash)?;
        Self::require_status(request, RequestStatus::Initial, "user deny")?;

        let seeker = request.seeker;
        let price = request.price;
        request.deny()?;
        let updated = request.clone();
        Self::release_to_available(&mut state.funds, seeker, price)?;
        drop(guard);

        self.journal.emit(
            "LogRequestDenied",
            json!({
                "seeker": seeker,
                "userAddress": caller,
                "certificateHash": certificate_hash,
                "status": RequestStatus::UserDenied.code(),
            }),
        );
        Ok(updated)
    }

    /// The user fulfils an `Initial` request, recording the digest of the
    /// location where the (encrypted) data was delivered.
    pub fn user_complete_request(
        &self,
        caller: Address,
        certificate_hash: ContentHash,
        delivery_location_hash: ContentHash,
    ) -> Result<DataRequest, EscrowError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let request = Self::latest_request_mut(&mut state.requests, caller, certificate_hash)?;
        Self::require_status(request, RequestStatus::Initial, "user complete")?;

        request.complete(delivery_location_hash)?;
        let updated = request.clone();
        drop(guard);

        self.journal.emit(
            "LogRequestCompleted",
            json!({
                "seeker": updated.seeker,
                "userAddress": caller,
                "certificateHash": certificate_hash,
                "deliveryLocationHash": delivery_location_hash,
                "status": RequestStatus::UserCompleted.code(),
            }),
        );
        Ok(updated)
    }

    /// The originating seeker confirms a `UserCompleted` delivery,
    /// settling the request: the in-flight price is released, the
    /// certifying issuer receives its basis-point reward, and the user is
    /// paid the remainder.
    pub fn seeker_complete_request(
        &self,
        caller: Address,
        user: Address,
        certificate_hash: ContentHash,
    ) -> Result<DataRequest, EscrowError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let request = Self::latest_request_mut(&mut state.requests, user, certificate_hash)?;
        if request.seeker != caller {
            return Err(EscrowError::NotRequestSeeker {
                caller: caller.to_hex(),
            });
        }
        Self::require_status(request, RequestStatus::UserCompleted, "seeker complete")?;

        let price = request.price;
        let seeker = request.seeker;
        let issuer = self
            .certificates
            .certificate_metadata(user, certificate_hash)
            .ok_or_else(|| EscrowError::CertificateInvalid {
                user: user.to_hex(),
                hash: certificate_hash.to_hex(),
            })?
            .issuer;

        let reward = price.bps_share(state.config.issuer_reward_bps);
        let payout = price
            .checked_sub(reward)
            .ok_or(EscrowError::AmountOverflow)?;

        let entry = state.funds.entry(seeker).or_default();
        let new_inflight = entry
            .inflight
            .checked_sub(price)
            .ok_or(EscrowError::AmountOverflow)?;

        // Pay out of the escrow account; the in-flight bucket backs both
        // legs in full.
        if !reward.is_zero() {
            self.ledger.transfer(self.escrow_address, issuer, reward)?;
        }
        if !payout.is_zero() {
            self.ledger.transfer(self.escrow_address, user, payout)?;
        }

        request.settle()?;
        let updated = request.clone();
        entry.inflight = new_inflight;
        drop(guard);

        tracing::debug!(
            seeker = %seeker,
            user = %user,
            issuer = %issuer,
            reward = reward.raw(),
            payout = payout.raw(),
            "request settled"
        );
        self.journal.emit(
            "LogRequestSettled",
            json!({
                "seeker": seeker,
                "userAddress": user,
                "certificateHash": certificate_hash,
                "issuer": issuer,
                "issuerReward": reward,
                "userPayout": payout,
                "status": RequestStatus::SeekerCompleted.code(),
            }),
        );
        Ok(updated)
    }

    /// The originating seeker reports a `UserCompleted` delivery as
    /// unusable. The engine does not adjudicate quality — the committed
    /// price simply refunds to the seeker's available balance.
    pub fn seeker_fail_request(
        &self,
        caller: Address,
        user: Address,
        certificate_hash: ContentHash,
    ) -> Result<DataRequest, EscrowError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let request = Self::latest_request_mut(&mut state.requests, user, certificate_hash)?;
        if request.seeker != caller {
            return Err(EscrowError::NotRequestSeeker {
                caller: caller.to_hex(),
            });
        }
        Self::require_status(request, RequestStatus::UserCompleted, "seeker fail")?;

        let price = request.price;
        request.fail()?;
        let updated = request.clone();
        Self::release_to_available(&mut state.funds, caller, price)?;
        drop(guard);

        self.journal.emit(
            "LogRequestFailed",
            json!({
                "seeker": caller,
                "userAddress": user,
                "certificateHash": certificate_hash,
                "status": RequestStatus::SeekerFailed.code(),
            }),
        );
        Ok(updated)
    }

    /// The originating seeker withdraws a request the user has not yet
    /// acted on. Permitted only in `Initial`; the committed price refunds
    /// to the available balance in full.
    pub fn seeker_cancel_request(
        &self,
        caller: Address,
        user: Address,
        certificate_hash: ContentHash,
    ) -> Result<DataRequest, EscrowError> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let request = Self::latest_request_mut(&mut state.requests, user, certificate_hash)?;
        if request.seeker != caller {
            return Err(EscrowError::NotRequestSeeker {
                caller: caller.to_hex(),
            });
        }
        Self::require_status(request, RequestStatus::Initial, "seeker cancel")?;

        let price = request.price;
        request.cancel()?;
        let updated = request.clone();
        Self::release_to_available(&mut state.funds, caller, price)?;
        drop(guard);

        self.journal.emit(
            "LogRequestCancelled",
            json!({
                "seeker": caller,
                "userAddress": user,
                "certificateHash": certificate_hash,
                "status": RequestStatus::SeekerCancelled.code(),
            }),
        );
        Ok(updated)
    }

    // -- Request reads -----------------------------------------------------

    /// The most recent request for `(user, certificate_hash)`.
    pub fn data_request_by_hash(
        &self,
        user: Address,
        certificate_hash: ContentHash,
    ) -> Option<DataRequest> {
        self.state.read().requests.get(&user).and_then(|seq| {
            seq.iter()
                .rev()
                .find(|r| r.certificate_hash == certificate_hash)
                .cloned()
        })
    }

    /// The request at `index` in `user`'s sequence, in submission order.
    pub fn data_request_at(&self, user: Address, index: usize) -> Option<DataRequest> {
        self.state
            .read()
            .requests
            .get(&user)
            .and_then(|seq| seq.get(index).cloned())
    }

    /// The index of the most recent request for `(user, certificate_hash)`.
    pub fn data_request_index_by_hash(
        &self,
        user: Address,
        certificate_hash: ContentHash,
    ) -> Option<usize> {
        self.state
            .read()
            .requests
            .get(&user)
            .and_then(|seq| seq.iter().rposition(|r| r.certificate_hash == certificate_hash))
    }

    /// How many requests have ever been submitted against `user`.
    pub fn data_request_count(&self, user: Address) -> usize {
        self.state
            .read()
            .requests
            .get(&user)
            .map(Vec::len)
            .unwrap_or(0)
    }

    // -- Configuration -----------------------------------------------------

    /// The current per-request price.
    pub fn tokens_per_request(&self) -> TokenAmount {
        self.state.read().config.tokens_per_request
    }

    /// The current issuer reward in basis points.
    pub fn issuer_reward_bps(&self) -> u16 {
        self.state.read().config.issuer_reward_bps
    }

    /// Set the per-request price. Owner/deputy only; in-flight requests
    /// keep the price they were submitted at.
    pub fn set_tokens_per_request(
        &self,
        caller: Address,
        amount: TokenAmount,
    ) -> Result<LogRecord, EscrowError> {
        let mut state = self.state.write();
        state.authority.require_privileged(caller)?;
        state.config.tokens_per_request = amount;
        drop(state);
        Ok(self
            .journal
            .emit("LogTokensPerRequestChanged", json!({ "amount": amount })))
    }

    /// Set the issuer reward in basis points. Owner/deputy only; rejects
    /// values past 10_000 (the whole price).
    pub fn set_issuer_reward_bps(
        &self,
        caller: Address,
        bps: u16,
    ) -> Result<LogRecord, EscrowError> {
        if bps > 10_000 {
            return Err(EscrowError::InvalidRewardBps { bps });
        }
        let mut state = self.state.write();
        state.authority.require_privileged(caller)?;
        state.config.issuer_reward_bps = bps;
        drop(state);
        Ok(self
            .journal
            .emit("LogIssuerRewardChanged", json!({ "bps": bps })))
    }

    // -- Ownership ---------------------------------------------------------

    /// The engine owner.
    pub fn owner(&self) -> Address {
        self.state.read().authority.owner()
    }

    /// The engine deputy, if set.
    pub fn deputy(&self) -> Option<Address> {
        self.state.read().authority.deputy()
    }

    /// Directly reassign ownership. Owner-only; zero address rejected.
    pub fn transfer_ownership(
        &self,
        caller: Address,
        new_owner: Address,
    ) -> Result<LogRecord, EscrowError> {
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
    ) -> Result<LogRecord, EscrowError> {
        self.state.write().authority.set_deputy(caller, deputy)?;
        Ok(self
            .journal
            .emit("DeputyModified", json!({ "newDeputy": deputy })))
    }

    /// This engine's event journal.
    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    // -- Internal helpers --------------------------------------------------

    /// The most recent request for `(user, hash)`, mutable.
    fn latest_request_mut(
        requests: &mut HashMap<Address, Vec<DataRequest>>,
        user: Address,
        hash: ContentHash,
    ) -> Result<&mut DataRequest, EscrowError> {
        requests
            .get_mut(&user)
            .and_then(|seq| {
                seq.iter_mut()
                    .rev()
                    .find(|r| r.certificate_hash == hash)
            })
            .ok_or_else(|| EscrowError::RequestNotFound {
                user: user.to_hex(),
                hash: hash.to_hex(),
            })
    }

    /// Reject a transition attempted from the wrong state, before any
    /// funds arithmetic runs.
    fn require_status(
        request: &DataRequest,
        expected: RequestStatus,
        attempted: &str,
    ) -> Result<(), EscrowError> {
        if request.status != expected {
            return Err(EscrowError::InvalidTransition {
                from: request.status.as_str().to_string(),
                attempted: attempted.to_string(),
            });
        }
        Ok(())
    }

    /// Move `price` from a seeker's in-flight bucket back to available.
    fn release_to_available(
        funds: &mut HashMap<Address, SeekerFunds>,
        seeker: Address,
        price: TokenAmount,
    ) -> Result<(), EscrowError> {
        let entry = funds.entry(seeker).or_default();
        entry.inflight = entry
            .inflight
            .checked_sub(price)
            .ok_or(EscrowError::AmountOverflow)?;
        entry.available = entry
            .available
            .checked_add(price)
            .ok_or(EscrowError::AmountOverflow)?;
        Ok(())
    }
}

impl std::fmt::Debug for EscrowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("EscrowEngine")
            .field("escrow_address", &self.escrow_address)
            .field("seekers", &state.funds.len())
            .field("users_with_requests", &state.requests.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
