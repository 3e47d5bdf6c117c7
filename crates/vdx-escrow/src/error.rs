//! # Escrow Errors
//!
//! Structured failures for the request lifecycle. Authorization failures
//! name the caller, precondition failures name the entity and state, and
//! funds failures propagate the ledger's own context.

use thiserror::Error;

use vdx_core::AuthError;
use vdx_ledger::LedgerError;

/// Errors from escrow engine operations.
#[derive(Error, Debug)]
pub enum EscrowError {
    /// The seeker has no public key on record.
    #[error("seeker {seeker} is not registered in the public key registry")]
    SeekerNotRegistered {
        /// Address that attempted the request.
        seeker: String,
    },

    /// The referenced certificate is missing, revoked, or expired.
    #[error("certificate {hash} for user {user} is missing, revoked, or expired")]
    CertificateInvalid {
        /// The certificate owner.
        user: String,
        /// The requested certificate hash.
        hash: String,
    },

    /// A non-terminal request already exists for this `(user, hash)` pair.
    #[error("an open request already exists for certificate {hash} of user {user}")]
    RequestAlreadyOpen {
        /// The certificate owner.
        user: String,
        /// The requested certificate hash.
        hash: String,
    },

    /// No request matched the given user and certificate hash.
    #[error("no data request found for certificate {hash} of user {user}")]
    RequestNotFound {
        /// The certificate owner.
        user: String,
        /// The certificate hash that was searched.
        hash: String,
    },

    /// The request is not in the state the transition requires.
    #[error("invalid transition: cannot apply '{attempted}' in state {from}")]
    InvalidTransition {
        /// Current request state.
        from: String,
        /// The operation that was attempted.
        attempted: String,
    },

    /// Only the request's originating seeker may drive this transition.
    #[error("caller {caller} is not the seeker of this request")]
    NotRequestSeeker {
        /// Address that attempted the call.
        caller: String,
    },

    /// The seeker has no available balance to refund.
    #[error("seeker {seeker} has no available balance to refund")]
    NothingToRefund {
        /// The seeker whose refund was attempted.
        seeker: String,
    },

    /// The issuer reward must not exceed 10_000 basis points.
    #[error("issuer reward of {bps} bps exceeds the whole price (10000 bps)")]
    InvalidRewardBps {
        /// The rejected basis-point value.
        bps: u16,
    },

    /// A balance bucket would overflow.
    #[error("escrow balance arithmetic overflow")]
    AmountOverflow,

    /// Fund movement failure from the token ledger.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Ownership/authorization failure.
    #[error(transparent)]
    Auth(#[from] AuthError),
}
