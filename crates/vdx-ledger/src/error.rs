//! # Ledger Errors
//!
//! Structured failures for balance and allowance operations. Every variant
//! carries enough context to act on without re-querying the ledger.

use thiserror::Error;

use vdx_core::AuthError;

/// Errors from token ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Transfers to the zero address are rejected.
    #[error("cannot transfer to the zero address")]
    ZeroAddressDestination,

    /// The sender's balance does not cover the requested amount.
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// The sender's current balance.
        available: u64,
        /// The amount that was requested.
        requested: u64,
    },

    /// The spender's allowance does not cover the requested amount.
    #[error("insufficient allowance: allowed {allowed}, requested {requested}")]
    InsufficientAllowance {
        /// The spender's current allowance.
        allowed: u64,
        /// The amount that was requested.
        requested: u64,
    },

    /// A balance or allowance would overflow.
    ///
    /// Supply is fixed, so this can only be reached by inflating an
    /// allowance past `u64::MAX`.
    #[error("amount arithmetic overflow")]
    AmountOverflow,

    /// Transfer-with-callback requires a registered receiver at the
    /// destination.
    #[error("no transfer receiver registered at {destination}")]
    ReceiverNotRegistered {
        /// The destination address that has no receiver hook.
        destination: String,
    },

    /// The destination's receiver hook rejected the transfer. The balance
    /// movement has been unwound.
    #[error("transfer callback failed: {reason}")]
    CallbackFailed {
        /// The receiver's rejection reason.
        reason: String,
    },

    /// Ownership/authorization failure.
    #[error(transparent)]
    Auth(#[from] AuthError),
}
