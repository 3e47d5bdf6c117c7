//! # Error Types — Structured Error Hierarchy
//!
//! Shared error types for the Veridex stack. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations.
//!
//! Component-specific failures (ledger, registry, escrow) live in their own
//! crates; this module holds only the errors produced by the foundational
//! types themselves.

use thiserror::Error;

/// Validation failure while constructing a foundational type.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// An address string could not be parsed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A content hash string could not be parsed.
    #[error("invalid content hash: {0}")]
    InvalidHash(String),

    /// Public key bytes did not form a valid Ed25519 point.
    #[error("invalid public key: {0}")]
    InvalidKey(String),
}

/// Authorization failure from an [`Authority`](crate::Authority) check.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The caller is not the owner.
    #[error("caller {caller} is not the owner")]
    NotOwner {
        /// Address that attempted the call.
        caller: String,
    },

    /// The caller is neither the owner nor the deputy.
    #[error("caller {caller} is neither owner nor deputy")]
    NotPrivileged {
        /// Address that attempted the call.
        caller: String,
    },

    /// Only the pending owner may claim ownership.
    #[error("caller {caller} is not the pending owner")]
    NotPendingOwner {
        /// Address that attempted the call.
        caller: String,
    },

    /// Ownership cannot be handed to the zero address.
    #[error("cannot transfer ownership to the zero address")]
    ZeroAddressOwner,
}
