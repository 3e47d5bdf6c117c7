//! # vdx-ledger — Token Balance and Allowance Accounting
//!
//! The fungible token underpinning the Veridex marketplace. Supply is fixed
//! at construction and credited entirely to the deploying owner; every
//! subsequent movement is a conserved transfer between accounts.
//!
//! - **Ledger** ([`ledger`]): balances, allowances, transfers, and the
//!   two-step (offer/claim) ownership handover.
//!
//! - **Receiver** ([`receiver`]): the [`TransferReceiver`] seam for
//!   transfer-with-callback — a transfer that notifies the destination,
//!   which must have registered a receiver hook.
//!
//! ## Atomicity
//!
//! All mutating operations are all-or-nothing: a precondition failure
//! (zero-address destination, insufficient balance or allowance) returns
//! before any state is touched, and a callback failure after the balance
//! commit is unwound with a compensating reversal before the error is
//! surfaced.

pub mod error;
pub mod ledger;
pub mod receiver;

pub use error::LedgerError;
pub use ledger::TokenLedger;
pub use receiver::TransferReceiver;
