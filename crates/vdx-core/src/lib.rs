//! # vdx-core — Foundational Types for Veridex
//!
//! This crate is the bedrock of the Veridex marketplace stack. Every other
//! crate in the workspace depends on `vdx-core`; it depends on nothing
//! internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** [`Address`],
//!    [`ContentHash`], [`TokenAmount`], [`PublicKey`] — all newtypes
//!    with validated constructors. No bare strings or bare integers for
//!    identifiers and money.
//!
//! 2. **Addresses are key-derived.** An [`Address`] is the tail of the
//!    SHA-256 digest of an Ed25519 public key, so a public key attests
//!    ownership of exactly one address and the public-key registry can
//!    enforce self-attestation structurally.
//!
//! 3. **Checked arithmetic for amounts.** [`TokenAmount`] never wraps;
//!    overflow surfaces as an error at the call site.
//!
//! 4. **Events are the notification channel.** Every mutating operation in
//!    the stack emits a [`LogRecord`] into its component's [`EventJournal`]
//!    and returns it to the caller. Consumers read named fields off the
//!    record rather than re-deriving state.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `vdx-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod address;
pub mod amount;
pub mod auth;
pub mod error;
pub mod event;
pub mod hash;
pub mod keys;

// Re-export primary types for ergonomic imports.
pub use address::Address;
pub use amount::TokenAmount;
pub use auth::Authority;
pub use error::{AuthError, ValidationError};
pub use event::{EventJournal, LogRecord};
pub use hash::ContentHash;
pub use keys::{KeyPair, PublicKey};
