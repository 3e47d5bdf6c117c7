//! # vdx-escrow — Request Lifecycle and Fund Escrow
//!
//! The centre of the Veridex marketplace: seekers pay a fixed token price
//! to request verified certificate data from users, and the escrow holds
//! the price in flight until the request resolves.
//!
//! - **Request** ([`request`]): the [`DataRequest`] record and its
//!   lifecycle state machine — `Initial` through the user's
//!   deny/complete decision to the seeker's settle/fail/cancel terminals.
//!
//! - **Engine** ([`engine`]): the [`EscrowEngine`] service owning
//!   per-seeker available/in-flight balances and per-user request
//!   sequences, consuming the certificate store (validity gating), the
//!   public-key registry (seeker registration gating), and the token
//!   ledger (fund movement).
//!
//! ## Fund conservation
//!
//! Submitting a request moves exactly the request price from the seeker's
//! available balance (topping up any shortfall from the seeker's wallet
//! allowance) into the in-flight bucket. Denial, cancellation, and failure
//! refund it in full; settlement releases it as issuer reward plus user
//! payout. `available + inflight` therefore never changes except by the
//! explicit deposit, refund, and settlement operations.

pub mod engine;
pub mod error;
pub mod request;

pub use engine::{EscrowConfig, EscrowEngine};
pub use error::EscrowError;
pub use request::{DataRequest, RequestId, RequestStatus};
