//! # Transfer Receiver Seam
//!
//! [`TransferReceiver`] is the hook a destination registers to accept
//! transfer-with-callback payments. Registration is what distinguishes a
//! "contract" destination from a plain account: a transfer-with-callback to
//! an address with no registered receiver is rejected outright.
//!
//! The hook runs after the balance movement has been committed and with no
//! ledger lock held, so a receiver may re-enter the ledger (forwarding
//! funds, approving a spender). A hook that returns an error causes the
//! ledger to unwind the movement with a compensating reversal.

use serde_json::Value;

use vdx_core::{Address, TokenAmount};

/// Destination-side hook invoked by
/// [`TokenLedger::transfer_and_callback`](crate::TokenLedger::transfer_and_callback).
pub trait TransferReceiver: Send + Sync {
    /// Called after `amount` has been credited to the receiver's address.
    ///
    /// `data` is an opaque payload chosen by the sender — the marketplace
    /// convention packs the user address, the seeker's public key, and the
    /// certificate identifier. Returning an error rejects the payment and
    /// unwinds the transfer.
    fn on_tokens_received(
        &self,
        from: Address,
        amount: TokenAmount,
        data: &Value,
    ) -> Result<(), String>;
}
