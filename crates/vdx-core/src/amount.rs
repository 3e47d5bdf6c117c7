//! # Token Amounts
//!
//! A `u64` micro-unit amount newtype with checked arithmetic. Amounts never
//! wrap: overflow and underflow surface as `None` at the call site, where
//! the owning component maps them to its structured error type.

use serde::{Deserialize, Serialize};

/// A token amount in smallest (micro) units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenAmount(u64);

impl TokenAmount {
    /// The zero amount.
    pub const ZERO: TokenAmount = TokenAmount(0);

    /// Create an amount from raw micro-units.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Return the raw micro-unit value.
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Whether this amount is zero.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition. `None` on overflow.
    pub fn checked_add(self, rhs: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_add(rhs.0).map(TokenAmount)
    }

    /// Checked subtraction. `None` on underflow.
    pub fn checked_sub(self, rhs: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_sub(rhs.0).map(TokenAmount)
    }

    /// The smaller of two amounts.
    pub fn min(self, rhs: TokenAmount) -> TokenAmount {
        TokenAmount(self.0.min(rhs.0))
    }

    /// The basis-point share of this amount, rounded down.
    ///
    /// `bps` is clamped by callers to at most 10_000; the widening to
    /// `u128` makes the intermediate product overflow-free for any `u64`
    /// amount.
    pub fn bps_share(self, bps: u16) -> TokenAmount {
        let share = (self.0 as u128 * bps as u128) / 10_000u128;
        TokenAmount(share as u64)
    }
}

impl std::fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TokenAmount {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn checked_add_detects_overflow() {
        let max = TokenAmount::new(u64::MAX);
        assert!(max.checked_add(TokenAmount::new(1)).is_none());
        assert_eq!(
            TokenAmount::new(40).checked_add(TokenAmount::new(2)),
            Some(TokenAmount::new(42))
        );
    }

    #[test]
    fn checked_sub_detects_underflow() {
        assert!(TokenAmount::new(1).checked_sub(TokenAmount::new(2)).is_none());
        assert_eq!(
            TokenAmount::new(42).checked_sub(TokenAmount::new(2)),
            Some(TokenAmount::new(40))
        );
    }

    #[test]
    fn bps_share_of_price() {
        // 60 bps of 30_000_000 micro-units = 180_000
        let price = TokenAmount::new(30_000_000);
        assert_eq!(price.bps_share(60), TokenAmount::new(180_000));
        // full share
        assert_eq!(price.bps_share(10_000), price);
        // zero share
        assert_eq!(price.bps_share(0), TokenAmount::ZERO);
    }

    #[test]
    fn bps_share_never_overflows() {
        let max = TokenAmount::new(u64::MAX);
        assert_eq!(max.bps_share(10_000), max);
    }

    #[test]
    fn serde_is_transparent() {
        let amount = TokenAmount::new(25_000_000);
        assert_eq!(serde_json::to_string(&amount).unwrap(), "25000000");
    }

    proptest! {
        #[test]
        fn reward_plus_remainder_equals_price(raw in 0u64..=u64::MAX, bps in 0u16..=10_000) {
            let price = TokenAmount::new(raw);
            let reward = price.bps_share(bps);
            let remainder = price.checked_sub(reward).expect("share never exceeds price");
            prop_assert_eq!(reward.checked_add(remainder), Some(price));
        }
    }
}
