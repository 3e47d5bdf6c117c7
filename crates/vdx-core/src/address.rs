// SPDX-License-Identifier: MIT
//! # Account Addresses
//!
//! A 20-byte account identifier, rendered as a `0x`-prefixed hex string.
//! Addresses identify every party in the marketplace: owners, deputies,
//! issuers, users, and seekers, plus the escrow's own ledger account.
//!
//! ## Derivation
//!
//! [`Address::from_public_key`] takes the last 20 bytes of the SHA-256
//! digest of the Ed25519 public key. The mapping is deterministic and
//! collision-resistant, so the public-key registry can verify that a caller
//! registering a key actually controls the address the key derives to.
//!
//! The all-zero address is a reserved sentinel: it is never a valid
//! destination for funds or ownership.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::ValidationError;
use crate::keys::PublicKey;

/// A 20-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    /// The reserved all-zero address. Never a valid destination.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Create an address from raw 20 bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Return the raw 20-byte address.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Derive the address controlled by an Ed25519 public key.
    ///
    /// Computed as the last 20 bytes of `SHA-256(public_key_bytes)`.
    pub fn from_public_key(key: &PublicKey) -> Self {
        let digest = Sha256::digest(key.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..32]);
        Self(bytes)
    }

    /// Whether this is the reserved zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Render as a lowercase `0x`-prefixed hex string.
    pub fn to_hex(&self) -> String {
        let body: String = self.0.iter().map(|b| format!("{b:02x}")).collect();
        format!("0x{body}")
    }

    /// Parse from a hex string, with or without the `0x` prefix.
    pub fn from_hex(hex: &str) -> Result<Self, ValidationError> {
        let hex = hex.trim().strip_prefix("0x").unwrap_or(hex.trim());
        if hex.len() != 40 {
            return Err(ValidationError::InvalidAddress(format!(
                "address hex must be 40 chars, got {}",
                hex.len()
            )));
        }
        let mut bytes = [0u8; 20];
        for (i, chunk) in bytes.iter_mut().enumerate() {
            *chunk = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|e| ValidationError::InvalidAddress(e.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for Address {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
