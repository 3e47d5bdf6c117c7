//! # Ed25519 Key Material
//!
//! Key wrappers used for seeker registration. A seeker proves control of an
//! address by presenting the public key the address derives from; the
//! private half never enters the runtime surface beyond test fixtures.
//!
//! ## Security Invariant
//!
//! [`KeyPair`] does not implement `Serialize` and its `Debug` output never
//! exposes private key bytes.
//!
//! ## Serde
//!
//! Public keys serialize/deserialize as lowercase hex strings.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::address::Address;
use crate::error::ValidationError;

/// An Ed25519 public key (32 bytes).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    /// Create a public key from raw 32 bytes.
    ///
    /// The bytes are checked to form a valid Ed25519 point.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, ValidationError> {
        ed25519_dalek::VerifyingKey::from_bytes(&bytes)
            .map_err(|e| ValidationError::InvalidKey(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Return the raw 32-byte public key.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the public key as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a public key from a 64-character hex string.
    pub fn from_hex(hex: &str) -> Result<Self, ValidationError> {
        let hex = hex.trim().strip_prefix("0x").unwrap_or(hex.trim());
        if hex.len() != 64 {
            return Err(ValidationError::InvalidKey(format!(
                "public key hex must be 64 chars, got {}",
                hex.len()
            )));
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in bytes.iter_mut().enumerate() {
            *chunk = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|e| ValidationError::InvalidKey(e.to_string()))?;
        }
        Self::from_bytes(bytes)
    }

    /// The address this public key controls.
    pub fn derived_address(&self) -> Address {
        Address::from_public_key(self)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = self.0.iter().take(4).map(|b| format!("{b:02x}")).collect();
        write!(f, "PublicKey({prefix}...)")
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// An Ed25519 key pair.
///
/// Does not implement `Serialize` — private keys must not be accidentally
/// serialized into logs, responses, or artifacts.
pub struct KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

impl KeyPair {
    /// Generate a new random key pair.
    pub fn generate() -> Self {
        let mut csprng = rand_core::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Create a key pair from a raw 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// The public half of this key pair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// The address this key pair controls.
    pub fn address(&self) -> Address {
        self.public_key().derived_address()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair(<private>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_valid_key() {
        let kp = KeyPair::generate();
        assert_eq!(kp.public_key().as_bytes().len(), 32);
    }

    #[test]
    fn deterministic_from_seed() {
        let kp1 = KeyPair::from_seed(&[9u8; 32]);
        let kp2 = KeyPair::from_seed(&[9u8; 32]);
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.address(), kp2.address());
    }

    #[test]
    fn public_key_hex_roundtrip() {
        let pk = KeyPair::from_seed(&[3u8; 32]).public_key();
        let hex = pk.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(PublicKey::from_hex(&hex).unwrap(), pk);
    }

    #[test]
    fn public_key_invalid_hex_rejected() {
        assert!(PublicKey::from_hex("not-hex").is_err());
        assert!(PublicKey::from_hex("aabb").is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let pk = KeyPair::from_seed(&[5u8; 32]).public_key();
        let json = serde_json::to_string(&pk).unwrap();
        assert!(json.starts_with('"'));
        let back: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pk);
    }

    #[test]
    fn debug_does_not_leak_private_key() {
        let kp = KeyPair::generate();
        assert_eq!(format!("{kp:?}"), "KeyPair(<private>)");
    }

    #[test]
    fn derived_address_matches_address_from_public_key() {
        let kp = KeyPair::from_seed(&[8u8; 32]);
        assert_eq!(
            kp.address(),
            Address::from_public_key(&kp.public_key())
        );
    }
}
