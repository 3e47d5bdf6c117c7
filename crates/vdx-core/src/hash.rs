//! # Content Hashes
//!
//! A 32-byte SHA-256 content digest. The marketplace never stores document
//! contents — only their digests — so a hash is the sole on-record link to
//! an attested certificate document or to the delivery location a user
//! hands back on completion.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::ValidationError;

/// A 32-byte SHA-256 content digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Create a hash from raw 32 bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Compute the digest of a document's bytes.
    pub fn of(content: &[u8]) -> Self {
        let digest = Sha256::digest(content);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Render as a lowercase `0x`-prefixed hex string.
    pub fn to_hex(&self) -> String {
        let body: String = self.0.iter().map(|b| format!("{b:02x}")).collect();
        format!("0x{body}")
    }

    /// Parse from a hex string, with or without the `0x` prefix.
    pub fn from_hex(hex: &str) -> Result<Self, ValidationError> {
        let hex = hex.trim().strip_prefix("0x").unwrap_or(hex.trim());
        if hex.len() != 64 {
            return Err(ValidationError::InvalidHash(format!(
                "content hash hex must be 64 chars, got {}",
                hex.len()
            )));
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in bytes.iter_mut().enumerate() {
            *chunk = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|e| ValidationError::InvalidHash(e.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = self.0.iter().take(4).map(|b| format!("{b:02x}")).collect();
        write!(f, "ContentHash(0x{prefix}...)")
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for ContentHash {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        let h1 = ContentHash::of(b"ethereum professional");
        let h2 = ContentHash::of(b"ethereum professional");
        assert_eq!(h1, h2);
    }

    #[test]
    fn distinct_content_distinct_digest() {
        assert_ne!(
            ContentHash::of(b"cert-a"),
            ContentHash::of(b"cert-b")
        );
    }

    #[test]
    fn hex_roundtrip() {
        let h = ContentHash::of(b"roundtrip");
        let hex = h.to_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 66);
        assert_eq!(ContentHash::from_hex(&hex).unwrap(), h);
    }

    #[test]
    fn invalid_hex_rejected() {
        assert!(ContentHash::from_hex("0xdead").is_err());
        assert!(ContentHash::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let h = ContentHash::of(b"serde");
        let json = serde_json::to_string(&h).unwrap();
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }
}
