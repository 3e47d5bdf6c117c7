//! # Public Key Registry
//!
//! One-time binding of a caller address to the Ed25519 public key it
//! derives from. Registration is self-attestation only: the presented key
//! must derive to the caller's own address, so nobody can register a key
//! on behalf of another account.
//!
//! The escrow treats presence in this registry as the seeker-registration
//! gate — an unregistered address cannot submit data requests, because
//! users would have no key to encrypt deliveries to.

use dashmap::DashMap;
use serde_json::json;

use vdx_core::{Address, EventJournal, LogRecord, PublicKey};

use crate::error::RegistryError;

/// Address → public key bindings.
#[derive(Default)]
pub struct PublicKeyRegistry {
    keys: DashMap<Address, PublicKey>,
    journal: EventJournal,
}

impl PublicKeyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the caller's address to `key`.
    ///
    /// Fails if the key does not derive to the caller's address, or if the
    /// caller already has a binding (bindings are one-time — rebinding
    /// would let a seeker repudiate requests made under the prior key).
    pub fn add_public_key(
        &self,
        caller: Address,
        key: PublicKey,
    ) -> Result<LogRecord, RegistryError> {
        let derived = key.derived_address();
        if derived != caller {
            return Err(RegistryError::KeyAddressMismatch {
                caller: caller.to_hex(),
                derived: derived.to_hex(),
            });
        }
        if self.keys.contains_key(&caller) {
            return Err(RegistryError::AlreadyRegistered {
                address: caller.to_hex(),
            });
        }
        self.keys.insert(caller, key.clone());

        Ok(self.journal.emit(
            "LogAddPublicKey",
            json!({ "address": caller, "publicKey": key }),
        ))
    }

    /// The key bound to `address`, if any.
    pub fn public_key_of(&self, address: Address) -> Option<PublicKey> {
        self.keys.get(&address).map(|k| k.value().clone())
    }

    /// Whether `address` has a binding on record.
    pub fn is_registered(&self, address: Address) -> bool {
        self.keys.contains_key(&address)
    }

    /// Number of bindings on record.
    pub fn registered_count(&self) -> usize {
        self.keys.len()
    }

    /// This registry's event journal.
    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }
}

impl std::fmt::Debug for PublicKeyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicKeyRegistry")
            .field("registered", &self.keys.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdx_core::KeyPair;

    #[test]
    fn registering_anothers_key_fails() {
        let registry = PublicKeyRegistry::new();
        let seeker1 = KeyPair::from_seed(&[1u8; 32]);
        let seeker2 = KeyPair::from_seed(&[2u8; 32]);

        // seeker2 presents seeker1's key.
        let result = registry.add_public_key(seeker2.address(), seeker1.public_key());
        assert!(matches!(
            result,
            Err(RegistryError::KeyAddressMismatch { .. })
        ));
        assert!(!registry.is_registered(seeker2.address()));
    }

    #[test]
    fn self_registration_binds_key() {
        let registry = PublicKeyRegistry::new();
        let seeker = KeyPair::from_seed(&[1u8; 32]);

        let record = registry
            .add_public_key(seeker.address(), seeker.public_key())
            .unwrap();
        assert_eq!(
            record.arg_str("address"),
            Some(seeker.address().to_hex().as_str())
        );
        assert!(registry.is_registered(seeker.address()));
        assert_eq!(
            registry.public_key_of(seeker.address()),
            Some(seeker.public_key())
        );
    }

    #[test]
    fn multiple_seekers_register_independently() {
        let registry = PublicKeyRegistry::new();
        let seeker1 = KeyPair::from_seed(&[1u8; 32]);
        let seeker2 = KeyPair::from_seed(&[2u8; 32]);

        registry
            .add_public_key(seeker1.address(), seeker1.public_key())
            .unwrap();
        registry
            .add_public_key(seeker2.address(), seeker2.public_key())
            .unwrap();
        assert_eq!(registry.registered_count(), 2);
    }

    #[test]
    fn rebinding_rejected() {
        let registry = PublicKeyRegistry::new();
        let seeker = KeyPair::from_seed(&[1u8; 32]);
        registry
            .add_public_key(seeker.address(), seeker.public_key())
            .unwrap();

        let result = registry.add_public_key(seeker.address(), seeker.public_key());
        assert!(matches!(
            result,
            Err(RegistryError::AlreadyRegistered { .. })
        ));
        assert_eq!(registry.registered_count(), 1);
    }

    #[test]
    fn unknown_address_reads_none() {
        let registry = PublicKeyRegistry::new();
        let stranger = KeyPair::from_seed(&[9u8; 32]);
        assert!(registry.public_key_of(stranger.address()).is_none());
        assert!(!registry.is_registered(stranger.address()));
    }
}
