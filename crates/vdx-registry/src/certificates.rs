//! # Certificate Store
//!
//! Per-user ordered sequences of attested certificates. The store records
//! only content digests — the documents themselves live off-platform — so
//! a record is the triple (hash, issuing issuer, revoked flag) plus
//! issuance metadata.
//!
//! ## Invariants
//!
//! - Only an `Active` issuer (per the [`IssuerRegistry`] this store was
//!   constructed with) may add certificates. Issuer status is captured at
//!   issuance: deactivating an issuer later leaves its certificates
//!   queryable.
//! - `(user, hash)` pairs are unique.
//! - `revoked` is monotonic. Only the original issuing issuer may revoke,
//!   even after it has been deactivated. Re-revocation is a no-op.
//! - Insertion order is index order; index-based reads are stable.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use vdx_core::{Address, ContentHash, EventJournal, LogRecord};

use crate::error::RegistryError;
use crate::issuers::IssuerRegistry;

// ── Records ────────────────────────────────────────────────────────────

/// An attested certificate record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    /// Content digest of the certificate document.
    pub hash: ContentHash,
    /// The issuer that attested it.
    pub issuer: Address,
    /// Whether the certificate has been revoked. Monotonic.
    pub revoked: bool,
    /// Optional expiry; an expired certificate fails validity gating.
    pub expires: Option<DateTime<Utc>>,
    /// When the certificate was recorded (UTC).
    pub issued_at: DateTime<Utc>,
}

/// The metadata pair returned by hash lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateMetadata {
    /// The issuer that attested the certificate.
    pub issuer: Address,
    /// Whether it has been revoked.
    pub revoked: bool,
}

// ── Store ──────────────────────────────────────────────────────────────

/// Per-user certificate store, gated by an issuer registry.
pub struct CertificateStore {
    issuers: Arc<IssuerRegistry>,
    by_user: RwLock<HashMap<Address, Vec<Certificate>>>,
    journal: EventJournal,
}

impl CertificateStore {
    /// Create a store gated by `issuers`.
    pub fn new(issuers: Arc<IssuerRegistry>) -> Self {
        Self {
            issuers,
            by_user: RwLock::new(HashMap::new()),
            journal: EventJournal::new(),
        }
    }

    /// The issuer registry this store validates against.
    pub fn issuers(&self) -> &Arc<IssuerRegistry> {
        &self.issuers
    }

    /// Record a certificate for `user`.
    ///
    /// The caller must be an `Active` issuer; the `(user, hash)` pair must
    /// be new. Emits `LogAddCertificate`.
    pub fn add_certificate(
        &self,
        caller: Address,
        user: Address,
        hash: ContentHash,
        expires: Option<DateTime<Utc>>,
    ) -> Result<LogRecord, RegistryError> {
        if !self.issuers.is_active(caller) {
            return Err(RegistryError::IssuerNotActive {
                caller: caller.to_hex(),
            });
        }

        let mut by_user = self.by_user.write();
        let sequence = by_user.entry(user).or_default();
        if sequence.iter().any(|c| c.hash == hash) {
            return Err(RegistryError::DuplicateCertificate {
                user: user.to_hex(),
                hash: hash.to_hex(),
            });
        }
        sequence.push(Certificate {
            hash,
            issuer: caller,
            revoked: false,
            expires,
            issued_at: Utc::now(),
        });
        drop(by_user);

        Ok(self.journal.emit(
            "LogAddCertificate",
            json!({ "userAddress": user, "certificateHash": hash }),
        ))
    }

    /// Revoke the certificate at `index` in `user`'s sequence.
    ///
    /// Only the certificate's original issuer may revoke. Revocation is
    /// monotonic; revoking an already-revoked certificate is a no-op and
    /// emits nothing.
    pub fn revoke_certificate_at(
        &self,
        caller: Address,
        user: Address,
        index: usize,
    ) -> Result<(), RegistryError> {
        let mut by_user = self.by_user.write();
        let certificate = by_user
            .get_mut(&user)
            .and_then(|seq| seq.get_mut(index))
            .ok_or_else(|| RegistryError::CertificateNotFound {
                user: user.to_hex(),
            })?;
        if certificate.issuer != caller {
            return Err(RegistryError::NotCertificateIssuer {
                caller: caller.to_hex(),
            });
        }
        if certificate.revoked {
            tracing::debug!(user = %user, index, "certificate already revoked");
            return Ok(());
        }
        certificate.revoked = true;
        let hash = certificate.hash;
        drop(by_user);

        self.journal.emit(
            "LogCertificateRevoked",
            json!({ "userAddress": user, "certificateHash": hash }),
        );
        Ok(())
    }

    /// Revoke the certificate identified by `(user, hash)`.
    pub fn revoke_certificate(
        &self,
        caller: Address,
        user: Address,
        hash: ContentHash,
    ) -> Result<(), RegistryError> {
        let index = self.certificate_index(user, hash).ok_or_else(|| {
            RegistryError::CertificateNotFound {
                user: user.to_hex(),
            }
        })?;
        self.revoke_certificate_at(caller, user, index)
    }

    // -- Reads -------------------------------------------------------------

    /// The (issuer, revoked) metadata for `(user, hash)`.
    pub fn certificate_metadata(
        &self,
        user: Address,
        hash: ContentHash,
    ) -> Option<CertificateMetadata> {
        self.by_user.read().get(&user).and_then(|seq| {
            seq.iter().find(|c| c.hash == hash).map(|c| CertificateMetadata {
                issuer: c.issuer,
                revoked: c.revoked,
            })
        })
    }

    /// The full certificate record at `index` in `user`'s sequence.
    pub fn certificate_at(&self, user: Address, index: usize) -> Option<Certificate> {
        self.by_user
            .read()
            .get(&user)
            .and_then(|seq| seq.get(index).cloned())
    }

    /// The index of `(user, hash)` in the user's sequence.
    pub fn certificate_index(&self, user: Address, hash: ContentHash) -> Option<usize> {
        self.by_user
            .read()
            .get(&user)
            .and_then(|seq| seq.iter().position(|c| c.hash == hash))
    }

    /// How many certificates are on record for `user`.
    pub fn certificate_count(&self, user: Address) -> usize {
        self.by_user
            .read()
            .get(&user)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Validity gate used by the escrow: the certificate exists, is not
    /// revoked, and has not expired.
    pub fn is_valid(&self, user: Address, hash: ContentHash) -> bool {
        self.by_user
            .read()
            .get(&user)
            .and_then(|seq| seq.iter().find(|c| c.hash == hash))
            .map(|c| {
                !c.revoked
                    && c.expires.map(|deadline| Utc::now() < deadline).unwrap_or(true)
            })
            .unwrap_or(false)
    }

    /// This store's event journal.
    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }
}

impl std::fmt::Debug for CertificateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateStore")
            .field("users", &self.by_user.read().len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(tag: u8) -> Address {
        Address::from_bytes([tag; 20])
    }

    fn cert_hash(content: &str) -> ContentHash {
        ContentHash::of(content.as_bytes())
    }

    /// Store with issuer3 ("Amazon") and issuer4 ("Microsoft") active.
    fn sample_store() -> (CertificateStore, Address) {
        let owner = addr(1);
        let issuers = Arc::new(IssuerRegistry::new(owner));
        issuers.add_issuer(owner, addr(3), "Amazon").unwrap();
        issuers.add_issuer(owner, addr(4), "Microsoft").unwrap();
        (CertificateStore::new(issuers), owner)
    }

    #[test]
    fn add_certificate_emits_user_and_hash() {
        let (store, _owner) = sample_store();
        let hash = cert_hash("AWS Certified Developer - John Smith");
        let record = store
            .add_certificate(addr(3), addr(10), hash, None)
            .unwrap();

        assert_eq!(record.arg_str("userAddress"), Some(addr(10).to_hex().as_str()));
        assert_eq!(
            record.arg_str("certificateHash"),
            Some(hash.to_hex().as_str())
        );
    }

    #[test]
    fn second_certificate_for_same_user_appends() {
        let (store, _owner) = sample_store();
        store
            .add_certificate(addr(3), addr(10), cert_hash("aws"), None)
            .unwrap();
        store
            .add_certificate(addr(4), addr(10), cert_hash("ms"), None)
            .unwrap();
        assert_eq!(store.certificate_count(addr(10)), 2);
    }

    #[test]
    fn unregistered_issuer_cannot_add() {
        let (store, _owner) = sample_store();
        let result = store.add_certificate(addr(9), addr(10), cert_hash("x"), None);
        assert!(matches!(
            result,
            Err(RegistryError::IssuerNotActive { .. })
        ));
        assert_eq!(store.certificate_count(addr(10)), 0);
    }

    #[test]
    fn inactive_issuer_cannot_add_but_certs_remain() {
        let (store, owner) = sample_store();
        store
            .add_certificate(addr(3), addr(10), cert_hash("aws"), None)
            .unwrap();
        store.issuers().remove_issuer(owner, addr(3)).unwrap();

        // Existing certificate still queryable and valid.
        assert!(store.is_valid(addr(10), cert_hash("aws")));
        // But no new issuance.
        assert!(store
            .add_certificate(addr(3), addr(10), cert_hash("aws2"), None)
            .is_err());
    }

    #[test]
    fn duplicate_pair_rejected() {
        let (store, _owner) = sample_store();
        let hash = cert_hash("aws");
        store.add_certificate(addr(3), addr(10), hash, None).unwrap();
        let result = store.add_certificate(addr(3), addr(10), hash, None);
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateCertificate { .. })
        ));
        // Same hash for a different user is fine.
        store.add_certificate(addr(3), addr(11), hash, None).unwrap();
    }

    #[test]
    fn metadata_lookup() {
        let (store, _owner) = sample_store();
        let hash = cert_hash("aws");
        store.add_certificate(addr(3), addr(10), hash, None).unwrap();

        let meta = store.certificate_metadata(addr(10), hash).unwrap();
        assert_eq!(meta.issuer, addr(3));
        assert!(!meta.revoked);

        // Unknown user/hash is an explicit None, not a sentinel.
        assert!(store.certificate_metadata(addr(11), hash).is_none());
        assert!(store
            .certificate_metadata(addr(10), cert_hash("other"))
            .is_none());
    }

    #[test]
    fn index_and_at_agree_with_insertion_order() {
        let (store, _owner) = sample_store();
        let aws = cert_hash("aws");
        let ms = cert_hash("ms");
        store.add_certificate(addr(3), addr(10), aws, None).unwrap();
        store.add_certificate(addr(4), addr(10), ms, None).unwrap();

        assert_eq!(store.certificate_index(addr(10), aws), Some(0));
        assert_eq!(store.certificate_index(addr(10), ms), Some(1));

        let first = store.certificate_at(addr(10), 0).unwrap();
        assert_eq!(first.hash, aws);
        assert_eq!(first.issuer, addr(3));
        assert!(!first.revoked);
        assert!(store.certificate_at(addr(10), 2).is_none());
    }

    #[test]
    fn revoke_by_original_issuer() {
        let (store, _owner) = sample_store();
        let hash = cert_hash("aws");
        store.add_certificate(addr(3), addr(10), hash, None).unwrap();

        let index = store.certificate_index(addr(10), hash).unwrap();
        store.revoke_certificate_at(addr(3), addr(10), index).unwrap();

        let meta = store.certificate_metadata(addr(10), hash).unwrap();
        assert!(meta.revoked);
        assert!(!store.is_valid(addr(10), hash));

        let record = store.journal().last_named("LogCertificateRevoked").unwrap();
        assert_eq!(record.arg_str("userAddress"), Some(addr(10).to_hex().as_str()));
    }

    #[test]
    fn revoke_by_other_issuer_rejected() {
        let (store, _owner) = sample_store();
        let hash = cert_hash("aws");
        store.add_certificate(addr(3), addr(10), hash, None).unwrap();

        let result = store.revoke_certificate(addr(4), addr(10), hash);
        assert!(matches!(
            result,
            Err(RegistryError::NotCertificateIssuer { .. })
        ));
        assert!(!store.certificate_metadata(addr(10), hash).unwrap().revoked);
    }

    #[test]
    fn revoked_issuer_may_still_revoke_its_certificates() {
        let (store, owner) = sample_store();
        let hash = cert_hash("aws");
        store.add_certificate(addr(3), addr(10), hash, None).unwrap();
        store.issuers().remove_issuer(owner, addr(3)).unwrap();

        store.revoke_certificate(addr(3), addr(10), hash).unwrap();
        assert!(store.certificate_metadata(addr(10), hash).unwrap().revoked);
    }

    #[test]
    fn revocation_is_monotonic_and_idempotent() {
        let (store, _owner) = sample_store();
        let hash = cert_hash("aws");
        store.add_certificate(addr(3), addr(10), hash, None).unwrap();
        store.revoke_certificate(addr(3), addr(10), hash).unwrap();
        // Second revocation: still revoked, no second event.
        store.revoke_certificate(addr(3), addr(10), hash).unwrap();
        assert!(store.certificate_metadata(addr(10), hash).unwrap().revoked);
        assert_eq!(
            store.journal().records_named("LogCertificateRevoked").len(),
            1
        );
    }

    #[test]
    fn revoke_unknown_certificate_rejected() {
        let (store, _owner) = sample_store();
        let result = store.revoke_certificate(addr(3), addr(10), cert_hash("x"));
        assert!(matches!(
            result,
            Err(RegistryError::CertificateNotFound { .. })
        ));
        assert!(store
            .revoke_certificate_at(addr(3), addr(10), 0)
            .is_err());
    }

    #[test]
    fn expired_certificate_fails_validity_gate() {
        let (store, _owner) = sample_store();
        let hash = cert_hash("expiring");
        let past = Utc::now() - chrono::Duration::days(1);
        store
            .add_certificate(addr(3), addr(10), hash, Some(past))
            .unwrap();

        // Still on record and not revoked, but no longer valid.
        assert!(!store.certificate_metadata(addr(10), hash).unwrap().revoked);
        assert!(!store.is_valid(addr(10), hash));

        let future = Utc::now() + chrono::Duration::days(365);
        let fresh = cert_hash("fresh");
        store
            .add_certificate(addr(3), addr(10), fresh, Some(future))
            .unwrap();
        assert!(store.is_valid(addr(10), fresh));
    }
}
