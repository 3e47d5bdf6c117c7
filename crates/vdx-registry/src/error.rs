//! # Registry Errors

use thiserror::Error;

use vdx_core::AuthError;

/// Errors from registry operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The caller is not an active issuer.
    #[error("caller {caller} is not an active issuer")]
    IssuerNotActive {
        /// Address that attempted the issuance.
        caller: String,
    },

    /// Only the certificate's original issuer may revoke it.
    #[error("caller {caller} is not the issuer of this certificate")]
    NotCertificateIssuer {
        /// Address that attempted the revocation.
        caller: String,
    },

    /// The `(user, hash)` pair is already on record.
    #[error("certificate {hash} already exists for user {user}")]
    DuplicateCertificate {
        /// The certificate owner.
        user: String,
        /// The duplicate hash.
        hash: String,
    },

    /// No certificate matched the given user and index/hash.
    #[error("no certificate found for user {user}")]
    CertificateNotFound {
        /// The user whose sequence was searched.
        user: String,
    },

    /// The presented public key does not derive to the caller's address.
    #[error("sender's address doesn't match the public key: caller {caller}, derived {derived}")]
    KeyAddressMismatch {
        /// Address that attempted the registration.
        caller: String,
        /// Address the presented key actually derives to.
        derived: String,
    },

    /// The caller already has a public key on record. Bindings are
    /// one-time.
    #[error("address {address} already has a registered public key")]
    AlreadyRegistered {
        /// The already-bound address.
        address: String,
    },

    /// Ownership/authorization failure.
    #[error(transparent)]
    Auth(#[from] AuthError),
}
