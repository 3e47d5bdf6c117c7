//! # vdx-registry — Identity Registries
//!
//! The three read-mostly registries the escrow gates against:
//!
//! - **Issuers** ([`issuers`]): the whitelist of certificate-issuing
//!   entities with an `Active`/`Inactive` lifecycle. Records are never
//!   deleted — removal deactivates, re-adding reactivates in place.
//!
//! - **Certificates** ([`certificates`]): per-user ordered certificate
//!   sequences. Issuance is gated on an `Active` issuer; revocation is
//!   reserved to the certificate's original issuer and is monotonic.
//!
//! - **Public keys** ([`public_keys`]): one-time, self-attested binding of
//!   a caller address to the Ed25519 public key it derives from. A seeker
//!   must be registered here before the escrow accepts its requests.
//!
//! Registry outcomes that are expected in normal operation (re-adding an
//! active issuer, removing an unknown one) are reported as
//! [`RegistryStatus`] codes on the emitted event rather than errors;
//! authorization and precondition violations fail the call.

pub mod certificates;
pub mod error;
pub mod issuers;
pub mod public_keys;
pub mod status;

pub use certificates::{Certificate, CertificateMetadata, CertificateStore};
pub use error::RegistryError;
pub use issuers::{IssuerRecord, IssuerRegistry, IssuerStatus};
pub use public_keys::PublicKeyRegistry;
pub use status::RegistryStatus;
