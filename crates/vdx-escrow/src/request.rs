// SPDX-License-Identifier: MIT
//! # Data Request Lifecycle
//!
//! A [`DataRequest`] tracks one seeker's paid request for the data behind a
//! user's certificate. Requests advance through a validated-enum state
//! machine: each transition has a dedicated method that checks the current
//! state and rejects everything else, and terminal states reject all
//! further transitions.
//!
//! ## Transition Graph
//!
//! ```text
//! None ──submit──▶ Initial ──user deny──────▶ UserDenied       [terminal]
//!                    │  │
//!                    │  └──seeker cancel───▶ SeekerCancelled   [terminal]
//!                    │
//!                    └──user complete──────▶ UserCompleted
//!                                              │        │
//!                                 seeker complete        seeker fail
//!                                              │        │
//!                                              ▼        ▼
//!                                  SeekerCompleted    SeekerFailed
//!                                      [terminal]      [terminal]
//! ```
//!
//! `Initial` is the only state from which the seeker may cancel; once the
//! user has acted, the seeker can only settle or fail the delivery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vdx_core::{Address, ContentHash, TokenAmount};

use crate::error::EscrowError;

// ── Identifiers ────────────────────────────────────────────────────────

/// A unique identifier for a data request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Create a new random request identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a request identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "request:{}", self.0)
    }
}

// ── Request status ─────────────────────────────────────────────────────

/// Lifecycle state of a data request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    /// No request exists. Never stored; the code exists for event payloads.
    None,
    /// Submitted and funded; awaiting the user's decision.
    Initial,
    /// The user delivered the data and recorded its location.
    UserCompleted,
    /// The user declined the request. Terminal.
    UserDenied,
    /// The seeker confirmed the delivery; funds settled. Terminal.
    SeekerCompleted,
    /// The seeker reported the delivery unusable; funds refunded. Terminal.
    SeekerFailed,
    /// The seeker withdrew the request before user action. Terminal.
    SeekerCancelled,
}

impl RequestStatus {
    /// The wire code carried on emitted events.
    pub fn code(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Initial => 1,
            Self::UserCompleted => 2,
            Self::UserDenied => 3,
            Self::SeekerCompleted => 4,
            Self::SeekerFailed => 5,
            Self::SeekerCancelled => 6,
        }
    }

    /// The canonical string name of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Initial => "INITIAL",
            Self::UserCompleted => "USER_COMPLETED",
            Self::UserDenied => "USER_DENIED",
            Self::SeekerCompleted => "SEEKER_COMPLETED",
            Self::SeekerFailed => "SEEKER_FAILED",
            Self::SeekerCancelled => "SEEKER_CANCELLED",
        }
    }

    /// Whether this state is terminal (no further transitions allowed).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::UserDenied | Self::SeekerCompleted | Self::SeekerFailed | Self::SeekerCancelled
        )
    }

    /// Valid target states from this state.
    pub fn valid_transitions(&self) -> &'static [RequestStatus] {
        match self {
            Self::None => &[Self::Initial],
            Self::Initial => &[Self::UserCompleted, Self::UserDenied, Self::SeekerCancelled],
            Self::UserCompleted => &[Self::SeekerCompleted, Self::SeekerFailed],
            Self::UserDenied
            | Self::SeekerCompleted
            | Self::SeekerFailed
            | Self::SeekerCancelled => &[],
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── The request record ─────────────────────────────────────────────────

/// A seeker's paid request for the data behind one user certificate.
///
/// The price is captured at submission, so configuration changes after the
/// fact cannot desynchronize refunds or settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataRequest {
    /// Unique request identifier.
    pub id: RequestId,
    /// The paying seeker.
    pub seeker: Address,
    /// The user whose certificate data is requested.
    pub user: Address,
    /// The certificate the request concerns.
    pub certificate_hash: ContentHash,
    /// Price committed in flight for this request.
    pub price: TokenAmount,
    /// Current lifecycle state.
    pub status: RequestStatus,
    /// Digest of the delivery location, recorded on user completion.
    pub delivery_location_hash: Option<ContentHash>,
    /// When the request was submitted (UTC).
    pub submitted_at: DateTime<Utc>,
    /// When the request last changed state (UTC).
    pub updated_at: DateTime<Utc>,
}

impl DataRequest {
    /// Create a freshly submitted request in `Initial` state.
    pub fn submitted(
        seeker: Address,
        user: Address,
        certificate_hash: ContentHash,
        price: TokenAmount,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RequestId::new(),
            seeker,
            user,
            certificate_hash,
            price,
            status: RequestStatus::Initial,
            delivery_location_hash: None,
            submitted_at: now,
            updated_at: now,
        }
    }

    /// Transition `Initial → UserDenied`.
    pub fn deny(&mut self) -> Result<(), EscrowError> {
        self.require_status(RequestStatus::Initial, "user deny")?;
        self.advance(RequestStatus::UserDenied);
        Ok(())
    }

    /// Transition `Initial → UserCompleted`, recording where the data was
    /// delivered.
    pub fn complete(&mut self, delivery_location_hash: ContentHash) -> Result<(), EscrowError> {
        self.require_status(RequestStatus::Initial, "user complete")?;
        self.delivery_location_hash = Some(delivery_location_hash);
        self.advance(RequestStatus::UserCompleted);
        Ok(())
    }

    /// Transition `UserCompleted → SeekerCompleted`.
    pub fn settle(&mut self) -> Result<(), EscrowError> {
        self.require_status(RequestStatus::UserCompleted, "seeker complete")?;
        self.advance(RequestStatus::SeekerCompleted);
        Ok(())
    }

    /// Transition `UserCompleted → SeekerFailed`.
    pub fn fail(&mut self) -> Result<(), EscrowError> {
        self.require_status(RequestStatus::UserCompleted, "seeker fail")?;
        self.advance(RequestStatus::SeekerFailed);
        Ok(())
    }

    /// Transition `Initial → SeekerCancelled`.
    pub fn cancel(&mut self) -> Result<(), EscrowError> {
        self.require_status(RequestStatus::Initial, "seeker cancel")?;
        self.advance(RequestStatus::SeekerCancelled);
        Ok(())
    }

    fn require_status(
        &self,
        expected: RequestStatus,
        attempted: &str,
    ) -> Result<(), EscrowError> {
        if self.status != expected {
            return Err(EscrowError::InvalidTransition {
                from: self.status.as_str().to_string(),
                attempted: attempted.to_string(),
            });
        }
        Ok(())
    }

    fn advance(&mut self, to: RequestStatus) {
        self.status = to;
        self.updated_at = Utc::now();
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

    fn sample_request() -> DataRequest {
        DataRequest::submitted(
            addr(2),
            addr(3),
            ContentHash::of(b"ethereum professional"),
            TokenAmount::new(25_000_000),
        )
    }

    #[test]
    fn submitted_request_starts_initial() {
        let request = sample_request();
        assert_eq!(request.status, RequestStatus::Initial);
        assert_eq!(request.status.code(), 1);
        assert!(request.delivery_location_hash.is_none());
    }

    #[test]
    fn deny_from_initial() {
        let mut request = sample_request();
        request.deny().unwrap();
        assert_eq!(request.status, RequestStatus::UserDenied);
        assert!(request.status.is_terminal());
    }

    #[test]
    fn complete_records_delivery_location() {
        let mut request = sample_request();
        let location = ContentHash::of(b"ipfs://delivery");
        request.complete(location).unwrap();
        assert_eq!(request.status, RequestStatus::UserCompleted);
        assert_eq!(request.delivery_location_hash, Some(location));
        assert!(!request.status.is_terminal());
    }

    #[test]
    fn full_settlement_path_is_irreversible() {
        let mut request = sample_request();
        request.complete(ContentHash::of(b"loc")).unwrap();
        request.settle().unwrap();
        assert_eq!(request.status, RequestStatus::SeekerCompleted);
        assert!(request.status.is_terminal());

        // No transition leaves a terminal state.
        assert!(request.deny().is_err());
        assert!(request.cancel().is_err());
        assert!(request.fail().is_err());
        assert!(request.settle().is_err());
        assert_eq!(request.status, RequestStatus::SeekerCompleted);
    }

    #[test]
    fn cancel_only_from_initial() {
        let mut request = sample_request();
        request.complete(ContentHash::of(b"loc")).unwrap();
        let result = request.cancel();
        assert!(matches!(
            result,
            Err(EscrowError::InvalidTransition { .. })
        ));

        let mut fresh = sample_request();
        fresh.cancel().unwrap();
        assert_eq!(fresh.status, RequestStatus::SeekerCancelled);
    }

    #[test]
    fn fail_only_from_user_completed() {
        let mut request = sample_request();
        assert!(request.fail().is_err());
        request.complete(ContentHash::of(b"loc")).unwrap();
        request.fail().unwrap();
        assert_eq!(request.status, RequestStatus::SeekerFailed);
    }

    #[test]
    fn settle_requires_user_completion_first() {
        let mut request = sample_request();
        let result = request.settle();
        assert!(matches!(
            result,
            Err(EscrowError::InvalidTransition { .. })
        ));
        assert_eq!(request.status, RequestStatus::Initial);
    }

    #[test]
    fn status_codes_match_wire_order() {
        assert_eq!(RequestStatus::None.code(), 0);
        assert_eq!(RequestStatus::Initial.code(), 1);
        assert_eq!(RequestStatus::UserCompleted.code(), 2);
        assert_eq!(RequestStatus::UserDenied.code(), 3);
        assert_eq!(RequestStatus::SeekerCompleted.code(), 4);
        assert_eq!(RequestStatus::SeekerFailed.code(), 5);
        assert_eq!(RequestStatus::SeekerCancelled.code(), 6);
    }

    #[test]
    fn terminal_set_matches_graph() {
        assert!(!RequestStatus::None.is_terminal());
        assert!(!RequestStatus::Initial.is_terminal());
        assert!(!RequestStatus::UserCompleted.is_terminal());
        assert!(RequestStatus::UserDenied.is_terminal());
        assert!(RequestStatus::SeekerCompleted.is_terminal());
        assert!(RequestStatus::SeekerFailed.is_terminal());
        assert!(RequestStatus::SeekerCancelled.is_terminal());
    }

    #[test]
    fn valid_transitions_match_graph() {
        assert_eq!(RequestStatus::None.valid_transitions(), &[RequestStatus::Initial]);
        assert_eq!(
            RequestStatus::Initial.valid_transitions(),
            &[
                RequestStatus::UserCompleted,
                RequestStatus::UserDenied,
                RequestStatus::SeekerCancelled
            ]
        );
        assert_eq!(
            RequestStatus::UserCompleted.valid_transitions(),
            &[RequestStatus::SeekerCompleted, RequestStatus::SeekerFailed]
        );
        for terminal in [
            RequestStatus::UserDenied,
            RequestStatus::SeekerCompleted,
            RequestStatus::SeekerFailed,
            RequestStatus::SeekerCancelled,
        ] {
            assert!(terminal.valid_transitions().is_empty());
        }
    }

    #[test]
    fn request_serde_roundtrip() {
        let mut request = sample_request();
        request.complete(ContentHash::of(b"loc")).unwrap();

        let json = serde_json::to_string(&request).unwrap();
        let back: DataRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, request.id);
        assert_eq!(back.status, request.status);
        assert_eq!(back.price, request.price);
        assert_eq!(back.delivery_location_hash, request.delivery_location_hash);
    }

    #[test]
    fn request_id_display_and_roundtrip() {
        let id = RequestId::new();
        assert!(format!("{id}").starts_with("request:"));
        let uuid = *id.as_uuid();
        assert_eq!(RequestId::from_uuid(uuid), id);
    }
}
