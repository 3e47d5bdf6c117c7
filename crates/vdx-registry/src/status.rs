//! # Registry Outcome Codes
//!
//! The canonical result enumeration reported on registry events. Outcomes
//! that are expected in normal operation (re-adding an active issuer,
//! removing an unknown one) are statuses, not errors: the call commits, the
//! event carries the code, and no state changes unless the code is
//! [`Success`](RegistryStatus::Success).
//!
//! Every outcome has a distinct wire code.

use serde::{Deserialize, Serialize};

/// Outcome of a registry mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistryStatus {
    /// The operation changed state.
    Success,
    /// The referenced record does not exist.
    NotFound,
    /// The record already exists in the requested state.
    AlreadyExists,
    /// The record is already inactive.
    AlreadyInactive,
}

impl RegistryStatus {
    /// The wire code carried on emitted events.
    pub fn code(&self) -> u8 {
        match self {
            Self::Success => 0,
            Self::NotFound => 1,
            Self::AlreadyExists => 2,
            Self::AlreadyInactive => 3,
        }
    }

    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::AlreadyInactive => "ALREADY_INACTIVE",
        }
    }
}

impl std::fmt::Display for RegistryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            RegistryStatus::Success.code(),
            RegistryStatus::NotFound.code(),
            RegistryStatus::AlreadyExists.code(),
            RegistryStatus::AlreadyInactive.code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(format!("{}", RegistryStatus::Success), "SUCCESS");
        assert_eq!(format!("{}", RegistryStatus::NotFound), "NOT_FOUND");
        assert_eq!(format!("{}", RegistryStatus::AlreadyExists), "ALREADY_EXISTS");
        assert_eq!(
            format!("{}", RegistryStatus::AlreadyInactive),
            "ALREADY_INACTIVE"
        );
    }
}
