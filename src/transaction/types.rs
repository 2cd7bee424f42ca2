//! Core type vocabulary for VELA transactions.
//!
//! Small, `Copy`-friendly types that appear in every wire message and
//! every signed authorization text. Keep them boring.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config;

// ---------------------------------------------------------------------------
// TxKind
// ---------------------------------------------------------------------------

/// Discriminant for the operation a transaction performs.
///
/// The display strings double as the wire `type` tag and as the leading
/// word of the human-readable authorization template, so they are part of
/// the signed byte stream. Renaming a variant is a protocol change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxKind {
    /// Value movement between two VELA accounts.
    Transfer,
    /// Value movement from a VELA account out to a root-chain address.
    Withdraw,
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transfer => write!(f, "Transfer"),
            Self::Withdraw => write!(f, "Withdraw"),
        }
    }
}

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// The account's index in the VELA state tree.
///
/// Assigned by the network when the account first appears; distinct from
/// the root-chain address, which exists before the account does.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct AccountId(pub u32);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TimeRange
// ---------------------------------------------------------------------------

/// The `[valid_from, valid_until]` window during which a transaction may
/// execute, in Unix seconds.
///
/// The window is the protocol's entire cancellation story: there is no
/// revoke call, you just let the deadline pass. The oracle enforces it at
/// execution time; this layer never runs its own clock against it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Earliest execution time. Zero means "since forever".
    pub valid_from: u64,
    /// Latest execution time. `u64::MAX` means "no deadline".
    pub valid_until: u64,
}

impl TimeRange {
    /// An explicit window.
    pub fn new(valid_from: u64, valid_until: u64) -> Self {
        Self {
            valid_from,
            valid_until,
        }
    }

    /// The open window: valid since forever, valid forever.
    pub fn open() -> Self {
        Self {
            valid_from: config::MIN_VALID_FROM,
            valid_until: config::MAX_VALID_UNTIL,
        }
    }

    /// A window that only ends.
    pub fn until(deadline: u64) -> Self {
        Self {
            valid_from: config::MIN_VALID_FROM,
            valid_until: deadline,
        }
    }

    /// Whether `now` falls inside the window, inclusive on both ends.
    pub fn contains(&self, now: u64) -> bool {
        self.valid_from <= now && now <= self.valid_until
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display_is_the_wire_tag() {
        assert_eq!(TxKind::Transfer.to_string(), "Transfer");
        assert_eq!(TxKind::Withdraw.to_string(), "Withdraw");
    }

    #[test]
    fn open_window_contains_everything() {
        let range = TimeRange::open();
        assert!(range.contains(0));
        assert!(range.contains(u64::MAX));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let range = TimeRange::new(10, 20);
        assert!(!range.contains(9));
        assert!(range.contains(10));
        assert!(range.contains(20));
        assert!(!range.contains(21));
    }

    #[test]
    fn until_starts_at_zero() {
        let range = TimeRange::until(100);
        assert_eq!(range.valid_from, 0);
        assert_eq!(range.valid_until, 100);
    }

    #[test]
    fn serde_roundtrip() {
        let range = TimeRange::new(5, 500);
        let json = serde_json::to_string(&range).unwrap();
        let recovered: TimeRange = serde_json::from_str(&json).unwrap();
        assert_eq!(range, recovered);
    }
}
