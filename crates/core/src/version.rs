//! Optimistic-concurrency version stamp.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Monotonically increasing version of a stored row.
///
/// Starts at 0 when the row is created and increments by exactly 1 on every
/// committed mutation. Writers pass back the version they observed; a write
/// whose observed version no longer matches the stored one is rejected as a
/// conflict instead of silently overwriting the other writer's effect.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// Version of a freshly created row.
    pub const ZERO: Version = Version(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// The version produced by one committed mutation on top of `self`.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Check an observed version against the currently stored one.
    ///
    /// `self` is the version the caller observed when it read the row.
    pub fn check(self, stored: Version) -> DomainResult<()> {
        if self == stored {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "stale version (observed {self}, stored {stored})"
            )))
        }
    }
}

impl core::fmt::Display for Version {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_increments_by_one() {
        assert_eq!(Version::ZERO.next(), Version::new(1));
        assert_eq!(Version::new(41).next().value(), 42);
    }

    #[test]
    fn check_accepts_matching_version() {
        assert!(Version::new(3).check(Version::new(3)).is_ok());
    }

    #[test]
    fn check_rejects_stale_version_as_conflict() {
        let err = Version::new(3).check(Version::new(4)).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }
}
