//! Escrow lock records.

use serde::{Deserialize, Serialize};

use crate::u256::U256;

/// An account's escrowed amount and its unlock time.
///
/// `end` is always aligned to the week grid. A zeroed lock means the
/// account has no lock (never created, or withdrawn).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedBalance {
    /// Amount of base token held in escrow.
    pub amount: U256,
    /// Unlock time (week-aligned).
    pub end: u64,
}

impl LockedBalance {
    /// Create a lock record.
    pub const fn new(amount: U256, end: u64) -> Self {
        Self { amount, end }
    }

    /// True when nothing is locked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.amount.is_zero()
    }

    /// True when a non-empty lock has reached its unlock time.
    #[inline]
    pub fn is_expired(&self, now: u64) -> bool {
        !self.is_empty() && self.end <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_expired() {
        let none = LockedBalance::default();
        assert!(none.is_empty());
        assert!(!none.is_expired(u64::MAX));

        let lock = LockedBalance::new(U256::from(5u64), 1000);
        assert!(!lock.is_expired(999));
        assert!(lock.is_expired(1000));
    }
}
