//! Per-lock voting-power lines.

use vecurve_core::{Address, LockedBalance, U256};

use crate::error::{StateError, StateResult};

/// Slope and bias of a lock's line at the moment of a checkpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Line {
    pub slope: i128,
    pub bias: i128,
}

impl Line {
    /// Line of `lock` evaluated at `now`.
    ///
    /// Expired and empty locks have a zero line. A lock of `max_time`
    /// seconds starts with bias equal to its amount (up to rounding).
    pub fn of(lock: &LockedBalance, now: u64, divisor: U256) -> StateResult<Self> {
        if lock.end <= now || lock.amount.is_zero() {
            return Ok(Self::default());
        }
        let slope = (lock.amount / divisor).to_i128("slope")?;
        let bias = slope
            .checked_mul((lock.end - now) as i128)
            .ok_or(StateError::ArithmeticOverflow)?;
        Ok(Self { slope, bias })
    }
}

/// A validated change of one account's lock.
///
/// Built before any token moves so that committing it cannot fail.
#[derive(Clone, Debug)]
pub(crate) struct LockTransition {
    pub account: Address,
    pub old: LockedBalance,
    pub new: LockedBalance,
    pub old_line: Line,
    pub new_line: Line,
}

impl LockTransition {
    pub fn new(
        account: Address,
        old: LockedBalance,
        new: LockedBalance,
        now: u64,
        divisor: U256,
    ) -> StateResult<Self> {
        Ok(Self {
            account,
            old,
            new,
            old_line: Line::of(&old, now, divisor)?,
            new_line: Line::of(&new, now, divisor)?,
        })
    }
}
