//! WAD fixed-point operations for U256.
//!
//! Weights, relative weights and voting-power percentages are scaled by
//! 10^18. All divisions round toward zero; the residue stays with the
//! caller as dust.

use super::{BPS_DENOMINATOR, U256, U512, WAD};
use crate::error::CoreError;

impl U256 {
    /// `self × numerator / denominator` through a 512-bit product.
    ///
    /// Zero when the denominator is zero. Fails with
    /// [`CoreError::Overflow`] when the quotient does not fit 256 bits.
    pub fn checked_mul_div(&self, numerator: U256, denominator: U256) -> Result<U256, CoreError> {
        if denominator.is_zero() {
            return Ok(U256::zero());
        }
        let quotient = self.widen() * numerator.widen() / denominator.widen();
        U512::narrow(quotient).ok_or(CoreError::Overflow)
    }

    /// Like [`U256::checked_mul_div`], saturating at `U256::MAX`.
    pub fn mul_div(&self, numerator: U256, denominator: U256) -> U256 {
        self.checked_mul_div(numerator, denominator).unwrap_or(U256::MAX)
    }

    /// WAD multiplication: `(a × b) / 10^18`.
    pub fn wad_mul(&self, other: &Self) -> Self {
        self.mul_div(*other, WAD)
    }

    /// WAD division: `(a × 10^18) / b`.
    ///
    /// Returns zero if divisor is zero (rather than panicking).
    pub fn wad_div(&self, other: &Self) -> Self {
        self.mul_div(WAD, *other)
    }

    /// Take `bps` basis points of `self`.
    pub fn bps(&self, bps: u16) -> U256 {
        self.mul_div(U256::from(bps), U256::from(BPS_DENOMINATOR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_rounds_down() {
        let a = U256::from(1000u64);
        assert_eq!(a.mul_div(U256::from(2u64), U256::from(3u64)), U256::from(666u64));
    }

    #[test]
    fn test_mul_div_by_zero() {
        assert!(U256::from(10u64).mul_div(U256::one(), U256::zero()).is_zero());
    }

    #[test]
    fn test_mul_div_full_width() {
        let max = U256::MAX;
        assert_eq!(max.mul_div(max, max), max);
        assert_eq!(max.mul_div(WAD, WAD * U256::from(2u64)), max / U256::from(2u64));
        assert_eq!(
            max.checked_mul_div(U256::from(2u64), U256::one()),
            Err(CoreError::Overflow)
        );
        assert_eq!(max.mul_div(U256::from(2u64), U256::one()), max);
    }

    #[test]
    fn test_wad_mul() {
        let half = WAD / U256::from(2u64);
        let three = U256::from_wad_units(3);
        assert_eq!(three.wad_mul(&half), U256::from(1_500_000_000_000_000_000u64));
    }

    #[test]
    fn test_wad_div() {
        let one = U256::from(1u64);
        let three = U256::from(3u64);
        assert_eq!(one.wad_div(&three), U256::from(333_333_333_333_333_333u64));
        assert!(one.wad_div(&U256::zero()).is_zero());
    }

    #[test]
    fn test_bps() {
        let slope = U256::from(1_000_000u64);
        assert_eq!(slope.bps(10_000), slope);
        assert_eq!(slope.bps(2_500), U256::from(250_000u64));
        assert_eq!(slope.bps(0), U256::zero());
    }
}
