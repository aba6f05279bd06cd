//! 256-bit unsigned integer arithmetic for token amounts and weights.
//!
//! Token amounts, gauge weights and weight products are carried as `U256`.
//! Voting-power lines are signed 128-bit values (see [`crate::Point`]);
//! conversions between the two are checked.

// Allow clippy warnings from the uint crate's construct_uint macro
#![allow(clippy::manual_div_ceil)]
#![allow(clippy::assign_op_pattern)]

mod fixed_point;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uint::construct_uint;

use crate::error::CoreError;

construct_uint! {
    /// 256-bit unsigned integer.
    ///
    /// Used for:
    /// - Token amounts and balances
    /// - Gauge and type weights (WAD-scaled)
    /// - Weight products (`weight × type_weight`) that overflow 128 bits
    pub struct U256(4);
}

construct_uint! {
    /// 512-bit integer, the intermediate width of [`U256::mul_div`].
    pub struct U512(8);
}

/// Fixed-point scale: 10^18.
pub const WAD: U256 = U256([1_000_000_000_000_000_000, 0, 0, 0]);

/// Basis-point denominator for vote power (100% = 10000).
pub const BPS_DENOMINATOR: u64 = 10_000;

impl U256 {
    /// Create a U256 from a u64 value.
    #[inline]
    pub const fn from_u64(value: u64) -> Self {
        U256([value, 0, 0, 0])
    }

    /// Create a U256 from a u128 value.
    #[inline]
    pub const fn from_u128(value: u128) -> Self {
        U256([value as u64, (value >> 64) as u64, 0, 0])
    }

    /// `value × 10^18`, for writing whole-token amounts.
    #[inline]
    pub fn from_wad_units(value: u64) -> Self {
        U256::from(value) * WAD
    }

    /// Convert to u64, returning None if the value doesn't fit.
    #[inline]
    pub fn to_u64(&self) -> Option<u64> {
        if self.0[1] == 0 && self.0[2] == 0 && self.0[3] == 0 {
            Some(self.0[0])
        } else {
            None
        }
    }

    /// Convert to u128, returning None if the value doesn't fit.
    #[inline]
    pub fn to_u128(&self) -> Option<u128> {
        if self.0[2] == 0 && self.0[3] == 0 {
            Some((self.0[1] as u128) << 64 | self.0[0] as u128)
        } else {
            None
        }
    }

    /// Convert to a non-negative i128 for use as a line bias or slope.
    pub fn to_i128(&self, what: &'static str) -> Result<i128, CoreError> {
        self.to_u128()
            .and_then(|v| i128::try_from(v).ok())
            .ok_or(CoreError::OutOfRange { what })
    }

    /// Convert a signed line value to U256, flooring negatives at zero.
    #[inline]
    pub fn from_i128_floored(value: i128) -> Self {
        if value <= 0 {
            U256::zero()
        } else {
            U256::from_u128(value as u128)
        }
    }
}

impl U256 {
    /// Zero-extend to 512 bits.
    #[inline]
    pub fn widen(&self) -> U512 {
        let U256(ref w) = *self;
        U512([w[0], w[1], w[2], w[3], 0, 0, 0, 0])
    }
}

impl U512 {
    /// Truncate to 256 bits, or `None` if the high half is set.
    #[inline]
    pub fn narrow(value: U512) -> Option<U256> {
        let U512(ref w) = value;
        if w[4..].iter().all(|x| *x == 0) {
            Some(U256([w[0], w[1], w[2], w[3]]))
        } else {
            None
        }
    }
}

// Amounts serialize as decimal strings so JSON readers never lose precision.
impl Serialize for U256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_dec_str(&s).map_err(|e| serde::de::Error::custom(format!("{:?}", e)))
    }
}
