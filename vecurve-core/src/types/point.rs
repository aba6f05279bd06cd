//! Linear decay points.

use serde::{Deserialize, Serialize};

use crate::u256::U256;

/// One vertex of a decaying voting-power line.
///
/// Between vertices the line value is `bias - slope × (t - ts)`, floored
/// at zero. `blk` records the block height observed when the vertex was
/// written so historical queries can be answered by block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// Value of the line at `ts`.
    pub bias: i128,
    /// Decrease in value per second.
    pub slope: i128,
    /// Timestamp of the vertex.
    pub ts: u64,
    /// Block height of the vertex.
    pub blk: u64,
}

impl Point {
    /// Create a point.
    pub const fn new(bias: i128, slope: i128, ts: u64, blk: u64) -> Self {
        Self { bias, slope, ts, blk }
    }

    /// Line value at `t`, floored at zero.
    ///
    /// Times before `ts` evaluate to `bias`.
    pub fn value_at(&self, t: u64) -> i128 {
        let dt = t.saturating_sub(self.ts) as i128;
        let v = self.bias.saturating_sub(self.slope.saturating_mul(dt));
        v.max(0)
    }

    /// [`Point::value_at`] as an unsigned amount.
    pub fn balance_at(&self, t: u64) -> U256 {
        U256::from_i128_floored(self.value_at(t))
    }

    /// Whether the line has fully decayed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bias <= 0 && self.slope <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_decays_linearly() {
        let p = Point::new(1000, 10, 100, 1);
        assert_eq!(p.value_at(100), 1000);
        assert_eq!(p.value_at(150), 500);
        assert_eq!(p.value_at(200), 0);
    }

    #[test]
    fn test_value_floored_at_zero() {
        let p = Point::new(1000, 10, 100, 1);
        assert_eq!(p.value_at(10_000), 0);
        assert!(p.balance_at(10_000).is_zero());
    }

    #[test]
    fn test_value_before_ts_is_bias() {
        let p = Point::new(1000, 10, 100, 1);
        assert_eq!(p.value_at(50), 1000);
    }

    #[test]
    fn test_default_is_empty() {
        assert!(Point::default().is_empty());
        assert!(!Point::new(1, 0, 0, 0).is_empty());
    }
}
