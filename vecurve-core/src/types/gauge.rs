//! Gauge controller records.

use serde::{Deserialize, Serialize};

use crate::types::Address;
use crate::u256::U256;

/// Index of a gauge in the controller's registry.
pub type GaugeId = u32;

/// Index of a gauge type. Types are numbered from zero in insertion order.
pub type TypeId = u32;

/// A registered gauge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gauge {
    /// Registry index.
    pub id: GaugeId,
    /// Type the gauge was registered under. Fixed for life.
    pub type_id: TypeId,
    /// Gauge address.
    pub address: Address,
}

/// A gauge type (for example "liquidity" or "lending").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaugeType {
    /// Display name.
    pub name: String,
}

/// One voter's current allocation to one gauge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotedSlope {
    /// Share of the voter's slope assigned to the gauge.
    pub slope: U256,
    /// Share of the voter's power in basis points.
    pub power: u16,
    /// Voter's lock end when the vote was cast.
    pub end: u64,
}

/// A weekly weight vertex: value `bias` at the week start, falling by
/// `slope` per second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightPoint {
    /// Weight at the week start.
    pub bias: U256,
    /// Decay per second.
    pub slope: U256,
}

impl WeightPoint {
    /// Create a weight point.
    pub const fn new(bias: U256, slope: U256) -> Self {
        Self { bias, slope }
    }

    /// Value `dt` seconds after the vertex, floored at zero.
    pub fn decayed(&self, dt: u64) -> U256 {
        self.bias.saturating_sub(self.slope * U256::from(dt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_point_decay() {
        let p = WeightPoint::new(U256::from(100u64), U256::from(3u64));
        assert_eq!(p.decayed(10), U256::from(70u64));
        assert_eq!(p.decayed(1000), U256::zero());
    }
}
