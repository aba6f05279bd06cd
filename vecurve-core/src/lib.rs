//! # Vecurve Core
//!
//! Core types and checkpoint math for the vecurve tokenomics engine.
//!
//! This crate provides the foundation for the engine crate:
//! - 256-bit arithmetic and WAD (10^18) fixed-point helpers
//! - The epoch grid (`WEEK`, `MAXTIME`, [`week_floor`])
//! - [`Point`], a piecewise-linear decay line, and [`PointHistory`], an
//!   append-only arena of points searched by timestamp or block
//! - Lock, gauge and vote records shared by the escrow, controller and
//!   distributor

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod checkpoint;
pub mod error;
pub mod time;
pub mod types;
pub mod u256;

// Re-export commonly used types at crate root
pub use checkpoint::{find_checkpoint_at_or_before, Advance, CheckpointKey, PointHistory};
pub use error::CoreError;
pub use time::{week_ceil, week_floor, DAY, MAXTIME, WEEK, YEAR};
pub use types::{
    Address, Gauge, GaugeId, GaugeType, LockedBalance, Point, TypeId, VotedSlope, WeightPoint,
    ZERO_ADDRESS,
};
pub use u256::{BPS_DENOMINATOR, U256, WAD};
