//! Core data types shared by the escrow, controller and distributor.
//!
//! - [`Point`]: one vertex of a piecewise-linear voting-power line
//! - [`LockedBalance`]: an account's escrowed amount and unlock time
//! - [`Gauge`], [`GaugeType`]: controller registry entries
//! - [`VotedSlope`], [`WeightPoint`]: controller vote and weight records

mod gauge;
mod lock;
mod point;

pub use gauge::{Gauge, GaugeId, GaugeType, TypeId, VotedSlope, WeightPoint};
pub use lock::LockedBalance;
pub use point::Point;

/// A 20-byte account or contract address.
pub type Address = [u8; 20];

/// The zero address. Never a valid owner, receiver or gauge.
pub const ZERO_ADDRESS: Address = [0u8; 20];
