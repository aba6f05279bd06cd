// Allow manual assign operations - U256 doesn't implement AddAssign/SubAssign
#![allow(clippy::assign_op_pattern)]

//! Vote-escrow engine.
//!
//! Three components share one clock, supplied by the caller through an
//! [`ExecutionContext`]:
//!
//! - [`VotingEscrow`]: time-locked deposits whose voting power decays
//!   linearly to zero at unlock
//! - [`GaugeController`]: voters spread their power across gauges and the
//!   controller derives each gauge's relative weight per week
//! - [`FeeDistributor`] and [`GaugeFeeDistributor`]: weekly fee buckets
//!   paid out against escrow power or gauge votes
//!
//! Token balances live behind the [`TokenLedger`] trait. Nothing here does
//! networking or persistence.
//!
//! # Example
//!
//! ```ignore
//! use vecurve_state::{ExecutionContext, EscrowConfig, MemoryLedger, VotingEscrow};
//!
//! let ctx = ExecutionContext::new(alice, now, height);
//! let mut escrow = VotingEscrow::new(escrow_address, EscrowConfig::default(), &ctx);
//! escrow.create_lock(&ctx, &mut ledger, amount, now + 4 * YEAR, &authorization)?;
//! let power = escrow.balance_of(&alice, now);
//! ```

mod access;
mod config;
mod context;
mod controller;
mod distributor;
mod error;
mod escrow;
mod events;
mod ledger;

pub use access::{AccessControl, Role, LOCK_CREATOR};
pub use config::{
    ConfigError, ControllerConfig, DistributorConfig, EngineConfig, EscrowConfig, MAX_GAUGE_TYPES,
};
pub use context::ExecutionContext;
pub use controller::{GaugeController, MAX_GAUGE_WEIGHT, MAX_TYPE_WEIGHT};
pub use distributor::{FeeDistributor, FeeVault, GaugeFeeDistributor};
pub use error::{StateError, StateResult};
pub use escrow::{EscrowReader, VotingEscrow};
pub use events::{DepositKind, Event};
pub use ledger::{Authorization, MemoryLedger, TokenLedger};
