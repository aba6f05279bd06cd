//! Epoch fee distributor.
//!
//! Fees arriving in the vault are bucketed by week (`checkpoint_token`)
//! and paid out per week in proportion to cached voting power
//! (`checkpoint_total_supply`). Both cursors advance lazily inside
//! whichever call touches them, bounded per call.
//!
//! - [`FeeDistributor`]: shares follow escrow voting power
//! - [`GaugeFeeDistributor`]: shares follow gauge relative weight, then
//!   each voter's vote line on the gauge

mod buckets;
mod claim;
mod fee;
mod gauge;
mod vault;

pub use fee::FeeDistributor;
pub use gauge::GaugeFeeDistributor;
pub use vault::FeeVault;
