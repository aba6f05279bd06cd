//! Token ledger collaborator.
//!
//! The engine never stores token balances itself. Locked tokens and fee
//! balances live in a [`TokenLedger`]; components move them through the
//! trait and read their own balance back from it.

mod memory;
mod token;

pub use memory::MemoryLedger;
pub use token::{Authorization, TokenLedger};
