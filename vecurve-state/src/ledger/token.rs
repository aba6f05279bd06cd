//! Token ledger interface.

use serde::{Deserialize, Serialize};
use vecurve_core::{Address, U256};

use crate::error::StateResult;

/// Single-use, expiring capability to pull tokens from a signer.
///
/// The signature is opaque to the engine; the ledger decides whether it
/// is acceptable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    /// Per-signer nonce. Each nonce is accepted once.
    pub nonce: u64,
    /// Last timestamp at which the authorization is valid.
    pub deadline: u64,
    /// Signature bytes.
    pub signature: Vec<u8>,
}

impl Authorization {
    /// Create an authorization.
    pub fn new(nonce: u64, deadline: u64, signature: Vec<u8>) -> Self {
        Self {
            nonce,
            deadline,
            signature,
        }
    }
}

/// Fungible token balance storage.
///
/// Every method either moves exactly `amount` or fails without effect.
pub trait TokenLedger {
    /// Balance of `account`.
    fn balance_of(&self, account: &Address) -> U256;

    /// Move `amount` from `from` to `to`. `from` is the acting account.
    fn transfer(&mut self, from: &Address, to: &Address, amount: U256) -> StateResult<()>;

    /// Move `amount` from `from` to `to` against `spender`'s allowance.
    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> StateResult<()>;

    /// Move `amount` from `from` to `to` under a signed authorization.
    fn pull_transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: U256,
        authorization: &Authorization,
        now: u64,
    ) -> StateResult<()>;
}
