//! In-memory token ledger.

use std::collections::{HashMap, HashSet};

use vecurve_core::{Address, U256, ZERO_ADDRESS};

use super::token::{Authorization, TokenLedger};
use crate::error::{StateError, StateResult};

/// HashMap-backed [`TokenLedger`].
#[derive(Clone, Debug, Default)]
pub struct MemoryLedger {
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    used_nonces: HashSet<(Address, u64)>,
    total_supply: U256,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` new tokens for `to`.
    pub fn mint(&mut self, to: &Address, amount: U256) {
        let balance = self.balances.entry(*to).or_default();
        *balance = *balance + amount;
        self.total_supply = self.total_supply + amount;
    }

    /// Set `spender`'s allowance over `owner`'s tokens.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: U256) {
        self.allowances.insert((*owner, *spender), amount);
    }

    /// Remaining allowance of `spender` over `owner`'s tokens.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    /// Total tokens minted.
    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    /// Whether `nonce` has been consumed for `signer`.
    pub fn is_nonce_used(&self, signer: &Address, nonce: u64) -> bool {
        self.used_nonces.contains(&(*signer, nonce))
    }

    fn move_balance(&mut self, from: &Address, to: &Address, amount: U256) -> StateResult<()> {
        if *to == ZERO_ADDRESS {
            return Err(StateError::ZeroAddress);
        }
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(StateError::InsufficientBalance {
                account: *from,
                balance,
                required: amount,
            });
        }
        self.balances.insert(*from, balance - amount);
        let to_balance = self.balances.entry(*to).or_default();
        *to_balance = *to_balance + amount;
        Ok(())
    }
}

impl TokenLedger for MemoryLedger {
    fn balance_of(&self, account: &Address) -> U256 {
        self.balances.get(account).copied().unwrap_or_default()
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: U256) -> StateResult<()> {
        self.move_balance(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> StateResult<()> {
        let allowance = self.allowance(from, spender);
        if allowance < amount {
            return Err(StateError::InsufficientAllowance {
                allowance,
                required: amount,
            });
        }
        self.move_balance(from, to, amount)?;
        self.allowances.insert((*from, *spender), allowance - amount);
        Ok(())
    }

    fn pull_transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: U256,
        authorization: &Authorization,
        now: u64,
    ) -> StateResult<()> {
        if authorization.signature.is_empty() {
            return Err(StateError::AuthorizationInvalid);
        }
        if now > authorization.deadline {
            return Err(StateError::AuthorizationExpired {
                deadline: authorization.deadline,
                now,
            });
        }
        if self.is_nonce_used(from, authorization.nonce) {
            return Err(StateError::AuthorizationReused {
                nonce: authorization.nonce,
            });
        }
        self.move_balance(from, to, amount)?;
        self.used_nonces.insert((*from, authorization.nonce));
        Ok(())
    }
}
