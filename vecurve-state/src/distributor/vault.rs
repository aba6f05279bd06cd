//! Fee vault shared by the plain and gauge-scoped distributors.

use tracing::{debug, info, warn};
use vecurve_core::{Address, U256, ZERO_ADDRESS};

use super::buckets::TokenBuckets;
use crate::access::AccessControl;
use crate::config::DistributorConfig;
use crate::context::ExecutionContext;
use crate::error::{StateError, StateResult};
use crate::events::Event;
use crate::ledger::TokenLedger;

/// Fee balance, weekly buckets and admin switches.
#[derive(Clone, Debug)]
pub struct FeeVault {
    address: Address,
    config: DistributorConfig,
    access: AccessControl,
    pub(crate) buckets: TokenBuckets,
    can_checkpoint_token: bool,
    paused: bool,
    emergency_return: Address,
    pub(crate) events: Vec<Event>,
}

impl FeeVault {
    pub(crate) fn new(
        address: Address,
        config: DistributorConfig,
        start_time: u64,
        ctx: &ExecutionContext,
    ) -> Self {
        Self {
            address,
            config,
            access: AccessControl::new(ctx.caller),
            buckets: TokenBuckets::new(start_time),
            can_checkpoint_token: false,
            paused: false,
            emergency_return: ctx.caller,
            events: Vec::new(),
        }
    }

    /// Address holding the fee balance.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Distributor parameters.
    pub fn config(&self) -> &DistributorConfig {
        &self.config
    }

    /// Ownership and roles.
    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    /// Mutable ownership and roles.
    pub fn access_mut(&mut self) -> &mut AccessControl {
        &mut self.access
    }

    /// First week start of the distribution.
    pub fn start_time(&self) -> u64 {
        self.buckets.start_time
    }

    /// Time of the last token checkpoint.
    pub fn last_token_time(&self) -> u64 {
        self.buckets.last_token_time
    }

    /// Fee balance seen at the last token checkpoint, net of payouts.
    pub fn token_last_balance(&self) -> U256 {
        self.buckets.token_last_balance
    }

    /// Fees attributed to the week starting at `week`.
    pub fn tokens_per_week(&self, week: u64) -> U256 {
        self.buckets.tokens_per_week(week)
    }

    /// Whether third parties may checkpoint the token.
    pub fn can_checkpoint_token(&self) -> bool {
        self.can_checkpoint_token
    }

    /// Whether claims are halted.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Receiver of [`FeeVault::recover_balance`].
    pub fn emergency_return(&self) -> Address {
        self.emergency_return
    }

    /// Drain recorded events.
    pub fn take_events(&mut self) -> Vec<Event> {
        let mut events = self.access.take_events();
        events.append(&mut self.events);
        events
    }

    pub(crate) fn ensure_not_paused(&self) -> StateResult<()> {
        if self.paused {
            Err(StateError::Paused)
        } else {
            Ok(())
        }
    }

    /// Whether a third-party checkpoint is currently allowed.
    pub(crate) fn token_checkpoint_due(&self, now: u64) -> bool {
        self.can_checkpoint_token
            && now >= self.buckets.last_token_time + self.config.token_checkpoint_deadline
    }

    /// Attribute new fees to weekly buckets.
    ///
    /// The owner may call at any time. Others need third-party checkpoints
    /// enabled and a day since the last one (`FD001` otherwise).
    pub fn checkpoint_token<L: TokenLedger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &L,
    ) -> StateResult<()> {
        if !self.access.is_owner(&ctx.caller) && !self.token_checkpoint_due(ctx.timestamp) {
            return Err(StateError::TokenCheckpointNotAllowed);
        }
        self.checkpoint_token_unchecked(ctx, ledger);
        Ok(())
    }

    pub(crate) fn checkpoint_token_unchecked<L: TokenLedger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &L,
    ) {
        let balance = ledger.balance_of(&self.address);
        let tokens = self.buckets.checkpoint(
            ctx.timestamp,
            balance,
            self.config.max_token_checkpoint_weeks,
        );
        debug!(time = ctx.timestamp, tokens = %tokens, "Token checkpoint");
        self.events.push(Event::CheckpointToken {
            time: ctx.timestamp,
            tokens,
        });
    }

    /// Pull `amount` of fees from the caller (allowance-based).
    pub fn burn<L: TokenLedger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &mut L,
        amount: U256,
    ) -> StateResult<()> {
        if amount.is_zero() {
            return Err(StateError::ZeroAmount);
        }
        ledger.transfer_from(&self.address, &ctx.caller, &self.address, amount)?;
        info!(from = ?&ctx.caller[..4], amount = %amount, "Fees received");
        if self.token_checkpoint_due(ctx.timestamp) {
            self.checkpoint_token_unchecked(ctx, ledger);
        }
        Ok(())
    }

    /// Enable or disable third-party token checkpoints. Owner only.
    pub fn toggle_allow_checkpoint_token(&mut self, ctx: &ExecutionContext) -> StateResult<()> {
        self.access.ensure_owner(ctx)?;
        self.can_checkpoint_token = !self.can_checkpoint_token;
        info!(enabled = self.can_checkpoint_token, "Toggle checkpoint token");
        self.events.push(Event::ToggleAllowCheckpointToken {
            enabled: self.can_checkpoint_token,
        });
        Ok(())
    }

    /// Set the receiver of recovered balances. Owner only.
    pub fn set_emergency_return(
        &mut self,
        ctx: &ExecutionContext,
        receiver: Address,
    ) -> StateResult<()> {
        self.access.ensure_owner(ctx)?;
        if receiver == ZERO_ADDRESS {
            return Err(StateError::ZeroAddress);
        }
        self.emergency_return = receiver;
        Ok(())
    }

    /// Halt claims. Owner only.
    pub fn pause(&mut self, ctx: &ExecutionContext) -> StateResult<()> {
        self.access.ensure_owner(ctx)?;
        self.paused = true;
        info!("Distributor paused");
        self.events.push(Event::Paused { by: ctx.caller });
        Ok(())
    }

    /// Resume claims. Owner only.
    pub fn unpause(&mut self, ctx: &ExecutionContext) -> StateResult<()> {
        self.access.ensure_owner(ctx)?;
        self.paused = false;
        info!("Distributor unpaused");
        self.events.push(Event::Unpaused { by: ctx.caller });
        Ok(())
    }

    /// Send the whole fee balance to the emergency receiver. Owner only.
    ///
    /// Buckets already written keep their values; later claims against them
    /// fail until the vault is refunded.
    pub fn recover_balance<L: TokenLedger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &mut L,
    ) -> StateResult<U256> {
        self.access.ensure_owner(ctx)?;
        let amount = ledger.balance_of(&self.address);
        if !amount.is_zero() {
            ledger.transfer(&self.address, &self.emergency_return, amount)?;
        }
        self.buckets.token_last_balance = U256::zero();
        warn!(to = ?&self.emergency_return[..4], amount = %amount, "Balance recovered");
        self.events.push(Event::RecoverBalance {
            to: self.emergency_return,
            amount,
        });
        Ok(amount)
    }

    /// Pay `amount` to `to` out of the vault.
    pub(crate) fn pay<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        to: &Address,
        amount: U256,
    ) -> StateResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        ledger.transfer(&self.address, to, amount)?;
        self.buckets.debit(amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use vecurve_core::{week_floor, DAY, WEEK};

    const OWNER: Address = [1u8; 20];
    const VAULT: Address = [0xfd; 20];
    const ALICE: Address = [0xa1; 20];

    fn start() -> u64 {
        week_floor(1_700_000_000)
    }

    fn setup() -> (FeeVault, MemoryLedger, ExecutionContext) {
        let ctx = ExecutionContext::new(OWNER, start(), 1);
        let vault = FeeVault::new(VAULT, DistributorConfig::default(), start(), &ctx);
        (vault, MemoryLedger::new(), ctx)
    }

    #[test]
    fn test_checkpoint_token_gate() {
        let (mut vault, mut ledger, ctx) = setup();
        ledger.mint(&VAULT, U256::from(1_000u64));
        let alice = ctx.with_caller(ALICE).advance(2 * DAY, 10);
        assert_eq!(
            vault.checkpoint_token(&alice, &ledger),
            Err(StateError::TokenCheckpointNotAllowed)
        );

        vault.toggle_allow_checkpoint_token(&ctx).unwrap();
        vault.checkpoint_token(&alice, &ledger).unwrap();
        assert_eq!(vault.tokens_per_week(start()), U256::from(1_000u64));

        // Too soon after the last checkpoint for a third party.
        let soon = alice.advance(DAY / 2, 1);
        assert_eq!(
            vault.checkpoint_token(&soon, &ledger),
            Err(StateError::TokenCheckpointNotAllowed)
        );
        // The owner is never gated.
        vault.checkpoint_token(&soon.with_caller(OWNER), &ledger).unwrap();
    }

    #[test]
    fn test_burn_pulls_fees() {
        let (mut vault, mut ledger, ctx) = setup();
        ledger.mint(&ALICE, U256::from(500u64));
        ledger.approve(&ALICE, &VAULT, U256::from(500u64));
        let alice = ctx.with_caller(ALICE).advance(WEEK / 2, 5);
        vault.burn(&alice, &mut ledger, U256::from(500u64)).unwrap();
        assert_eq!(ledger.balance_of(&VAULT), U256::from(500u64));
        // Third-party checkpoints are off, so nothing is bucketed yet.
        assert_eq!(vault.tokens_per_week(start()), U256::zero());
        assert_eq!(
            vault.burn(&alice, &mut ledger, U256::zero()),
            Err(StateError::ZeroAmount)
        );
    }

    #[test]
    fn test_pause_and_recover() {
        let (mut vault, mut ledger, ctx) = setup();
        ledger.mint(&VAULT, U256::from(900u64));
        assert!(vault.pause(&ctx.with_caller(ALICE)).is_err());
        vault.pause(&ctx).unwrap();
        assert_eq!(vault.ensure_not_paused(), Err(StateError::Paused));
        vault.unpause(&ctx).unwrap();
        assert!(vault.ensure_not_paused().is_ok());

        vault.set_emergency_return(&ctx, ALICE).unwrap();
        assert_eq!(vault.recover_balance(&ctx, &mut ledger), Ok(U256::from(900u64)));
        assert_eq!(ledger.balance_of(&ALICE), U256::from(900u64));
        assert!(vault.token_last_balance().is_zero());
        assert!(matches!(
            vault.take_events().last(),
            Some(Event::RecoverBalance { to, .. }) if *to == ALICE
        ));
    }
}
