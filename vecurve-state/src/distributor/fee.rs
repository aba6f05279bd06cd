//! Fee distributor paying pro rata to escrow voting power.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};
use vecurve_core::{week_floor, Address, Advance, U256, WAD, WEEK, ZERO_ADDRESS};

use super::claim::{walk_claim, ClaimCursor, ClaimOutcome};
use super::vault::FeeVault;
use crate::config::DistributorConfig;
use crate::context::ExecutionContext;
use crate::error::{StateError, StateResult};
use crate::escrow::EscrowReader;
use crate::events::Event;
use crate::ledger::TokenLedger;

/// Pays each week's fee bucket to lock holders in proportion to their
/// voting power at the week start.
#[derive(Clone, Debug)]
pub struct FeeDistributor {
    vault: FeeVault,
    /// Next week start whose voting supply is not cached.
    time_cursor: u64,
    ve_supply: BTreeMap<u64, U256>,
    cursors: HashMap<Address, ClaimCursor>,
}

impl FeeDistributor {
    /// Create a distributor holding fees at `address`, paying from the week
    /// containing `start_time`. Owned by `ctx.caller`.
    pub fn new(
        address: Address,
        config: DistributorConfig,
        start_time: u64,
        ctx: &ExecutionContext,
    ) -> Self {
        Self {
            vault: FeeVault::new(address, config, start_time, ctx),
            time_cursor: week_floor(start_time),
            ve_supply: BTreeMap::new(),
            cursors: HashMap::new(),
        }
    }

    /// Fee vault and admin switches.
    pub fn vault(&self) -> &FeeVault {
        &self.vault
    }

    /// Mutable fee vault and admin switches.
    pub fn vault_mut(&mut self) -> &mut FeeVault {
        &mut self.vault
    }

    /// Drain recorded events.
    pub fn take_events(&mut self) -> Vec<Event> {
        self.vault.take_events()
    }

    /// See [`FeeVault::checkpoint_token`].
    pub fn checkpoint_token<L: TokenLedger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &L,
    ) -> StateResult<()> {
        self.vault.checkpoint_token(ctx, ledger)
    }

    /// Fees attributed to the week starting at `week`.
    pub fn tokens_per_week(&self, week: u64) -> U256 {
        self.vault.tokens_per_week(week)
    }

    /// Next week start whose voting supply is not cached.
    pub fn time_cursor(&self) -> u64 {
        self.time_cursor
    }

    /// Cached total voting power at week start `week`.
    pub fn ve_supply(&self, week: u64) -> U256 {
        self.ve_supply.get(&week).copied().unwrap_or_default()
    }

    /// Next week `account` will be paid for (0 before its first claim).
    pub fn time_cursor_of(&self, account: &Address) -> u64 {
        self.cursor_of(account).week_cursor
    }

    /// History epoch `account`'s next claim resumes from.
    pub fn user_epoch_of(&self, account: &Address) -> u64 {
        self.cursor_of(account).user_epoch
    }

    fn cursor_of(&self, account: &Address) -> ClaimCursor {
        self.cursors.get(account).copied().unwrap_or_default()
    }

    /// Cache total voting power at week starts up to now, at most
    /// `max_supply_checkpoint_weeks` weeks per call.
    pub fn checkpoint_total_supply<E: EscrowReader>(
        &mut self,
        ctx: &ExecutionContext,
        escrow: &E,
    ) -> Advance {
        let rounded = week_floor(ctx.timestamp);
        let mut t = self.time_cursor;
        for _ in 0..self.vault.config().max_supply_checkpoint_weeks {
            if t > rounded {
                break;
            }
            self.ve_supply.insert(t, escrow.total_supply(t));
            t += WEEK;
        }
        self.time_cursor = t;
        debug!(time_cursor = t, "Supply checkpoint");
        if t > rounded {
            Advance::complete(t)
        } else {
            Advance::partial(t)
        }
    }

    /// Voting power of `account` at `t`.
    pub fn ve_for_at<E: EscrowReader>(&self, escrow: &E, account: &Address, t: u64) -> U256 {
        escrow
            .user_point_history(account)
            .map(|h| U256::from_i128_floored(h.value_at(t)))
            .unwrap_or_default()
    }

    /// Share of cached supply held by `account` at `t`, WAD-scaled.
    pub fn ve_percentage_for_at<E: EscrowReader>(
        &self,
        escrow: &E,
        account: &Address,
        t: u64,
    ) -> U256 {
        let supply = self.ve_supply(week_floor(t));
        self.ve_for_at(escrow, account, t).mul_div(WAD, supply)
    }

    fn run_checkpoints<E: EscrowReader, L: TokenLedger>(
        &mut self,
        ctx: &ExecutionContext,
        escrow: &E,
        ledger: &L,
    ) {
        if ctx.timestamp >= self.time_cursor {
            self.checkpoint_total_supply(ctx, escrow);
        }
        if self.vault.token_checkpoint_due(ctx.timestamp) {
            self.vault.checkpoint_token_unchecked(ctx, ledger);
        }
    }

    fn compute_claim<E: EscrowReader>(
        &self,
        escrow: &E,
        account: &Address,
        cursor: ClaimCursor,
    ) -> Option<ClaimOutcome> {
        let history = escrow.user_point_history(account)?;
        let limit = week_floor(self.vault.last_token_time()).min(self.time_cursor);
        walk_claim(
            history,
            self.vault.start_time(),
            cursor,
            limit,
            self.vault.config().max_claim_weeks,
            |week, balance| {
                balance.mul_div(self.vault.tokens_per_week(week), self.ve_supply(week))
            },
        )
    }

    fn record_claim(&mut self, account: Address, outcome: &ClaimOutcome) {
        self.cursors.insert(account, outcome.cursor);
        info!(
            recipient = ?&account[..4],
            amount = %outcome.amount,
            week_cursor = outcome.cursor.week_cursor,
            "Fees claimed"
        );
        self.vault.events.push(Event::Claimed {
            recipient: account,
            gauge: None,
            amount: outcome.amount,
            claim_epoch: outcome.cursor.user_epoch,
            max_epoch: outcome.max_epoch,
        });
    }

    /// Pay `account` for every fully bucketed week since its last claim.
    ///
    /// Returns the amount paid (zero when nothing is owed).
    pub fn claim<E: EscrowReader, L: TokenLedger>(
        &mut self,
        ctx: &ExecutionContext,
        escrow: &E,
        ledger: &mut L,
        account: Address,
    ) -> StateResult<U256> {
        self.vault.ensure_not_paused()?;
        self.run_checkpoints(ctx, escrow, ledger);

        let Some(outcome) = self.compute_claim(escrow, &account, self.cursor_of(&account)) else {
            return Ok(U256::zero());
        };
        self.vault.pay(ledger, &account, outcome.amount)?;
        self.record_claim(account, &outcome);
        Ok(outcome.amount)
    }

    /// Claim for several accounts in one call. Zero addresses are skipped.
    ///
    /// Either every account is paid or nothing changes.
    pub fn claim_many<E: EscrowReader, L: TokenLedger>(
        &mut self,
        ctx: &ExecutionContext,
        escrow: &E,
        ledger: &mut L,
        accounts: &[Address],
    ) -> StateResult<U256> {
        self.vault.ensure_not_paused()?;
        let limit = self.vault.config().max_claim_many;
        if accounts.len() > limit {
            return Err(StateError::TooManyReceivers {
                count: accounts.len(),
                limit,
            });
        }
        self.run_checkpoints(ctx, escrow, ledger);

        let mut staged: HashMap<Address, ClaimCursor> = HashMap::new();
        let mut payouts = Vec::new();
        let mut total = U256::zero();
        for account in accounts.iter().filter(|a| **a != ZERO_ADDRESS) {
            let cursor = staged
                .get(account)
                .copied()
                .unwrap_or_else(|| self.cursor_of(account));
            if let Some(outcome) = self.compute_claim(escrow, account, cursor) {
                staged.insert(*account, outcome.cursor);
                total = total + outcome.amount;
                payouts.push((*account, outcome));
            }
        }

        let balance = ledger.balance_of(&self.vault.address());
        if balance < total {
            return Err(StateError::InsufficientBalance {
                account: self.vault.address(),
                balance,
                required: total,
            });
        }
        for (account, outcome) in &payouts {
            self.vault.pay(ledger, account, outcome.amount)?;
            self.record_claim(*account, outcome);
        }
        Ok(total)
    }
}
