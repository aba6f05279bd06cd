//! Escrow ledger: time-decaying voting power.
//!
//! Each account holds at most one lock. A lock's voting power falls
//! linearly from its deposit-time value to zero at its week-aligned unlock
//! time. The ledger keeps an append-only point history per account and one
//! for the global supply, plus a schedule of slope reductions keyed by
//! week so the supply line can be replayed without touching every account.

mod line;
mod query;
mod supply;

use std::collections::HashMap;

use tracing::{debug, info};
use vecurve_core::{
    week_floor, Address, Advance, LockedBalance, Point, PointHistory, U256, ZERO_ADDRESS,
};

use crate::access::{AccessControl, LOCK_CREATOR};
use crate::config::EscrowConfig;
use crate::context::ExecutionContext;
use crate::error::{StateError, StateResult};
use crate::events::{DepositKind, Event};
use crate::ledger::{Authorization, TokenLedger};

use line::LockTransition;
use supply::{pending_weeks, replay_supply};

/// Read access to escrow state.
///
/// The weight controller reads lock lines through this trait and the fee
/// distributor reads point histories and supply.
pub trait EscrowReader {
    /// Current lock of `account`.
    fn locked(&self, account: &Address) -> LockedBalance;
    /// Slope of `account`'s most recent point.
    fn get_last_user_slope(&self, account: &Address) -> i128;
    /// Point history of `account`, if it ever locked.
    fn user_point_history(&self, account: &Address) -> Option<&PointHistory>;
    /// Total voting power at `t`.
    fn total_supply(&self, t: u64) -> U256;
}

/// The escrow ledger.
#[derive(Clone, Debug)]
pub struct VotingEscrow {
    address: Address,
    config: EscrowConfig,
    access: AccessControl,
    /// Total underlying locked.
    supply: U256,
    locked: HashMap<Address, LockedBalance>,
    supply_history: PointHistory,
    user_history: HashMap<Address, PointHistory>,
    /// Week start -> slope delta applied to the supply line at that week.
    slope_changes: HashMap<u64, i128>,
    events: Vec<Event>,
}

impl VotingEscrow {
    /// Create an escrow holding tokens at `address`, owned by `ctx.caller`.
    ///
    /// The supply history starts with a zero point at the current block.
    pub fn new(address: Address, config: EscrowConfig, ctx: &ExecutionContext) -> Self {
        Self {
            address,
            config,
            access: AccessControl::new(ctx.caller),
            supply: U256::zero(),
            locked: HashMap::new(),
            supply_history: PointHistory::with_genesis(Point::new(
                0,
                0,
                ctx.timestamp,
                ctx.block_height,
            )),
            user_history: HashMap::new(),
            slope_changes: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Address that holds escrowed tokens.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Escrow parameters.
    pub fn config(&self) -> &EscrowConfig {
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

    /// Drain recorded events.
    pub fn take_events(&mut self) -> Vec<Event> {
        let mut events = self.access.take_events();
        events.append(&mut self.events);
        events
    }

    fn slope_divisor(&self) -> U256 {
        U256::from(self.config.max_time) * U256::from(self.config.base_rate)
    }

    fn ensure_replay_budget(&self, now: u64) -> StateResult<()> {
        let pending = pending_weeks(&self.supply_history.latest(), now);
        if pending > self.config.max_replay_weeks {
            return Err(StateError::CheckpointBehind {
                pending_weeks: pending,
                limit: self.config.max_replay_weeks,
            });
        }
        Ok(())
    }

    fn validate_new_unlock(&self, now: u64, unlock_time: u64) -> StateResult<u64> {
        let unlock = week_floor(unlock_time);
        let earliest = now + self.config.min_lock_time;
        if unlock < earliest {
            return Err(StateError::UnlockTimeTooSoon {
                unlock_time: unlock,
                earliest,
            });
        }
        let latest = now + self.config.max_time;
        if unlock > latest {
            return Err(StateError::UnlockTimeTooLate {
                unlock_time: unlock,
                latest,
            });
        }
        Ok(unlock)
    }

    fn active_lock(&self, account: &Address, now: u64) -> StateResult<LockedBalance> {
        let lock = self.locked(account);
        if lock.is_empty() {
            return Err(StateError::NoActiveLock { account: *account });
        }
        if lock.end <= now {
            return Err(StateError::LockExpired {
                account: *account,
                end: lock.end,
            });
        }
        Ok(lock)
    }

    /// Lock `amount` for the caller until `unlock_time` (rounded down to a
    /// week). Tokens are pulled from the caller under `authorization`.
    pub fn create_lock<L: TokenLedger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &mut L,
        amount: U256,
        unlock_time: u64,
        authorization: &Authorization,
    ) -> StateResult<()> {
        self.create_lock_inner(ctx, ledger, ctx.caller, amount, unlock_time, authorization)
    }

    /// Lock `amount` for `beneficiary`, paid by the caller.
    ///
    /// Requires the [`LOCK_CREATOR`] role.
    pub fn create_lock_for<L: TokenLedger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &mut L,
        beneficiary: Address,
        amount: U256,
        unlock_time: u64,
        authorization: &Authorization,
    ) -> StateResult<()> {
        self.access.ensure_role(ctx, LOCK_CREATOR)?;
        if beneficiary == ZERO_ADDRESS {
            return Err(StateError::ZeroAddress);
        }
        self.create_lock_inner(ctx, ledger, beneficiary, amount, unlock_time, authorization)
    }

    fn create_lock_inner<L: TokenLedger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &mut L,
        beneficiary: Address,
        amount: U256,
        unlock_time: u64,
        authorization: &Authorization,
    ) -> StateResult<()> {
        let now = ctx.timestamp;
        if amount.is_zero() {
            return Err(StateError::ZeroAmount);
        }
        let old = self.locked(&beneficiary);
        if !old.is_empty() {
            return Err(StateError::LockAlreadyExists {
                account: beneficiary,
            });
        }
        let unlock = self.validate_new_unlock(now, unlock_time)?;
        self.ensure_replay_budget(now)?;

        let new = LockedBalance::new(amount, unlock);
        let transition = LockTransition::new(beneficiary, old, new, now, self.slope_divisor())?;
        ledger.pull_transfer(&ctx.caller, &self.address, amount, authorization, now)?;

        self.commit(ctx, transition, amount, DepositKind::CreateLock);
        Ok(())
    }

    /// Add `amount` to the caller's active lock without changing its end.
    pub fn increase_amount<L: TokenLedger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &mut L,
        amount: U256,
        authorization: &Authorization,
    ) -> StateResult<()> {
        self.top_up(
            ctx,
            ledger,
            ctx.caller,
            amount,
            authorization,
            DepositKind::IncreaseLockAmount,
        )
    }

    /// Add `amount` to `account`'s active lock, paid by the caller.
    pub fn deposit_for<L: TokenLedger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &mut L,
        account: Address,
        amount: U256,
        authorization: &Authorization,
    ) -> StateResult<()> {
        self.top_up(ctx, ledger, account, amount, authorization, DepositKind::DepositFor)
    }

    fn top_up<L: TokenLedger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &mut L,
        account: Address,
        amount: U256,
        authorization: &Authorization,
        kind: DepositKind,
    ) -> StateResult<()> {
        let now = ctx.timestamp;
        if amount.is_zero() {
            return Err(StateError::ZeroAmount);
        }
        let old = self.active_lock(&account, now)?;
        self.ensure_replay_budget(now)?;

        let new = LockedBalance::new(old.amount + amount, old.end);
        let transition = LockTransition::new(account, old, new, now, self.slope_divisor())?;
        ledger.pull_transfer(&ctx.caller, &self.address, amount, authorization, now)?;

        self.commit(ctx, transition, amount, kind);
        Ok(())
    }

    /// Move the caller's unlock time later. No tokens move.
    pub fn increase_unlock_time(
        &mut self,
        ctx: &ExecutionContext,
        unlock_time: u64,
    ) -> StateResult<()> {
        let now = ctx.timestamp;
        let old = self.active_lock(&ctx.caller, now)?;
        let unlock = week_floor(unlock_time);
        if unlock <= old.end {
            return Err(StateError::CanOnlyIncreaseLockDuration {
                current_end: old.end,
                requested_end: unlock,
            });
        }
        let latest = now + self.config.max_time;
        if unlock > latest {
            return Err(StateError::UnlockTimeTooLate {
                unlock_time: unlock,
                latest,
            });
        }
        self.ensure_replay_budget(now)?;

        let new = LockedBalance::new(old.amount, unlock);
        let transition = LockTransition::new(ctx.caller, old, new, now, self.slope_divisor())?;
        self.commit(ctx, transition, U256::zero(), DepositKind::IncreaseUnlockTime);
        Ok(())
    }

    /// Return the caller's expired lock. Returns the amount withdrawn.
    pub fn withdraw<L: TokenLedger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &mut L,
    ) -> StateResult<U256> {
        let now = ctx.timestamp;
        let account = ctx.caller;
        let old = self.locked(&account);
        if old.is_empty() {
            return Err(StateError::NoActiveLock { account });
        }
        if now < old.end {
            return Err(StateError::LockNotExpired { end: old.end, now });
        }
        self.ensure_replay_budget(now)?;

        let value = old.amount;
        let transition =
            LockTransition::new(account, old, LockedBalance::default(), now, self.slope_divisor())?;
        ledger.transfer(&self.address, &account, value)?;

        let prev_supply = self.supply;
        self.supply = prev_supply.saturating_sub(value);
        self.checkpoint_supply(ctx, Some(&transition));
        self.locked.remove(&account);

        info!(
            provider = ?&account[..4],
            value = %value,
            "Lock withdrawn"
        );
        self.events.push(Event::Withdraw {
            provider: account,
            value,
            ts: now,
        });
        self.events.push(Event::Supply {
            prev_supply,
            supply: self.supply,
        });
        Ok(value)
    }

    /// Bring the supply history up to date (bounded by the replay budget).
    pub fn checkpoint(&mut self, ctx: &ExecutionContext) -> Advance {
        self.advance_checkpoints(ctx, self.config.max_replay_weeks)
    }

    /// Replay the supply line at most `max_steps` weeks toward now.
    ///
    /// Call repeatedly until `reached_now` after a long idle gap.
    pub fn advance_checkpoints(&mut self, ctx: &ExecutionContext, max_steps: u64) -> Advance {
        let replay = replay_supply(
            self.supply_history.latest(),
            &self.slope_changes,
            ctx.timestamp,
            ctx.block_height,
            max_steps,
        );
        for point in replay.weeks {
            self.supply_history.push(point);
        }
        self.supply_history.push(replay.head);
        debug!(
            cursor = replay.advance.cursor,
            reached_now = replay.advance.reached_now,
            epoch = self.supply_history.epoch(),
            "Supply checkpoint"
        );
        replay.advance
    }

    fn commit(
        &mut self,
        ctx: &ExecutionContext,
        transition: LockTransition,
        value: U256,
        kind: DepositKind,
    ) {
        let prev_supply = self.supply;
        self.supply = prev_supply + value;
        self.locked.insert(transition.account, transition.new);
        self.checkpoint_supply(ctx, Some(&transition));

        info!(
            provider = ?&transition.account[..4],
            value = %value,
            locktime = transition.new.end,
            kind = ?kind,
            "Lock deposit"
        );
        self.events.push(Event::Deposit {
            provider: transition.account,
            value,
            locktime: transition.new.end,
            kind,
            ts: ctx.timestamp,
        });
        self.events.push(Event::Supply {
            prev_supply,
            supply: self.supply,
        });
    }

    /// Replay the supply line to now and fold in one account's change.
    ///
    /// Callers check the replay budget first, so the replay always reaches
    /// now.
    fn checkpoint_supply(&mut self, ctx: &ExecutionContext, transition: Option<&LockTransition>) {
        let now = ctx.timestamp;
        let replay = replay_supply(
            self.supply_history.latest(),
            &self.slope_changes,
            now,
            ctx.block_height,
            self.config.max_replay_weeks,
        );
        for point in replay.weeks {
            self.supply_history.push(point);
        }
        let mut head = replay.head;

        if let Some(tr) = transition {
            head.slope = (head.slope + tr.new_line.slope - tr.old_line.slope).max(0);
            head.bias = (head.bias + tr.new_line.bias - tr.old_line.bias).max(0);
        }
        self.supply_history.push(head);

        let Some(tr) = transition else {
            return;
        };

        // Scheduled slope changes: cancel the old expiry, book the new one.
        let old_end = tr.old.end;
        let new_end = tr.new.end;
        if old_end > now {
            let mut old_dslope = self.slope_changes.get(&old_end).copied().unwrap_or(0);
            old_dslope += tr.old_line.slope;
            if new_end == old_end {
                old_dslope -= tr.new_line.slope;
            }
            self.slope_changes.insert(old_end, old_dslope);
        }
        if new_end > now && new_end > old_end {
            let new_dslope = self.slope_changes.get(&new_end).copied().unwrap_or(0);
            self.slope_changes
                .insert(new_end, new_dslope - tr.new_line.slope);
        }

        let user_epoch = self
            .user_history
            .entry(tr.account)
            .or_default()
            .push(Point::new(
                tr.new_line.bias,
                tr.new_line.slope,
                now,
                ctx.block_height,
            ));
        debug!(
            account = ?&tr.account[..4],
            user_epoch,
            supply_epoch = self.supply_history.epoch(),
            "Lock checkpoint"
        );
    }
}

impl EscrowReader for VotingEscrow {
    fn locked(&self, account: &Address) -> LockedBalance {
        VotingEscrow::locked(self, account)
    }

    fn get_last_user_slope(&self, account: &Address) -> i128 {
        VotingEscrow::get_last_user_slope(self, account)
    }

    fn user_point_history(&self, account: &Address) -> Option<&PointHistory> {
        VotingEscrow::user_point_history(self, account)
    }

    fn total_supply(&self, t: u64) -> U256 {
        VotingEscrow::total_supply(self, t)
    }
}

#[cfg(test)]
mod tests;
