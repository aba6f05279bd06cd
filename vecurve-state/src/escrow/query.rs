//! Escrow read path.

use vecurve_core::{Address, CheckpointKey, LockedBalance, Point, PointHistory, U256};

use super::supply::supply_at;
use super::VotingEscrow;
use crate::context::ExecutionContext;
use crate::error::{StateError, StateResult};

impl VotingEscrow {
    /// Current lock of `account` (zeroed if none).
    pub fn locked(&self, account: &Address) -> LockedBalance {
        self.locked.get(account).copied().unwrap_or_default()
    }

    /// Unlock time of `account`'s lock (0 if none).
    pub fn locked_end(&self, account: &Address) -> u64 {
        self.locked(account).end
    }

    /// Total underlying currently held in escrow.
    pub fn supply(&self) -> U256 {
        self.supply
    }

    /// Latest supply epoch.
    pub fn epoch(&self) -> u64 {
        self.supply_history.epoch()
    }

    /// Supply point at `epoch`.
    pub fn supply_point(&self, epoch: u64) -> Point {
        self.supply_history.get(epoch)
    }

    /// The whole supply history.
    pub fn supply_history(&self) -> &PointHistory {
        &self.supply_history
    }

    /// Slope-change schedule entry for week start `week`.
    pub fn slope_change(&self, week: u64) -> i128 {
        self.slope_changes.get(&week).copied().unwrap_or(0)
    }

    /// Latest user epoch of `account` (0 if it never locked).
    pub fn user_point_epoch(&self, account: &Address) -> u64 {
        self.user_history
            .get(account)
            .map(PointHistory::epoch)
            .unwrap_or(0)
    }

    /// Point history of `account`, if it ever locked.
    pub fn user_point_history(&self, account: &Address) -> Option<&PointHistory> {
        self.user_history.get(account)
    }

    /// Timestamp of `account`'s point at `epoch`.
    pub fn user_point_history_ts(&self, account: &Address, epoch: u64) -> u64 {
        self.user_history
            .get(account)
            .map(|h| h.get(epoch).ts)
            .unwrap_or(0)
    }

    /// Slope of `account`'s most recent point.
    pub fn get_last_user_slope(&self, account: &Address) -> i128 {
        self.user_history
            .get(account)
            .map(|h| h.latest().slope)
            .unwrap_or(0)
    }

    /// Voting power of `account` at time `t`.
    pub fn balance_of(&self, account: &Address, t: u64) -> U256 {
        self.user_history
            .get(account)
            .map(|h| U256::from_i128_floored(h.value_at(t)))
            .unwrap_or_default()
    }

    /// Total voting power at time `t`.
    ///
    /// Past the last supply point the line is replayed week by week
    /// through the slope-change schedule.
    pub fn total_supply(&self, t: u64) -> U256 {
        let epoch = self.supply_history.find_epoch(t, CheckpointKey::Timestamp);
        let point = self.supply_history.get(epoch);
        U256::from_i128_floored(supply_at(point, t, &self.slope_changes))
    }

    /// Voting power of `account` at block `block`.
    pub fn balance_of_at_block(
        &self,
        ctx: &ExecutionContext,
        account: &Address,
        block: u64,
    ) -> StateResult<U256> {
        let block_time = self.block_time(ctx, block)?;
        let Some(history) = self.user_history.get(account) else {
            return Ok(U256::zero());
        };
        let epoch = history.find_epoch(block, CheckpointKey::Block);
        Ok(history.get(epoch).balance_at(block_time))
    }

    /// Total voting power at block `block`.
    pub fn total_supply_at_block(&self, ctx: &ExecutionContext, block: u64) -> StateResult<U256> {
        let block_time = self.block_time(ctx, block)?;
        let epoch = self.supply_history.find_epoch(block, CheckpointKey::Block);
        let point = self.supply_history.get(epoch);
        Ok(U256::from_i128_floored(supply_at(
            point,
            block_time,
            &self.slope_changes,
        )))
    }

    /// Estimate the timestamp of `block` by interpolating between the
    /// bracketing supply points (or the last point and the current block).
    fn block_time(&self, ctx: &ExecutionContext, block: u64) -> StateResult<u64> {
        if block > ctx.block_height {
            return Err(StateError::BlockInFuture {
                block,
                latest: ctx.block_height,
            });
        }
        let epoch = self.supply_history.find_epoch(block, CheckpointKey::Block);
        let p0 = self.supply_history.get(epoch);
        let (d_block, d_t) = if epoch < self.supply_history.epoch() {
            let p1 = self.supply_history.get(epoch + 1);
            (p1.blk.saturating_sub(p0.blk), p1.ts.saturating_sub(p0.ts))
        } else {
            (
                ctx.block_height.saturating_sub(p0.blk),
                ctx.timestamp.saturating_sub(p0.ts),
            )
        };
        let mut block_time = p0.ts;
        if d_block != 0 {
            let offset = block.saturating_sub(p0.blk) as u128;
            block_time += (d_t as u128 * offset / d_block as u128) as u64;
        }
        Ok(block_time)
    }
}
