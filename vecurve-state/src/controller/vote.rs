//! Vote allocation.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};
use vecurve_core::{
    week_floor, Address, GaugeId, Point, VotedSlope, U256, BPS_DENOMINATOR, WEEK,
};

use super::curve::WeeklyCurve;
use super::GaugeController;
use crate::context::ExecutionContext;
use crate::error::{StateError, StateResult};
use crate::escrow::EscrowReader;
use crate::events::Event;

/// A validated vote, ready to apply.
struct VotePlan {
    voter: Address,
    gauge: Address,
    id: GaugeId,
    type_idx: usize,
    next_time: u64,
    old: VotedSlope,
    old_bias: U256,
    new: VotedSlope,
    new_bias: U256,
    power_used: u32,
    vote_point: Point,
}

impl GaugeController {
    /// Allocate `power` basis points of the caller's escrow slope to `gauge`.
    ///
    /// Replaces the caller's previous vote on that gauge. The new line
    /// counts from the next week start and runs until the caller's lock end.
    pub fn vote_for_gauge_weights<E: EscrowReader>(
        &mut self,
        ctx: &ExecutionContext,
        escrow: &E,
        gauge: Address,
        power: u16,
    ) -> StateResult<()> {
        let used = self.vote_user_power(&ctx.caller);
        let plan = self.plan_vote(ctx, escrow, gauge, power, used)?;
        self.ensure_vote_headroom(std::slice::from_ref(&plan))?;
        self.apply_vote(ctx, plan);
        Ok(())
    }

    /// Apply several votes atomically.
    ///
    /// Every vote is planned against the current state with a running
    /// power total, and nothing is applied until all of them validate.
    /// Fails without any change if the batch's total power exceeds 10000
    /// basis points, names a gauge twice, or any single vote fails.
    pub fn batch_vote_for_gauge_weights<E: EscrowReader>(
        &mut self,
        ctx: &ExecutionContext,
        escrow: &E,
        votes: &[(Address, u16)],
    ) -> StateResult<()> {
        let total: u32 = votes.iter().map(|(_, power)| *power as u32).sum();
        if total as u64 > BPS_DENOMINATOR {
            return Err(StateError::VotePowerExceeded { total });
        }
        let mut seen = HashSet::with_capacity(votes.len());
        let mut used = self.vote_user_power(&ctx.caller);
        let mut plans = Vec::with_capacity(votes.len());
        for &(gauge, power) in votes {
            if !seen.insert(gauge) {
                return Err(StateError::DuplicateVote { gauge });
            }
            let plan = self.plan_vote(ctx, escrow, gauge, power, used)?;
            used = plan.power_used;
            plans.push(plan);
        }
        self.ensure_vote_headroom(&plans)?;
        for plan in plans {
            self.apply_vote(ctx, plan);
        }
        Ok(())
    }

    fn plan_vote<E: EscrowReader>(
        &self,
        ctx: &ExecutionContext,
        escrow: &E,
        gauge: Address,
        power: u16,
        used: u32,
    ) -> StateResult<VotePlan> {
        let now = ctx.timestamp;
        let voter = ctx.caller;
        let lock = escrow.locked(&voter);
        if lock.is_empty() {
            return Err(StateError::NoActiveLock { account: voter });
        }
        let id = self.gauge_id(&gauge)?;
        let next_time = week_floor(now + WEEK);
        if lock.end <= next_time {
            return Err(StateError::LockExpiresTooSoon {
                lock_end: lock.end,
                next_time,
            });
        }
        if power as u64 > BPS_DENOMINATOR {
            return Err(StateError::VotePowerOutOfRange { power });
        }
        if let Some(last) = self.last_user_vote.get(&(voter, id)) {
            let next_allowed = last + self.config.weight_vote_delay;
            if now < next_allowed {
                return Err(StateError::VoteTooOften { next_allowed });
            }
        }

        let old = self.vote_user_slope_by_id(&voter, id);
        let power_used = used - old.power as u32 + power as u32;
        if power_used as u64 > BPS_DENOMINATOR {
            return Err(StateError::VotePowerExceeded { total: power_used });
        }

        let type_idx = self.gauges[id as usize].type_id as usize;
        self.ensure_caught_up(&self.gauge_weights[id as usize], now)?;
        self.ensure_caught_up(&self.type_sums[type_idx], now)?;

        let slope = U256::from_i128_floored(escrow.get_last_user_slope(&voter));
        let new = VotedSlope {
            slope: slope.bps(power),
            power,
            end: lock.end,
        };
        let new_bias = new.slope * U256::from(lock.end - next_time);
        let old_dt = old.end.saturating_sub(next_time);
        let old_bias = old.slope * U256::from(old_dt);

        let vote_point = Point::new(
            new_bias.to_i128("vote bias")?,
            new.slope.to_i128("vote slope")?,
            next_time,
            ctx.block_height,
        );

        Ok(VotePlan {
            voter,
            gauge,
            id,
            type_idx,
            next_time,
            old,
            old_bias,
            new,
            new_bias,
            power_used,
            vote_point,
        })
    }

    /// Reject plans whose combined additions would overflow a type sum.
    fn ensure_vote_headroom(&self, plans: &[VotePlan]) -> StateResult<()> {
        let mut added: HashMap<usize, (U256, U256)> = HashMap::new();
        for plan in plans {
            let entry = added.entry(plan.type_idx).or_default();
            entry.0 = entry.0.saturating_add(plan.new_bias.saturating_sub(plan.old_bias));
            entry.1 = entry.1.saturating_add(plan.new.slope);
        }
        let Some(next_time) = plans.first().map(|plan| plan.next_time) else {
            return Ok(());
        };
        for (type_idx, (bias, slope)) in added {
            self.ensure_headroom(type_idx, next_time, bias, slope)?;
        }
        Ok(())
    }

    fn apply_vote(&mut self, ctx: &ExecutionContext, plan: VotePlan) {
        let now = ctx.timestamp;
        let max = self.config.max_catch_up_weeks;
        let key = (plan.voter, plan.id);

        let gauge_curve = &mut self.gauge_weights[plan.id as usize];
        gauge_curve.advance(now, max);
        apply_delta(gauge_curve, &plan, now);

        let sum_curve = &mut self.type_sums[plan.type_idx];
        sum_curve.advance(now, max);
        apply_delta(sum_curve, &plan, now);

        self.vote_user_slopes.insert(key, plan.new);
        self.vote_user_power.insert(plan.voter, plan.power_used);
        self.last_user_vote.insert(key, now);
        let epoch = self.vote_points.entry(key).or_default().push(plan.vote_point);

        info!(
            user = ?&plan.voter[..4],
            gauge = ?&plan.gauge[..4],
            weight = plan.new.power,
            power_used = plan.power_used,
            "Vote for gauge"
        );
        debug!(
            slope = %plan.new.slope,
            bias = %plan.new_bias,
            next_time = plan.next_time,
            epoch,
            "Vote line"
        );
        self.events.push(Event::VoteForGauge {
            time: now,
            user: plan.voter,
            gauge: plan.gauge,
            weight: plan.new.power,
        });
    }
}

/// Replace the voter's old line with the new one on `curve`.
///
/// Bias and slope at the next week start move by `new - old`, floored so
/// the old line never removes more than it added.
fn apply_delta(curve: &mut WeeklyCurve, plan: &VotePlan, now: u64) {
    let old = &plan.old;
    let new = &plan.new;
    let point = curve.point_mut(plan.next_time);
    point.bias = point.bias.saturating_add(plan.new_bias).saturating_sub(plan.old_bias);
    if old.end > plan.next_time {
        point.slope = point.slope.saturating_add(new.slope).saturating_sub(old.slope);
    } else {
        point.slope = point.slope.saturating_add(new.slope);
    }
    if old.end > now {
        curve.cancel_change(old.end, old.slope);
    }
    curve.schedule_change(new.end, new.slope);
}
