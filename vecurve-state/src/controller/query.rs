//! Controller read path.
//!
//! Reads never mutate. Weeks that have not been materialized are
//! reconstructed by replaying from the latest stored sample, so a read at
//! `t` returns the same value a checkpoint at `t` would have stored.

use vecurve_core::{
    week_floor, Address, Gauge, GaugeId, PointHistory, TypeId, VotedSlope, U256, WAD,
};

use super::GaugeController;
use crate::context::ExecutionContext;
use crate::error::StateResult;

impl GaugeController {
    /// Number of registered gauges.
    pub fn n_gauges(&self) -> u32 {
        self.gauges.len() as u32
    }

    /// Number of registered gauge types.
    pub fn n_gauge_types(&self) -> u32 {
        self.types.len() as u32
    }

    /// Name of gauge type `type_id`.
    pub fn gauge_type_name(&self, type_id: TypeId) -> Option<&str> {
        self.types.get(type_id as usize).map(|t| t.name.as_str())
    }

    /// Registry record of `gauge`.
    pub fn gauge(&self, gauge: &Address) -> Option<&Gauge> {
        self.gauge_index
            .get(gauge)
            .and_then(|id| self.gauges.get(*id as usize))
    }

    /// All gauges in registration order.
    pub fn gauges(&self) -> &[Gauge] {
        &self.gauges
    }

    /// Type of `gauge`.
    pub fn gauge_type(&self, gauge: &Address) -> Option<TypeId> {
        self.gauge(gauge).map(|g| g.type_id)
    }

    /// Weight of `gauge` at the week containing `t`.
    pub fn gauge_weight(&self, gauge: &Address, t: u64) -> U256 {
        self.gauge_index
            .get(gauge)
            .map(|id| self.gauge_weights[*id as usize].value_at(t))
            .unwrap_or_default()
    }

    /// Weight multiplier of `type_id` at the week containing `t`.
    pub fn type_weight(&self, type_id: TypeId, t: u64) -> U256 {
        self.type_weights
            .get(type_id as usize)
            .map(|w| w.value_at(t))
            .unwrap_or_default()
    }

    /// Sum of gauge weights of `type_id` at the week containing `t`.
    pub fn weights_sum_per_type(&self, type_id: TypeId, t: u64) -> U256 {
        self.type_sums
            .get(type_id as usize)
            .map(|s| s.value_at(t))
            .unwrap_or_default()
    }

    /// `Σ_types type_sum × type_weight` at the week containing `t`.
    ///
    /// Weight bounds enforced on writes keep this inside 256 bits; the
    /// arithmetic saturates rather than wraps.
    pub fn total_weight(&self, t: u64) -> U256 {
        let t = week_floor(t);
        self.type_sums
            .iter()
            .zip(&self.type_weights)
            .fold(U256::zero(), |acc, (sum, weight)| {
                acc.saturating_add(sum.value_at(t).saturating_mul(weight.value_at(t)))
            })
    }

    /// Share of `gauge` in total weight at the week containing `t`,
    /// WAD-scaled. Zero when the total is zero.
    pub fn gauge_relative_weight(&self, gauge: &Address, t: u64) -> U256 {
        let Some(record) = self.gauge(gauge) else {
            return U256::zero();
        };
        let total = self.total_weight(t);
        if total.is_zero() {
            return U256::zero();
        }
        let type_weight = self.type_weight(record.type_id, t);
        let gauge_weight = self.gauge_weight(gauge, t);
        WAD.mul_div(type_weight.saturating_mul(gauge_weight), total)
    }

    /// Checkpoint `gauge`, then read its relative weight.
    pub fn gauge_relative_weight_write(
        &mut self,
        ctx: &ExecutionContext,
        gauge: &Address,
        t: u64,
    ) -> StateResult<U256> {
        self.checkpoint_gauge(ctx, gauge)?;
        self.checkpoint(ctx);
        Ok(self.gauge_relative_weight(gauge, t))
    }

    pub(super) fn vote_user_slope_by_id(&self, account: &Address, id: GaugeId) -> VotedSlope {
        self.vote_user_slopes
            .get(&(*account, id))
            .copied()
            .unwrap_or_default()
    }

    /// Current vote of `account` on `gauge`.
    pub fn vote_user_slope(&self, account: &Address, gauge: &Address) -> VotedSlope {
        self.gauge_index
            .get(gauge)
            .map(|id| self.vote_user_slope_by_id(account, *id))
            .unwrap_or_default()
    }

    /// Basis points of `account`'s power currently allocated.
    pub fn vote_user_power(&self, account: &Address) -> u32 {
        self.vote_user_power.get(account).copied().unwrap_or(0)
    }

    /// Timestamp of `account`'s last vote on `gauge` (0 if never).
    pub fn last_user_vote(&self, account: &Address, gauge: &Address) -> u64 {
        self.gauge_index
            .get(gauge)
            .and_then(|id| self.last_user_vote.get(&(*account, *id)))
            .copied()
            .unwrap_or(0)
    }

    /// History of `account`'s vote lines on `gauge`.
    ///
    /// Each point starts at the week its vote took effect.
    pub fn vote_point_history(&self, account: &Address, gauge: &Address) -> Option<&PointHistory> {
        self.gauge_index
            .get(gauge)
            .and_then(|id| self.vote_points.get(&(*account, *id)))
    }
}
