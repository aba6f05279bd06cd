//! Weight controller: vote-weighted allocation across gauges.
//!
//! Accounts split a share of their escrow slope across registered gauges.
//! Each gauge belongs to a type with its own weight multiplier. The
//! controller keeps three parallel curve families: one per gauge, one
//! weight sum per type, and one vote line per (account, gauge). Votes are
//! applied as deltas against the voter's previous vote, so no call ever
//! re-sums all voters.
//!
//! A gauge's relative weight at `t` is
//! `gauge_weight × type_weight / Σ_types(type_sum × type_weight)`.

mod curve;
mod query;
mod vote;

use std::collections::HashMap;

use tracing::info;
use vecurve_core::{
    week_floor, Address, Advance, Gauge, GaugeId, GaugeType, PointHistory, TypeId, VotedSlope,
    WeightPoint, U256, WEEK, ZERO_ADDRESS,
};

use crate::access::AccessControl;
use crate::config::{ControllerConfig, MAX_GAUGE_TYPES};
use crate::context::ExecutionContext;
use crate::error::{StateError, StateResult};
use crate::events::Event;

use curve::{StepHistory, WeeklyCurve};

/// Upper bound on a type weight (10^6 in WAD units).
pub const MAX_TYPE_WEIGHT: U256 = U256::from_u128(1_000_000_000_000_000_000_000_000);

/// Upper bound on a gauge base weight, and on every type's bias and slope
/// sums. Together with [`MAX_TYPE_WEIGHT`] and the type count limit this
/// keeps the weighted total inside 256 bits.
pub const MAX_GAUGE_WEIGHT: U256 = U256::from_u128(u128::MAX);

/// The weight controller.
#[derive(Clone, Debug)]
pub struct GaugeController {
    config: ControllerConfig,
    access: AccessControl,
    gauges: Vec<Gauge>,
    gauge_index: HashMap<Address, GaugeId>,
    types: Vec<GaugeType>,
    /// Per gauge id.
    gauge_weights: Vec<WeeklyCurve>,
    /// Per type id.
    type_sums: Vec<WeeklyCurve>,
    /// Per type id.
    type_weights: Vec<StepHistory>,
    vote_user_slopes: HashMap<(Address, GaugeId), VotedSlope>,
    vote_user_power: HashMap<Address, u32>,
    last_user_vote: HashMap<(Address, GaugeId), u64>,
    vote_points: HashMap<(Address, GaugeId), PointHistory>,
    events: Vec<Event>,
}

impl GaugeController {
    /// Create an empty controller owned by `ctx.caller`.
    pub fn new(config: ControllerConfig, ctx: &ExecutionContext) -> Self {
        Self {
            config,
            access: AccessControl::new(ctx.caller),
            gauges: Vec::new(),
            gauge_index: HashMap::new(),
            types: Vec::new(),
            gauge_weights: Vec::new(),
            type_sums: Vec::new(),
            type_weights: Vec::new(),
            vote_user_slopes: HashMap::new(),
            vote_user_power: HashMap::new(),
            last_user_vote: HashMap::new(),
            vote_points: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Controller parameters.
    pub fn config(&self) -> &ControllerConfig {
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

    fn type_index(&self, type_id: TypeId) -> StateResult<usize> {
        let idx = type_id as usize;
        if idx < self.types.len() {
            Ok(idx)
        } else {
            Err(StateError::InvalidGaugeType { type_id })
        }
    }

    fn gauge_id(&self, gauge: &Address) -> StateResult<GaugeId> {
        self.gauge_index
            .get(gauge)
            .copied()
            .ok_or(StateError::GaugeNotAdded { gauge: *gauge })
    }

    fn ensure_caught_up(&self, curve: &WeeklyCurve, now: u64) -> StateResult<()> {
        let pending = curve.pending_weeks(now);
        if pending > self.config.max_catch_up_weeks {
            return Err(StateError::CheckpointBehind {
                pending_weeks: pending,
                limit: self.config.max_catch_up_weeks,
            });
        }
        Ok(())
    }

    /// Reject a delta that would push a type sum past [`MAX_GAUGE_WEIGHT`]
    /// at week `t`.
    fn ensure_headroom(
        &self,
        type_idx: usize,
        t: u64,
        bias: U256,
        slope: U256,
    ) -> StateResult<()> {
        let point = self.type_sums[type_idx].point_at(t);
        let fits = |current: U256, delta: U256| {
            current
                .checked_add(delta)
                .map_or(false, |sum| sum <= MAX_GAUGE_WEIGHT)
        };
        if fits(point.bias, bias) && fits(point.slope, slope) {
            Ok(())
        } else {
            Err(StateError::ArithmeticOverflow)
        }
    }

    /// Register a gauge type. Owner only.
    ///
    /// A non-zero `weight` takes effect from the next week start.
    pub fn add_type(
        &mut self,
        ctx: &ExecutionContext,
        name: impl Into<String>,
        weight: U256,
    ) -> StateResult<TypeId> {
        self.access.ensure_owner(ctx)?;
        ensure_type_weight(weight)?;
        let limit = self.config.max_types.min(MAX_GAUGE_TYPES);
        if self.types.len() as u32 >= limit {
            return Err(StateError::TooManyGaugeTypes { limit });
        }
        let name = name.into();
        let type_id = self.types.len() as TypeId;
        self.types.push(GaugeType { name: name.clone() });
        self.type_sums.push(WeeklyCurve::default());
        self.type_weights.push(StepHistory::default());

        info!(type_id, name = %name, "Gauge type added");
        self.events.push(Event::AddType { name, type_id });

        if !weight.is_zero() {
            self.apply_type_weight(ctx, type_id as usize, weight);
        }
        Ok(type_id)
    }

    /// Change a type's weight from the next week start. Owner only.
    ///
    /// Gauge weights are untouched; only the aggregate scales.
    pub fn change_type_weight(
        &mut self,
        ctx: &ExecutionContext,
        type_id: TypeId,
        weight: U256,
    ) -> StateResult<()> {
        self.access.ensure_owner(ctx)?;
        ensure_type_weight(weight)?;
        let idx = self.type_index(type_id)?;
        self.ensure_caught_up(&self.type_sums[idx], ctx.timestamp)?;
        self.apply_type_weight(ctx, idx, weight);
        Ok(())
    }

    fn apply_type_weight(&mut self, ctx: &ExecutionContext, idx: usize, weight: U256) {
        let now = ctx.timestamp;
        let next_time = week_floor(now + WEEK);
        self.type_sums[idx].advance(now, self.config.max_catch_up_weeks);
        self.type_weights[idx].set(next_time, weight);

        let total_weight = self.total_weight(next_time);
        info!(
            type_id = idx,
            weight = %weight,
            total_weight = %total_weight,
            "Type weight changed"
        );
        self.events.push(Event::NewTypeWeight {
            type_id: idx as TypeId,
            time: next_time,
            weight,
            total_weight,
        });
    }

    /// Register `gauge` under `type_id` with a flat base `weight`. Owner only.
    ///
    /// The base weight counts from the next week start and never decays.
    pub fn add_gauge(
        &mut self,
        ctx: &ExecutionContext,
        gauge: Address,
        type_id: TypeId,
        weight: U256,
    ) -> StateResult<GaugeId> {
        self.access.ensure_owner(ctx)?;
        if gauge == ZERO_ADDRESS {
            return Err(StateError::ZeroAddress);
        }
        let idx = self.type_index(type_id)?;
        if self.gauge_index.contains_key(&gauge) {
            return Err(StateError::GaugeAlreadyAdded { gauge });
        }
        if weight > MAX_GAUGE_WEIGHT {
            return Err(StateError::ValueOutOfRange {
                what: "gauge weight",
            });
        }
        let now = ctx.timestamp;
        self.ensure_caught_up(&self.type_sums[idx], now)?;

        let next_time = week_floor(now + WEEK);
        self.ensure_headroom(idx, next_time, weight, U256::zero())?;
        let id = self.gauges.len() as GaugeId;
        let mut curve = WeeklyCurve::default();

        let sum = &mut self.type_sums[idx];
        if !weight.is_zero() {
            sum.advance(now, self.config.max_catch_up_weeks);
            let point = sum.point_mut(next_time);
            point.bias = point.bias.saturating_add(weight);
            sum.set_last(next_time);
            *curve.point_mut(next_time) = WeightPoint::new(weight, U256::zero());
        }
        if sum.last() == 0 {
            sum.set_last(next_time);
        }
        curve.set_last(next_time);

        self.gauges.push(Gauge {
            id,
            type_id,
            address: gauge,
        });
        self.gauge_index.insert(gauge, id);
        self.gauge_weights.push(curve);

        info!(gauge = ?&gauge[..4], id, type_id, weight = %weight, "Gauge added");
        self.events.push(Event::NewGauge {
            gauge,
            type_id,
            weight,
        });
        Ok(id)
    }

    /// Materialize a gauge's weight and its type sum up to the next week.
    pub fn checkpoint_gauge(
        &mut self,
        ctx: &ExecutionContext,
        gauge: &Address,
    ) -> StateResult<Advance> {
        let id = self.gauge_id(gauge)? as usize;
        let type_idx = self.gauges[id].type_id as usize;
        let max = self.config.max_catch_up_weeks;
        let (_, gauge_advance) = self.gauge_weights[id].advance(ctx.timestamp, max);
        let (_, sum_advance) = self.type_sums[type_idx].advance(ctx.timestamp, max);
        Ok(Self::combine(gauge_advance, sum_advance))
    }

    /// Materialize every type sum up to the next week (bounded per call).
    pub fn checkpoint(&mut self, ctx: &ExecutionContext) -> Advance {
        let max = self.config.max_catch_up_weeks;
        let mut result = Advance::complete(week_floor(ctx.timestamp + WEEK));
        for sum in &mut self.type_sums {
            let (_, advance) = sum.advance(ctx.timestamp, max);
            result = Self::combine(result, advance);
        }
        result
    }

    fn combine(a: Advance, b: Advance) -> Advance {
        if a.reached_now && b.reached_now {
            Advance::complete(a.cursor.max(b.cursor))
        } else if !a.reached_now && (b.reached_now || a.cursor <= b.cursor) {
            a
        } else {
            b
        }
    }
}

fn ensure_type_weight(weight: U256) -> StateResult<()> {
    if weight > MAX_TYPE_WEIGHT {
        return Err(StateError::ValueOutOfRange {
            what: "type weight",
        });
    }
    Ok(())
}
