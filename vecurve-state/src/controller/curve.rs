//! Week-indexed weight curves.
//!
//! Gauge weights and per-type weight sums are decaying curves sampled at
//! week starts. Each sample is a [`WeightPoint`]; `changes` holds the slope
//! reductions that take effect when votes expire. Curves are written
//! lazily: `advance` materializes samples up to the week after `now`, and
//! reads replay forward from the latest sample when a week has not been
//! materialized yet.

use std::collections::{BTreeMap, HashMap};

use vecurve_core::{week_floor, Advance, WeightPoint, U256, WEEK};

/// Decaying weight curve with a slope-change schedule.
#[derive(Clone, Debug, Default)]
pub(crate) struct WeeklyCurve {
    points: BTreeMap<u64, WeightPoint>,
    changes: HashMap<u64, U256>,
    /// First week start not yet materialized (0 until the curve starts).
    last: u64,
}

impl WeeklyCurve {
    pub fn last(&self) -> u64 {
        self.last
    }

    pub fn set_last(&mut self, t: u64) {
        self.last = t;
    }

    /// Sample at week start `t` (zero if never written).
    pub fn point(&self, t: u64) -> WeightPoint {
        self.points.get(&t).copied().unwrap_or_default()
    }

    pub fn point_mut(&mut self, t: u64) -> &mut WeightPoint {
        self.points.entry(t).or_default()
    }

    pub fn change(&self, t: u64) -> U256 {
        self.changes.get(&t).copied().unwrap_or_default()
    }

    pub fn schedule_change(&mut self, t: u64, slope: U256) {
        let entry = self.changes.entry(t).or_default();
        *entry = entry.saturating_add(slope);
    }

    pub fn cancel_change(&mut self, t: u64, slope: U256) {
        let entry = self.changes.entry(t).or_default();
        *entry = entry.saturating_sub(slope);
    }

    /// Weeks `advance` would need to reach past `now`.
    pub fn pending_weeks(&self, now: u64) -> u64 {
        if self.last == 0 || self.last > now {
            0
        } else {
            (now - self.last) / WEEK + 1
        }
    }

    /// Materialize samples week by week until past `now`, at most
    /// `max_weeks` of them. Returns the value at the cursor.
    pub fn advance(&mut self, now: u64, max_weeks: u64) -> (U256, Advance) {
        let mut t = self.last;
        if t == 0 {
            return (U256::zero(), Advance::complete(now));
        }
        let mut pt = self.point(t);
        let mut steps = 0;
        while t <= now && steps < max_weeks {
            t += WEEK;
            pt = step(pt, self.change(t));
            self.points.insert(t, pt);
            steps += 1;
        }
        self.last = t;
        let advance = if t > now {
            Advance::complete(t)
        } else {
            Advance::partial(t)
        };
        (pt.bias, advance)
    }

    /// Bias and slope at the start of the week containing `t`.
    pub fn point_at(&self, t: u64) -> WeightPoint {
        let t = week_floor(t);
        let Some((&start, &first)) = self.points.range(..=t).next_back() else {
            return WeightPoint::default();
        };
        let mut k = start;
        let mut pt = first;
        while k < t && !pt.slope.is_zero() && !pt.bias.is_zero() {
            k += WEEK;
            pt = step(pt, self.change(k));
        }
        pt
    }

    /// Value at the start of the week containing `t`.
    pub fn value_at(&self, t: u64) -> U256 {
        self.point_at(t).bias
    }
}

/// Decay one week, then apply the slope change scheduled at its end.
fn step(pt: WeightPoint, change: U256) -> WeightPoint {
    let d_bias = pt.slope.saturating_mul(U256::from(WEEK));
    if pt.bias > d_bias {
        WeightPoint::new(pt.bias - d_bias, pt.slope.saturating_sub(change))
    } else {
        WeightPoint::default()
    }
}

/// Piecewise-constant value keyed by week start.
#[derive(Clone, Debug, Default)]
pub(crate) struct StepHistory {
    values: BTreeMap<u64, U256>,
}

impl StepHistory {
    /// Value from week start `t` onward, until the next change.
    pub fn set(&mut self, t: u64, value: U256) {
        self.values.insert(t, value);
    }

    pub fn value_at(&self, t: u64) -> U256 {
        self.values
            .range(..=week_floor(t))
            .next_back()
            .map(|(_, v)| *v)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_000 * WEEK;

    fn curve_with(bias: u64, slope: u64) -> WeeklyCurve {
        let mut curve = WeeklyCurve::default();
        *curve.point_mut(T0) = WeightPoint::new(U256::from(bias), U256::from(slope));
        curve.set_last(T0);
        curve
    }

    #[test]
    fn test_flat_curve_carries_forward() {
        let curve = curve_with(500, 0);
        assert_eq!(curve.value_at(T0 - 1), U256::zero());
        assert_eq!(curve.value_at(T0), U256::from(500u64));
        assert_eq!(curve.value_at(T0 + 50 * WEEK + 3), U256::from(500u64));
    }

    #[test]
    fn test_decay_with_change() {
        let mut curve = curve_with(3 * WEEK, 1);
        curve.schedule_change(T0 + 2 * WEEK, U256::one());
        assert_eq!(curve.value_at(T0 + WEEK), U256::from(2 * WEEK));
        assert_eq!(curve.value_at(T0 + 2 * WEEK), U256::from(WEEK));
        // Slope removed at T0 + 2 weeks: stays flat afterwards.
        assert_eq!(curve.value_at(T0 + 9 * WEEK), U256::from(WEEK));
    }

    #[test]
    fn test_point_at_replays_slope_changes() {
        let mut curve = curve_with(3 * WEEK, 2);
        curve.schedule_change(T0 + WEEK, U256::one());
        assert_eq!(curve.point_at(T0 + WEEK + 9), WeightPoint::new(U256::from(WEEK), U256::one()));
        assert_eq!(curve.point_at(T0 - 1), WeightPoint::default());
    }

    #[test]
    fn test_saturated_slope_zeroes_the_curve() {
        let curve = curve_with(u64::MAX, 0);
        let mut steep = curve.clone();
        steep.point_mut(T0).slope = U256::MAX;
        assert_eq!(steep.value_at(T0 + WEEK), U256::zero());
        assert_eq!(curve.value_at(T0 + WEEK), U256::from(u64::MAX));
    }

    #[test]
    fn test_bias_floor() {
        let curve = curve_with(10, 1);
        assert_eq!(curve.value_at(T0 + WEEK), U256::zero());
    }

    #[test]
    fn test_advance_materializes_to_next_week() {
        let mut curve = curve_with(3 * WEEK, 1);
        let now = T0 + WEEK + 5;
        assert_eq!(curve.pending_weeks(now), 2);
        let (bias, advance) = curve.advance(now, 500);
        assert!(advance.reached_now);
        assert_eq!(curve.last(), T0 + 2 * WEEK);
        assert_eq!(bias, U256::from(WEEK));
        assert_eq!(curve.point(T0 + WEEK).bias, U256::from(2 * WEEK));
        assert_eq!(curve.pending_weeks(now), 0);
    }

    #[test]
    fn test_advance_bounded() {
        let mut curve = curve_with(0, 0);
        let (_, advance) = curve.advance(T0 + 10 * WEEK, 3);
        assert_eq!(advance, Advance::partial(T0 + 3 * WEEK));
        let (_, advance) = curve.advance(T0 + 10 * WEEK, 30);
        assert_eq!(advance, Advance::complete(T0 + 11 * WEEK));
    }

    #[test]
    fn test_unstarted_curve() {
        let mut curve = WeeklyCurve::default();
        assert_eq!(curve.pending_weeks(T0), 0);
        assert_eq!(curve.advance(T0, 10).0, U256::zero());
        assert_eq!(curve.last(), 0);
    }

    #[test]
    fn test_step_history() {
        let mut history = StepHistory::default();
        history.set(T0, U256::from(1u64));
        history.set(T0 + 3 * WEEK, U256::from(2u64));
        assert_eq!(history.value_at(T0 - WEEK), U256::zero());
        assert_eq!(history.value_at(T0 + 2 * WEEK + 100), U256::from(1u64));
        assert_eq!(history.value_at(T0 + 3 * WEEK), U256::from(2u64));
    }
}
