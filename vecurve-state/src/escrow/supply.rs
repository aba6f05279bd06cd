//! Replay of the global supply line across week boundaries.
//!
//! The supply line's slope only changes at week boundaries where locks
//! expire. Between checkpoints those changes live in the slope-change
//! schedule, so both the write path and historical reads walk forward one
//! week at a time applying them.

use std::collections::HashMap;

use vecurve_core::{week_floor, Advance, Point, WEEK};

const WAD: u128 = 1_000_000_000_000_000_000;

/// Points produced by replaying the supply line forward.
#[derive(Clone, Debug)]
pub(crate) struct Replay {
    /// Week-boundary points to append before `head`.
    pub weeks: Vec<Point>,
    /// Final point. Its `ts` equals `now` when the replay completed.
    pub head: Point,
    pub advance: Advance,
}

/// Replay `last` forward to `now`, at most `max_weeks` steps.
///
/// Block heights of week points are interpolated between `last` and the
/// current block.
pub(crate) fn replay_supply(
    last: Point,
    slope_changes: &HashMap<u64, i128>,
    now: u64,
    now_blk: u64,
    max_weeks: u64,
) -> Replay {
    let initial = last;
    let mut point = last;
    let block_slope: u128 = if now > initial.ts {
        WAD.saturating_mul(now_blk.saturating_sub(initial.blk) as u128)
            / (now - initial.ts) as u128
    } else {
        0
    };

    let mut weeks = Vec::new();
    let mut t_i = week_floor(point.ts);
    for step in 0..max_weeks.max(1) {
        t_i = t_i.saturating_add(WEEK);
        let mut d_slope = 0;
        if t_i > now {
            t_i = now;
        } else {
            d_slope = slope_changes.get(&t_i).copied().unwrap_or(0);
        }
        let dt = t_i.saturating_sub(point.ts) as i128;
        point.bias = point.bias.saturating_sub(point.slope.saturating_mul(dt)).max(0);
        point.slope = point.slope.saturating_add(d_slope).max(0);
        point.ts = t_i;
        let elapsed = t_i.saturating_sub(initial.ts) as u128;
        point.blk = initial
            .blk
            .saturating_add((block_slope.saturating_mul(elapsed) / WAD) as u64);

        if t_i == now {
            point.blk = now_blk;
            return Replay {
                weeks,
                head: point,
                advance: Advance::complete(now),
            };
        }
        if step + 1 < max_weeks.max(1) {
            weeks.push(point);
        }
    }

    Replay {
        weeks,
        head: point,
        advance: Advance::partial(point.ts),
    }
}

/// Replay iterations a checkpoint at `now` needs after `last`.
pub(crate) fn pending_weeks(last: &Point, now: u64) -> u64 {
    let start = week_floor(last.ts);
    if now <= start {
        return 1;
    }
    ((now - start) + WEEK - 1) / WEEK
}

/// Value of the supply line starting at `point`, evaluated at `t`.
pub(crate) fn supply_at(point: Point, t: u64, slope_changes: &HashMap<u64, i128>) -> i128 {
    let mut last = point;
    let mut t_i = week_floor(last.ts);
    loop {
        t_i = t_i.saturating_add(WEEK);
        let mut d_slope = 0;
        if t_i > t {
            t_i = t;
        } else {
            d_slope = slope_changes.get(&t_i).copied().unwrap_or(0);
        }
        let dt = t_i.saturating_sub(last.ts) as i128;
        last.bias = last.bias.saturating_sub(last.slope.saturating_mul(dt));
        if t_i == t || last.bias <= 0 {
            break;
        }
        last.slope = last.slope.saturating_add(d_slope);
        last.ts = t_i;
        if last.slope <= 0 {
            break;
        }
    }
    last.bias.max(0)
}
