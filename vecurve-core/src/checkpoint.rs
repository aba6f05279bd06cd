//! Point histories and historical lookup.
//!
//! A [`PointHistory`] is an append-only arena of [`Point`]s indexed by
//! epoch number. Epoch 0 is a sentinel: account histories start with a
//! zeroed point, the global supply history starts with the genesis point.
//! Timestamps and block heights are non-decreasing along a history, so
//! lookups are a binary search.

use serde::{Deserialize, Serialize};

use crate::types::Point;

/// Which coordinate a historical lookup searches on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckpointKey {
    /// Search on `Point::ts`.
    Timestamp,
    /// Search on `Point::blk`.
    Block,
}

impl CheckpointKey {
    #[inline]
    fn of(self, point: &Point) -> u64 {
        match self {
            CheckpointKey::Timestamp => point.ts,
            CheckpointKey::Block => point.blk,
        }
    }
}

/// Index of the last point whose key is `<= target`.
///
/// Returns 0 when no point qualifies or the slice is empty; callers treat
/// index 0 as the sentinel.
pub fn find_checkpoint_at_or_before(points: &[Point], target: u64, key: CheckpointKey) -> usize {
    if points.is_empty() {
        return 0;
    }
    let mut min = 0usize;
    let mut max = points.len() - 1;
    while min < max {
        let mid = (min + max + 1) / 2;
        if key.of(&points[mid]) <= target {
            min = mid;
        } else {
            max = mid - 1;
        }
    }
    min
}

/// Result of a bounded catch-up pass.
///
/// Week-stepping loops process at most a fixed number of weeks per call.
/// `cursor` is the last week boundary processed; `reached_now` tells the
/// caller whether another call is needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Advance {
    /// Last processed timestamp.
    pub cursor: u64,
    /// Whether the pass reached the current time.
    pub reached_now: bool,
}

impl Advance {
    /// A pass that finished at `cursor`.
    pub const fn complete(cursor: u64) -> Self {
        Self { cursor, reached_now: true }
    }

    /// A pass that stopped early at `cursor`.
    pub const fn partial(cursor: u64) -> Self {
        Self { cursor, reached_now: false }
    }
}

/// Append-only history of points with an epoch-0 sentinel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointHistory {
    points: Vec<Point>,
}

impl PointHistory {
    /// A history holding only the zeroed sentinel.
    pub fn new() -> Self {
        Self::with_genesis(Point::default())
    }

    /// A history whose sentinel is `genesis`.
    pub fn with_genesis(genesis: Point) -> Self {
        Self { points: vec![genesis] }
    }

    /// Latest epoch number (0 when only the sentinel exists).
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.points.len().saturating_sub(1) as u64
    }

    /// Point at `epoch`, or a zeroed point past the end.
    pub fn get(&self, epoch: u64) -> Point {
        usize::try_from(epoch)
            .ok()
            .and_then(|i| self.points.get(i))
            .copied()
            .unwrap_or_default()
    }

    /// The most recent point.
    pub fn latest(&self) -> Point {
        self.points.last().copied().unwrap_or_default()
    }

    /// Append a point and return its epoch.
    pub fn push(&mut self, point: Point) -> u64 {
        self.points.push(point);
        self.epoch()
    }

    /// All points, sentinel included.
    pub fn as_slice(&self) -> &[Point] {
        &self.points
    }

    /// Epoch of the last point whose key is `<= target`.
    pub fn find_epoch(&self, target: u64, key: CheckpointKey) -> u64 {
        find_checkpoint_at_or_before(&self.points, target, key) as u64
    }

    /// Value of the history's line at `t`, using the last point at or
    /// before `t`.
    pub fn value_at(&self, t: u64) -> i128 {
        let epoch = self.find_epoch(t, CheckpointKey::Timestamp);
        self.get(epoch).value_at(t)
    }
}

impl Default for PointHistory {
    fn default() -> Self {
        Self::new()
    }
}
