//! Per-account claim walk.
//!
//! Walks weeks from the account's claim cursor, stepping through its
//! point history so that each week is valued with the line in force at
//! the week start. Shared by the plain and gauge-scoped distributors;
//! only the per-week payout differs.

use vecurve_core::{week_ceil, CheckpointKey, Point, PointHistory, U256, WEEK};

/// Where an account's next claim resumes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ClaimCursor {
    /// Next week start to pay (0 before the first claim).
    pub week_cursor: u64,
    /// History epoch the walk resumes from.
    pub user_epoch: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ClaimOutcome {
    pub amount: U256,
    pub cursor: ClaimCursor,
    pub max_epoch: u64,
}

/// Walk at most `max_steps` steps and total the payout.
///
/// `limit` is the first week that may not be paid yet. Returns `None`
/// when there is nothing to walk; the cursor must then stay as it is.
pub(crate) fn walk_claim<F>(
    history: &PointHistory,
    start_time: u64,
    cursor: ClaimCursor,
    limit: u64,
    max_steps: u64,
    mut payout: F,
) -> Option<ClaimOutcome>
where
    F: FnMut(u64, U256) -> U256,
{
    let max_epoch = history.epoch();
    if max_epoch == 0 {
        return None;
    }

    let mut week_cursor = cursor.week_cursor;
    let mut user_epoch = if week_cursor == 0 {
        history.find_epoch(start_time, CheckpointKey::Timestamp)
    } else {
        cursor.user_epoch
    };
    if user_epoch == 0 {
        user_epoch = 1;
    }
    let mut user_point = history.get(user_epoch);
    if week_cursor == 0 {
        week_cursor = week_ceil(user_point.ts);
    }
    if week_cursor >= limit {
        return None;
    }
    if week_cursor < start_time {
        week_cursor = start_time;
    }

    let mut old_point = Point::default();
    let mut amount = U256::zero();
    for _ in 0..max_steps {
        if week_cursor >= limit {
            break;
        }
        if week_cursor >= user_point.ts && user_epoch <= max_epoch {
            user_epoch += 1;
            old_point = user_point;
            user_point = if user_epoch > max_epoch {
                Point::default()
            } else {
                history.get(user_epoch)
            };
        } else {
            let balance = old_point.balance_at(week_cursor);
            if balance.is_zero() && user_epoch > max_epoch {
                break;
            }
            if !balance.is_zero() {
                amount = amount + payout(week_cursor, balance);
            }
            week_cursor += WEEK;
        }
    }

    Some(ClaimOutcome {
        amount,
        cursor: ClaimCursor {
            week_cursor,
            user_epoch: max_epoch.min(user_epoch - 1),
        },
        max_epoch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const W0: u64 = 2_800 * WEEK;

    /// One lock starting mid-week: bias 4 weeks worth at slope 1.
    fn history() -> PointHistory {
        let mut h = PointHistory::new();
        h.push(Point::new(4 * WEEK as i128, 1, W0 + 100, 1));
        h
    }

    #[test]
    fn test_empty_history() {
        let h = PointHistory::new();
        let out = walk_claim(&h, W0, ClaimCursor::default(), W0 + 10 * WEEK, 50, |_, b| b);
        assert!(out.is_none());
    }

    #[test]
    fn test_first_claim_starts_next_full_week() {
        let out = walk_claim(
            &history(),
            W0,
            ClaimCursor::default(),
            W0 + 10 * WEEK,
            50,
            |week, balance| {
                assert!(week > W0);
                balance
            },
        )
        .unwrap();
        // The line ends at W0 + 4 weeks + 100s.
        let expected = (3 * WEEK + 100) + (2 * WEEK + 100) + (WEEK + 100) + 100;
        assert_eq!(out.amount, U256::from(expected));
        assert_eq!(out.max_epoch, 1);
        assert_eq!(out.cursor.user_epoch, 1);
    }

    #[test]
    fn test_nothing_before_limit() {
        let cursor = ClaimCursor {
            week_cursor: W0 + 2 * WEEK,
            user_epoch: 1,
        };
        assert!(walk_claim(&history(), W0, cursor, W0 + 2 * WEEK, 50, |_, b| b).is_none());
    }

    #[test]
    fn test_walk_resumes() {
        let one = |_: u64, _: U256| U256::one();
        let first =
            walk_claim(&history(), W0, ClaimCursor::default(), W0 + 2 * WEEK, 50, one).unwrap();
        assert_eq!(first.cursor.week_cursor, W0 + 2 * WEEK);
        assert_eq!(first.amount, U256::one());

        let second = walk_claim(&history(), W0, first.cursor, W0 + 10 * WEEK, 50, one).unwrap();
        assert_eq!(second.amount, U256::from(3u64));
    }

    #[test]
    fn test_step_budget() {
        let out = walk_claim(
            &history(),
            W0,
            ClaimCursor::default(),
            W0 + 10 * WEEK,
            2,
            |_, _| U256::one(),
        )
        .unwrap();
        // One step consumes the epoch, one pays a week.
        assert_eq!(out.amount, U256::one());
        assert_eq!(out.cursor.week_cursor, W0 + 2 * WEEK);
    }
}
