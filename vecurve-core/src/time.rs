//! The epoch grid.
//!
//! Lock expiries, weight changes and fee buckets all align to whole weeks
//! counted from the unix epoch.

/// Seconds in a day.
pub const DAY: u64 = 86_400;

/// Seconds in a week. The accounting epoch.
pub const WEEK: u64 = 7 * DAY;

/// Seconds in a (365-day) year.
pub const YEAR: u64 = 365 * DAY;

/// Longest allowed lock: four years.
pub const MAXTIME: u64 = 4 * YEAR;

/// Round a timestamp down to the start of its week.
#[inline]
pub const fn week_floor(t: u64) -> u64 {
    t / WEEK * WEEK
}

/// Round a timestamp up to the next week boundary (identity on a boundary).
#[inline]
pub const fn week_ceil(t: u64) -> u64 {
    week_floor(t.saturating_add(WEEK - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_floor() {
        assert_eq!(week_floor(0), 0);
        assert_eq!(week_floor(WEEK - 1), 0);
        assert_eq!(week_floor(WEEK), WEEK);
        assert_eq!(week_floor(3 * WEEK + 17), 3 * WEEK);
    }

    #[test]
    fn test_week_ceil() {
        assert_eq!(week_ceil(0), 0);
        assert_eq!(week_ceil(1), WEEK);
        assert_eq!(week_ceil(WEEK), WEEK);
        assert_eq!(week_ceil(WEEK + 1), 2 * WEEK);
    }

    #[test]
    fn test_maxtime_is_four_years() {
        assert_eq!(MAXTIME, 126_144_000);
    }
}
