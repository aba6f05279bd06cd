//! Weekly fee buckets.

use std::collections::BTreeMap;

use vecurve_core::{week_floor, U256, WEEK};

/// Fees attributed to week buckets.
///
/// A balance increase observed at a checkpoint is assumed to have accrued
/// uniformly since the previous checkpoint, and is split across the weeks
/// of that window in proportion to the seconds each week covers.
#[derive(Clone, Debug)]
pub(crate) struct TokenBuckets {
    pub start_time: u64,
    pub last_token_time: u64,
    pub token_last_balance: U256,
    tokens_per_week: BTreeMap<u64, U256>,
}

impl TokenBuckets {
    pub fn new(start_time: u64) -> Self {
        let start = week_floor(start_time);
        Self {
            start_time: start,
            last_token_time: start,
            token_last_balance: U256::zero(),
            tokens_per_week: BTreeMap::new(),
        }
    }

    pub fn tokens_per_week(&self, week: u64) -> U256 {
        self.tokens_per_week.get(&week).copied().unwrap_or_default()
    }

    fn credit(&mut self, week: u64, amount: U256) {
        let entry = self.tokens_per_week.entry(week).or_default();
        *entry = *entry + amount;
    }

    /// Attribute `balance - token_last_balance` to weeks up to `now`.
    ///
    /// Returns the amount distributed. Weeks past `max_weeks` from the
    /// previous checkpoint receive nothing.
    pub fn checkpoint(&mut self, now: u64, balance: U256, max_weeks: u64) -> U256 {
        let to_distribute = balance.saturating_sub(self.token_last_balance);
        self.token_last_balance = balance;

        let mut t = self.last_token_time;
        let since_last = now.saturating_sub(t);
        self.last_token_time = now;
        let mut this_week = week_floor(t);

        for _ in 0..max_weeks {
            let next_week = this_week + WEEK;
            if now < next_week {
                if since_last == 0 && now == t {
                    self.credit(this_week, to_distribute);
                } else {
                    let share = to_distribute.mul_div(U256::from(now - t), U256::from(since_last));
                    self.credit(this_week, share);
                }
                break;
            }
            if since_last == 0 && next_week == t {
                self.credit(this_week, to_distribute);
            } else {
                let share =
                    to_distribute.mul_div(U256::from(next_week - t), U256::from(since_last));
                self.credit(this_week, share);
            }
            t = next_week;
            this_week = next_week;
        }
        to_distribute
    }

    /// Record a payout that left the vault.
    pub fn debit(&mut self, amount: U256) {
        self.token_last_balance = self.token_last_balance.saturating_sub(amount);
    }
}
