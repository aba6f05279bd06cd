//! Gauge-scoped fee distributor.
//!
//! Each week's bucket is first split across gauges by relative weight,
//! then within a gauge across voters by the value of their vote line
//! against the gauge's weight at the week start. A gauge's base weight
//! has no voter, so its share stays in the vault.

use std::collections::HashMap;

use tracing::{debug, info};
use vecurve_core::{week_floor, Address, Advance, U256, WAD, WEEK, ZERO_ADDRESS};

use super::claim::{walk_claim, ClaimCursor, ClaimOutcome};
use super::vault::FeeVault;
use crate::config::DistributorConfig;
use crate::context::ExecutionContext;
use crate::controller::GaugeController;
use crate::error::{StateError, StateResult};
use crate::events::Event;
use crate::ledger::TokenLedger;

/// Cached gauge figures at one week start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct GaugeWeek {
    weight: U256,
    relative_weight: U256,
}

/// Fee distributor whose shares follow gauge votes.
#[derive(Clone, Debug)]
pub struct GaugeFeeDistributor {
    vault: FeeVault,
    /// Per gauge: next week start not yet cached.
    supply_cursors: HashMap<Address, u64>,
    gauge_weeks: HashMap<(Address, u64), GaugeWeek>,
    /// Keyed by (gauge, account).
    cursors: HashMap<(Address, Address), ClaimCursor>,
}

impl GaugeFeeDistributor {
    /// Create a distributor holding fees at `address`, paying from the week
    /// containing `start_time`. Owned by `ctx.caller`.
    pub fn new(
        address: Address,
        config: DistributorConfig,
        start_time: u64,
        ctx: &ExecutionContext,
    ) -> Self {
        Self {
            vault: FeeVault::new(address, config, start_time, ctx),
            supply_cursors: HashMap::new(),
            gauge_weeks: HashMap::new(),
            cursors: HashMap::new(),
        }
    }

    /// Fee vault and admin switches.
    pub fn vault(&self) -> &FeeVault {
        &self.vault
    }

    /// Mutable fee vault and admin switches.
    pub fn vault_mut(&mut self) -> &mut FeeVault {
        &mut self.vault
    }

    /// Drain recorded events.
    pub fn take_events(&mut self) -> Vec<Event> {
        self.vault.take_events()
    }

    /// See [`FeeVault::checkpoint_token`].
    pub fn checkpoint_token<L: TokenLedger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &L,
    ) -> StateResult<()> {
        self.vault.checkpoint_token(ctx, ledger)
    }

    /// Fees attributed to the week starting at `week`, across all gauges.
    pub fn tokens_per_week(&self, week: u64) -> U256 {
        self.vault.tokens_per_week(week)
    }

    /// Next week start whose figures for `gauge` are not cached.
    pub fn time_cursor(&self, gauge: &Address) -> u64 {
        self.supply_cursors
            .get(gauge)
            .copied()
            .unwrap_or_else(|| self.vault.start_time())
    }

    /// Cached weight of `gauge` at week start `week`.
    pub fn ve_supply(&self, gauge: &Address, week: u64) -> U256 {
        self.gauge_week(gauge, week).weight
    }

    /// Cached relative weight of `gauge` at week start `week`.
    pub fn relative_weight(&self, gauge: &Address, week: u64) -> U256 {
        self.gauge_week(gauge, week).relative_weight
    }

    fn gauge_week(&self, gauge: &Address, week: u64) -> GaugeWeek {
        self.gauge_weeks
            .get(&(*gauge, week))
            .copied()
            .unwrap_or_default()
    }

    /// Next week `account` will be paid for on `gauge`.
    pub fn time_cursor_of(&self, gauge: &Address, account: &Address) -> u64 {
        self.cursor_of(gauge, account).week_cursor
    }

    /// Vote-history epoch `account`'s next claim on `gauge` resumes from.
    pub fn user_epoch_of(&self, gauge: &Address, account: &Address) -> u64 {
        self.cursor_of(gauge, account).user_epoch
    }

    fn cursor_of(&self, gauge: &Address, account: &Address) -> ClaimCursor {
        self.cursors
            .get(&(*gauge, *account))
            .copied()
            .unwrap_or_default()
    }

    /// Cache `gauge`'s weight and relative weight at week starts up to now,
    /// at most `max_supply_checkpoint_weeks` weeks per call.
    pub fn checkpoint_total_supply(
        &mut self,
        ctx: &ExecutionContext,
        controller: &GaugeController,
        gauge: &Address,
    ) -> StateResult<Advance> {
        if controller.gauge(gauge).is_none() {
            return Err(StateError::GaugeNotAdded { gauge: *gauge });
        }
        let rounded = week_floor(ctx.timestamp);
        let mut t = self.time_cursor(gauge);
        for _ in 0..self.vault.config().max_supply_checkpoint_weeks {
            if t > rounded {
                break;
            }
            self.gauge_weeks.insert(
                (*gauge, t),
                GaugeWeek {
                    weight: controller.gauge_weight(gauge, t),
                    relative_weight: controller.gauge_relative_weight(gauge, t),
                },
            );
            t += WEEK;
        }
        self.supply_cursors.insert(*gauge, t);
        debug!(gauge = ?&gauge[..4], time_cursor = t, "Gauge supply checkpoint");
        Ok(if t > rounded {
            Advance::complete(t)
        } else {
            Advance::partial(t)
        })
    }

    /// Value of `account`'s vote line on `gauge` at `t`.
    pub fn ve_for_at(
        &self,
        controller: &GaugeController,
        gauge: &Address,
        account: &Address,
        t: u64,
    ) -> U256 {
        controller
            .vote_point_history(account, gauge)
            .map(|h| U256::from_i128_floored(h.value_at(t)))
            .unwrap_or_default()
    }

    /// Share of `gauge`'s cached weight held by `account` at `t`,
    /// WAD-scaled.
    pub fn ve_percentage_for_at(
        &self,
        controller: &GaugeController,
        gauge: &Address,
        account: &Address,
        t: u64,
    ) -> U256 {
        let supply = self.ve_supply(gauge, week_floor(t));
        self.ve_for_at(controller, gauge, account, t)
            .mul_div(WAD, supply)
    }

    fn run_checkpoints<L: TokenLedger>(
        &mut self,
        ctx: &ExecutionContext,
        controller: &GaugeController,
        ledger: &L,
        gauge: &Address,
    ) -> StateResult<()> {
        if ctx.timestamp >= self.time_cursor(gauge) {
            self.checkpoint_total_supply(ctx, controller, gauge)?;
        }
        if self.vault.token_checkpoint_due(ctx.timestamp) {
            self.vault.checkpoint_token_unchecked(ctx, ledger);
        }
        Ok(())
    }

    fn compute_claim(
        &self,
        controller: &GaugeController,
        gauge: &Address,
        account: &Address,
    ) -> Option<ClaimOutcome> {
        let history = controller.vote_point_history(account, gauge)?;
        let limit = week_floor(self.vault.last_token_time()).min(self.time_cursor(gauge));
        walk_claim(
            history,
            self.vault.start_time(),
            self.cursor_of(gauge, account),
            limit,
            self.vault.config().max_claim_weeks,
            |week, balance| {
                let cached = self.gauge_week(gauge, week);
                let gauge_tokens = self
                    .vault
                    .tokens_per_week(week)
                    .mul_div(cached.relative_weight, WAD);
                gauge_tokens.mul_div(balance, cached.weight)
            },
        )
    }

    fn record_claim(&mut self, gauge: Address, account: Address, outcome: &ClaimOutcome) {
        self.cursors.insert((gauge, account), outcome.cursor);
        info!(
            gauge = ?&gauge[..4],
            recipient = ?&account[..4],
            amount = %outcome.amount,
            "Gauge fees claimed"
        );
        self.vault.events.push(Event::Claimed {
            recipient: account,
            gauge: Some(gauge),
            amount: outcome.amount,
            claim_epoch: outcome.cursor.user_epoch,
            max_epoch: outcome.max_epoch,
        });
    }

    /// Pay `account` its share of `gauge`'s fees since its last claim.
    pub fn claim<L: TokenLedger>(
        &mut self,
        ctx: &ExecutionContext,
        controller: &GaugeController,
        ledger: &mut L,
        gauge: Address,
        account: Address,
    ) -> StateResult<U256> {
        self.vault.ensure_not_paused()?;
        self.run_checkpoints(ctx, controller, ledger, &gauge)?;

        let Some(outcome) = self.compute_claim(controller, &gauge, &account) else {
            return Ok(U256::zero());
        };
        self.vault.pay(ledger, &account, outcome.amount)?;
        self.record_claim(gauge, account, &outcome);
        Ok(outcome.amount)
    }

    /// Claim `account`'s share across several gauges in one transfer.
    pub fn claim_many_gauge<L: TokenLedger>(
        &mut self,
        ctx: &ExecutionContext,
        controller: &GaugeController,
        ledger: &mut L,
        gauges: &[Address],
        account: Address,
    ) -> StateResult<U256> {
        self.vault.ensure_not_paused()?;
        let limit = self.vault.config().max_claim_many;
        if gauges.len() > limit {
            return Err(StateError::TooManyReceivers {
                count: gauges.len(),
                limit,
            });
        }
        if account == ZERO_ADDRESS {
            return Err(StateError::ZeroAddress);
        }
        for gauge in gauges {
            self.run_checkpoints(ctx, controller, ledger, gauge)?;
        }

        let mut outcomes: Vec<(Address, ClaimOutcome)> = Vec::new();
        let mut total = U256::zero();
        for gauge in gauges {
            if outcomes.iter().any(|(g, _)| g == gauge) {
                continue;
            }
            if let Some(outcome) = self.compute_claim(controller, gauge, &account) {
                total = total + outcome.amount;
                outcomes.push((*gauge, outcome));
            }
        }

        self.vault.pay(ledger, &account, total)?;
        for (gauge, outcome) in &outcomes {
            self.record_claim(*gauge, account, outcome);
        }
        Ok(total)
    }
}
