//! Shared fixtures for vecurve-state integration tests.

#![allow(dead_code)]

use vecurve_core::{week_floor, Address, U256, WEEK};
use vecurve_state::{
    Authorization, ControllerConfig, EngineConfig, ExecutionContext, GaugeController,
    MemoryLedger, VotingEscrow,
};

pub const OWNER: Address = [1u8; 20];
pub const ESCROW: Address = [0xee; 20];
pub const VAULT: Address = [0xfd; 20];
pub const ALICE: Address = [0xa1; 20];
pub const BOB: Address = [0xb0; 20];
pub const CAROL: Address = [0xc0; 20];
pub const G1: Address = [0x11; 20];
pub const G2: Address = [0x22; 20];
pub const G3: Address = [0x33; 20];

/// A timestamp 100 seconds into a week.
pub fn start() -> u64 {
    week_floor(1_700_000_000) + 100
}

/// Start of the week containing [`start`].
pub fn w0() -> u64 {
    week_floor(start())
}

/// `n` whole tokens.
pub fn tokens(n: u64) -> U256 {
    U256::from_wad_units(n)
}

/// Escrow, controller and token ledger sharing one clock.
pub struct Engine {
    pub config: EngineConfig,
    pub escrow: VotingEscrow,
    pub controller: GaugeController,
    pub ledger: MemoryLedger,
    pub ctx: ExecutionContext,
    nonce: u64,
}

impl Engine {
    /// Fresh engine at [`start`] with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Fresh engine at [`start`] with relaxed delays.
    pub fn devnet() -> Self {
        Self::with_config(EngineConfig::devnet())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let ctx = ExecutionContext::new(OWNER, start(), 1);
        Self {
            escrow: VotingEscrow::new(ESCROW, config.escrow.clone(), &ctx),
            controller: GaugeController::new(config.controller.clone(), &ctx),
            ledger: MemoryLedger::new(),
            config,
            ctx,
            nonce: 0,
        }
    }

    /// Move the clock forward, one block per hour.
    pub fn advance(&mut self, seconds: u64) {
        self.ctx = self.ctx.advance(seconds, seconds / 3_600 + 1);
    }

    /// Owner context at the current time.
    pub fn owner(&self) -> ExecutionContext {
        self.ctx.with_caller(OWNER)
    }

    /// Context for `caller` at the current time.
    pub fn as_caller(&self, caller: Address) -> ExecutionContext {
        self.ctx.with_caller(caller)
    }

    pub fn authorization(&mut self) -> Authorization {
        self.nonce += 1;
        Authorization::new(self.nonce, u64::MAX, vec![1])
    }

    /// Mint `amount` to `account` and lock it until `unlock_time`.
    pub fn lock(&mut self, account: Address, amount: U256, unlock_time: u64) {
        self.ledger.mint(&account, amount);
        let auth = self.authorization();
        let ctx = self.as_caller(account);
        self.escrow
            .create_lock(&ctx, &mut self.ledger, amount, unlock_time, &auth)
            .unwrap();
    }

    /// Register `gauges` under one type of weight 1e18.
    pub fn gauges(&mut self, gauges: &[(Address, U256)]) {
        let ctx = self.owner();
        let type_id = self
            .controller
            .add_type(&ctx, "liquidity", vecurve_core::WAD)
            .unwrap();
        for (gauge, weight) in gauges {
            self.controller
                .add_gauge(&ctx, *gauge, type_id, *weight)
                .unwrap();
        }
    }

    pub fn vote(&mut self, account: Address, gauge: Address, power: u16) {
        let ctx = self.as_caller(account);
        self.controller
            .vote_for_gauge_weights(&ctx, &self.escrow, gauge, power)
            .unwrap();
    }
}

/// Controller config without a re-vote cooldown.
pub fn no_cooldown() -> ControllerConfig {
    ControllerConfig {
        weight_vote_delay: 0,
        ..ControllerConfig::default()
    }
}

pub fn abs_diff(a: U256, b: U256) -> U256 {
    if a > b {
        a - b
    } else {
        b - a
    }
}

/// Sum of `f(week)` for each week start in `[from, to)`.
pub fn sum_weeks(from: u64, to: u64, f: impl Fn(u64) -> U256) -> U256 {
    let mut total = U256::zero();
    let mut week = from;
    while week < to {
        total = total + f(week);
        week += WEEK;
    }
    total
}
