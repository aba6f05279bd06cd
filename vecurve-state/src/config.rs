//! Engine configuration.
//!
//! Every field has a default matching the production parameters, so an
//! empty JSON object is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vecurve_core::{DAY, MAXTIME, WEEK};

/// Hard ceiling on `controller.max_types`.
pub const MAX_GAUGE_TYPES: u32 = 1024;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is not valid JSON for [`EngineConfig`].
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A value is outside its allowed range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Escrow ledger parameters.
    pub escrow: EscrowConfig,
    /// Weight controller parameters.
    pub controller: ControllerConfig,
    /// Fee distributor parameters.
    pub distributor: DistributorConfig,
}

/// Escrow ledger parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscrowConfig {
    /// Longest allowed lock (seconds). A lock this long has voting power
    /// equal to its amount.
    pub max_time: u64,
    /// Divisor applied with `max_time` when deriving a lock's slope.
    pub base_rate: u64,
    /// Shortest allowed lock (seconds).
    pub min_lock_time: u64,
    /// Most weeks of global supply one mutating call may replay.
    pub max_replay_weeks: u64,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            max_time: MAXTIME,
            base_rate: 1,
            min_lock_time: WEEK,
            max_replay_weeks: 255,
        }
    }
}

/// Weight controller parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Cooldown between two votes by one account on one gauge (seconds).
    pub weight_vote_delay: u64,
    /// Most weeks a weight curve replays per call.
    pub max_catch_up_weeks: u64,
    /// Size limit of the gauge type registry.
    pub max_types: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            weight_vote_delay: 10 * DAY,
            max_catch_up_weeks: 500,
            max_types: 100,
        }
    }
}

/// Fee distributor parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributorConfig {
    /// Minimum spacing of third-party token checkpoints (seconds).
    pub token_checkpoint_deadline: u64,
    /// Weeks of voting supply cached per supply checkpoint call.
    pub max_supply_checkpoint_weeks: u64,
    /// Weeks one token checkpoint may split a balance delta across.
    pub max_token_checkpoint_weeks: u64,
    /// Weeks one claim walks before stopping.
    pub max_claim_weeks: u64,
    /// Receivers accepted by one batch claim.
    pub max_claim_many: usize,
}

impl Default for DistributorConfig {
    fn default() -> Self {
        Self {
            token_checkpoint_deadline: DAY,
            max_supply_checkpoint_weeks: 20,
            max_token_checkpoint_weeks: 20,
            max_claim_weeks: 50,
            max_claim_many: 20,
        }
    }
}

impl EngineConfig {
    /// Configuration with relaxed delays for local testing.
    ///
    /// Vote cooldown and token checkpoint spacing drop to zero. The week
    /// grid and lock bounds are unchanged.
    pub fn devnet() -> Self {
        let mut config = Self::default();
        config.controller.weight_vote_delay = 0;
        config.distributor.token_checkpoint_deadline = 0;
        config
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let escrow = &self.escrow;
        if escrow.max_time == 0 || escrow.max_time % WEEK != 0 {
            return Err(ConfigError::Invalid(format!(
                "escrow.max_time {} must be a positive multiple of a week",
                escrow.max_time
            )));
        }
        if escrow.base_rate == 0 {
            return Err(ConfigError::Invalid("escrow.base_rate must be positive".into()));
        }
        if escrow.min_lock_time > escrow.max_time {
            return Err(ConfigError::Invalid(
                "escrow.min_lock_time exceeds escrow.max_time".into(),
            ));
        }
        if escrow.max_replay_weeks == 0 {
            return Err(ConfigError::Invalid(
                "escrow.max_replay_weeks must be positive".into(),
            ));
        }
        if self.controller.max_catch_up_weeks == 0 {
            return Err(ConfigError::Invalid(
                "controller.max_catch_up_weeks must be positive".into(),
            ));
        }
        let max_types = self.controller.max_types;
        if max_types == 0 || max_types > MAX_GAUGE_TYPES {
            return Err(ConfigError::Invalid(format!(
                "controller.max_types {} must be in 1..={}",
                max_types, MAX_GAUGE_TYPES
            )));
        }
        let d = &self.distributor;
        if d.max_supply_checkpoint_weeks == 0
            || d.max_token_checkpoint_weeks == 0
            || d.max_claim_weeks == 0
        {
            return Err(ConfigError::Invalid(
                "distributor week limits must be positive".into(),
            ));
        }
        Ok(())
    }
}
