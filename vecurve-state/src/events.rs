//! Event journal entries.
//!
//! Components append events as state changes commit and hand them out
//! through `take_events()`. Amounts and weights are WAD-scaled.

use serde::{Deserialize, Serialize};
use vecurve_core::{Address, TypeId, U256};

/// Why an escrow deposit happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepositKind {
    /// Third-party top-up of an existing lock.
    DepositFor,
    /// New lock.
    CreateLock,
    /// Owner top-up of an existing lock.
    IncreaseLockAmount,
    /// Lock extension without new tokens.
    IncreaseUnlockTime,
}

/// A committed state change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Tokens entered escrow or a lock was extended.
    Deposit {
        provider: Address,
        value: U256,
        locktime: u64,
        kind: DepositKind,
        ts: u64,
    },
    /// An expired lock was withdrawn.
    Withdraw { provider: Address, value: U256, ts: u64 },
    /// Total locked underlying changed.
    Supply { prev_supply: U256, supply: U256 },
    /// A gauge type was registered.
    AddType { name: String, type_id: TypeId },
    /// A gauge type's weight changed from `time` onward.
    NewTypeWeight {
        type_id: TypeId,
        time: u64,
        weight: U256,
        total_weight: U256,
    },
    /// A gauge was registered.
    NewGauge {
        gauge: Address,
        type_id: TypeId,
        weight: U256,
    },
    /// An account set its vote on a gauge.
    VoteForGauge {
        time: u64,
        user: Address,
        gauge: Address,
        weight: u16,
    },
    /// Fees were attributed to weekly buckets.
    CheckpointToken { time: u64, tokens: U256 },
    /// Fees were paid out.
    Claimed {
        recipient: Address,
        gauge: Option<Address>,
        amount: U256,
        claim_epoch: u64,
        max_epoch: u64,
    },
    /// Third-party token checkpoints were enabled or disabled.
    ToggleAllowCheckpointToken { enabled: bool },
    /// The whole fee balance was sent to the emergency address.
    RecoverBalance { to: Address, amount: U256 },
    /// Claims were halted.
    Paused { by: Address },
    /// Claims were resumed.
    Unpaused { by: Address },
    /// Ownership handoff started.
    OwnershipTransferStarted { previous: Address, new: Address },
    /// Ownership handoff completed (or renounced to the zero address).
    OwnershipTransferred { previous: Address, new: Address },
}
