//! Error types for engine operations.

use vecurve_core::{Address, CoreError, U256};

/// All validation and execution errors for engine calls.
///
/// A call that returns an error has made no state change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateError {
    // === Validation Errors ===
    /// Amount must be greater than zero.
    ZeroAmount,
    /// The zero address is not allowed here.
    ZeroAddress,
    /// Vote power must be within 0..=10000 basis points.
    VotePowerOutOfRange { power: u16 },
    /// Unlock time is earlier than the minimum lock duration allows.
    UnlockTimeTooSoon { unlock_time: u64, earliest: u64 },
    /// Unlock time is later than the maximum lock duration allows.
    UnlockTimeTooLate { unlock_time: u64, latest: u64 },
    /// Gauge type id is not registered.
    InvalidGaugeType { type_id: u32 },
    /// The gauge type registry is full.
    TooManyGaugeTypes { limit: u32 },
    /// Batch call names more receivers than allowed.
    TooManyReceivers { count: usize, limit: usize },

    // === Escrow Errors ===
    /// Account already holds a lock.
    LockAlreadyExists { account: Address },
    /// Account holds no lock.
    NoActiveLock { account: Address },
    /// Lock has reached its unlock time.
    LockExpired { account: Address, end: u64 },
    /// Lock has not reached its unlock time.
    LockNotExpired { end: u64, now: u64 },
    /// New unlock time does not extend the lock.
    CanOnlyIncreaseLockDuration { current_end: u64, requested_end: u64 },
    /// Historical query names a block that has not been produced.
    BlockInFuture { block: u64, latest: u64 },
    /// More weeks are pending than one call may replay.
    CheckpointBehind { pending_weeks: u64, limit: u64 },

    // === Controller Errors ===
    /// Gauge is not registered.
    GaugeNotAdded { gauge: Address },
    /// Gauge is already registered.
    GaugeAlreadyAdded { gauge: Address },
    /// Re-vote on the same gauge inside the cooldown.
    VoteTooOften { next_allowed: u64 },
    /// Voter's total allocated power would exceed 10000 basis points.
    VotePowerExceeded { total: u32 },
    /// A batch names the same gauge twice.
    DuplicateVote { gauge: Address },
    /// Voter's lock ends before the next vote takes effect.
    LockExpiresTooSoon { lock_end: u64, next_time: u64 },

    // === Authorization Errors ===
    /// Caller is not the owner.
    NotOwner { caller: Address },
    /// Caller is not the pending owner.
    NotPendingOwner { caller: Address },
    /// Caller lacks a required role.
    MissingRole { role: &'static str, caller: Address },
    /// Token checkpoint refused for this caller at this time.
    TokenCheckpointNotAllowed,

    // === Paused-State Errors ===
    /// Component is paused.
    Paused,

    // === Token Ledger Errors ===
    /// Account balance is below the transfer amount.
    InsufficientBalance { account: Address, balance: U256, required: U256 },
    /// Spender allowance is below the transfer amount.
    InsufficientAllowance { allowance: U256, required: U256 },
    /// Pull authorization is past its deadline.
    AuthorizationExpired { deadline: u64, now: u64 },
    /// Pull authorization nonce was already used.
    AuthorizationReused { nonce: u64 },
    /// Pull authorization carries no signature.
    AuthorizationInvalid,

    // === General Errors ===
    /// Value does not fit its representation.
    ValueOutOfRange { what: &'static str },
    /// Arithmetic overflow.
    ArithmeticOverflow,
}

impl std::fmt::Display for StateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Validation errors
            StateError::ZeroAmount => write!(f, "amount must be greater than zero"),
            StateError::ZeroAddress => write!(f, "zero address not allowed"),
            StateError::VotePowerOutOfRange { power } => {
                write!(f, "vote power {} exceeds 10000 bps", power)
            }
            StateError::UnlockTimeTooSoon { unlock_time, earliest } => {
                write!(
                    f,
                    "unlock time {} before earliest allowed {}",
                    unlock_time, earliest
                )
            }
            StateError::UnlockTimeTooLate { unlock_time, latest } => {
                write!(f, "unlock time {} after latest allowed {}", unlock_time, latest)
            }
            StateError::InvalidGaugeType { type_id } => {
                write!(f, "gauge type {} not registered", type_id)
            }
            StateError::TooManyGaugeTypes { limit } => {
                write!(f, "gauge type limit {} reached", limit)
            }
            StateError::TooManyReceivers { count, limit } => {
                write!(f, "too many receivers: {} (limit {})", count, limit)
            }

            // Escrow errors
            StateError::LockAlreadyExists { account } => {
                write!(f, "withdraw old tokens first: {:?}", &account[..4])
            }
            StateError::NoActiveLock { account } => {
                write!(f, "no existing lock found: {:?}", &account[..4])
            }
            StateError::LockExpired { account, end } => {
                write!(f, "lock of {:?} expired at {}", &account[..4], end)
            }
            StateError::LockNotExpired { end, now } => {
                write!(f, "the lock didn't expire: ends {} (now {})", end, now)
            }
            StateError::CanOnlyIncreaseLockDuration { current_end, requested_end } => {
                write!(
                    f,
                    "can only increase lock duration: {} <= {}",
                    requested_end, current_end
                )
            }
            StateError::BlockInFuture { block, latest } => {
                write!(f, "block {} is after latest block {}", block, latest)
            }
            StateError::CheckpointBehind { pending_weeks, limit } => {
                write!(
                    f,
                    "{} weeks pending, at most {} per call; advance checkpoints first",
                    pending_weeks, limit
                )
            }

            // Controller errors
            StateError::GaugeNotAdded { gauge } => {
                write!(f, "gauge not added: {:?}", &gauge[..4])
            }
            StateError::GaugeAlreadyAdded { gauge } => {
                write!(f, "gauge already added: {:?}", &gauge[..4])
            }
            StateError::VoteTooOften { next_allowed } => {
                write!(f, "cannot vote so often, next vote at {}", next_allowed)
            }
            StateError::VotePowerExceeded { total } => {
                write!(f, "used too much power: {} bps", total)
            }
            StateError::DuplicateVote { gauge } => {
                write!(f, "gauge voted twice in one batch: {:?}", &gauge[..4])
            }
            StateError::LockExpiresTooSoon { lock_end, next_time } => {
                write!(
                    f,
                    "your token lock expires too soon: {} <= {}",
                    lock_end, next_time
                )
            }

            // Authorization errors
            StateError::NotOwner { caller } => {
                write!(f, "caller is not the owner: {:?}", &caller[..4])
            }
            StateError::NotPendingOwner { caller } => {
                write!(f, "caller is not the new owner: {:?}", &caller[..4])
            }
            StateError::MissingRole { role, caller } => {
                write!(f, "{:?} is missing role {}", &caller[..4], role)
            }
            StateError::TokenCheckpointNotAllowed => write!(f, "FD001"),

            // Paused
            StateError::Paused => write!(f, "paused"),

            // Token ledger errors
            StateError::InsufficientBalance { account, balance, required } => {
                write!(
                    f,
                    "insufficient balance for {:?}: have {}, need {}",
                    &account[..4],
                    balance,
                    required
                )
            }
            StateError::InsufficientAllowance { allowance, required } => {
                write!(
                    f,
                    "insufficient allowance: have {}, need {}",
                    allowance, required
                )
            }
            StateError::AuthorizationExpired { deadline, now } => {
                write!(f, "authorization expired at {} (now {})", deadline, now)
            }
            StateError::AuthorizationReused { nonce } => {
                write!(f, "authorization nonce {} already used", nonce)
            }
            StateError::AuthorizationInvalid => write!(f, "authorization signature missing"),

            // General errors
            StateError::ValueOutOfRange { what } => write!(f, "{} out of range", what),
            StateError::ArithmeticOverflow => write!(f, "arithmetic overflow"),
        }
    }
}

impl std::error::Error for StateError {}

impl From<CoreError> for StateError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::OutOfRange { what } => StateError::ValueOutOfRange { what },
            CoreError::Overflow => StateError::ArithmeticOverflow,
        }
    }
}

/// Result type for engine operations.
pub type StateResult<T> = Result<T, StateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StateError::NoActiveLock { account: [0u8; 20] };
        assert!(err.to_string().contains("no existing lock"));
    }

    #[test]
    fn test_token_checkpoint_code() {
        assert_eq!(StateError::TokenCheckpointNotAllowed.to_string(), "FD001");
    }

    #[test]
    fn test_from_core_error() {
        let err: StateError = CoreError::OutOfRange { what: "slope" }.into();
        assert_eq!(err, StateError::ValueOutOfRange { what: "slope" });
        let err: StateError = CoreError::Overflow.into();
        assert_eq!(err, StateError::ArithmeticOverflow);
    }

    #[test]
    fn test_error_clone() {
        let err = StateError::ZeroAmount;
        let cloned = err.clone();
        assert_eq!(err, cloned);
    }
}
