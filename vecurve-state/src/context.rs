//! Execution context for engine calls.

use vecurve_core::Address;

/// Execution context carrying the caller and block-level information.
///
/// Every mutating call and every "as of now" query receives a context.
/// Components never read a clock of their own: `timestamp` and
/// `block_height` are the only time source, and both must be
/// non-decreasing across calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Account making the call.
    pub caller: Address,

    /// Current block timestamp (unix seconds).
    pub timestamp: u64,

    /// Current block height.
    pub block_height: u64,
}

impl ExecutionContext {
    /// Create a new execution context.
    pub fn new(caller: Address, timestamp: u64, block_height: u64) -> Self {
        Self {
            caller,
            timestamp,
            block_height,
        }
    }

    /// Same block, different caller.
    pub fn with_caller(&self, caller: Address) -> Self {
        Self {
            caller,
            ..self.clone()
        }
    }

    /// Context `seconds` and `blocks` later, same caller.
    pub fn advance(&self, seconds: u64, blocks: u64) -> Self {
        Self {
            caller: self.caller,
            timestamp: self.timestamp + seconds,
            block_height: self.block_height + blocks,
        }
    }

    /// Create an execution context for testing with minimal values.
    #[cfg(test)]
    pub fn test_context() -> Self {
        Self {
            caller: [1u8; 20],
            timestamp: 1_700_000_000,
            block_height: 1,
        }
    }
}
