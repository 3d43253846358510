use crate::domain::errors::TransferError;

/// What the chunk engine does with a failed item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultAction {
    /// Re-attempt the same item, bounded by the retry limit
    Retry,
    /// Record a failure result and count it against the skip budget
    Skip,
    /// Abort the run
    Propagate,
}

/// Retry/skip policy consulted by the chunk engine after each item attempt
#[derive(Debug, Clone, Copy)]
pub struct FaultPolicy {
    /// Retries allowed per item; an item is attempted `retry_limit + 1` times
    pub retry_limit: u32,
    /// Cumulative skips allowed; the run fails once this is exceeded
    pub skip_limit: u64,
    /// Delay between retries of the same item
    pub retry_delay_ms: u64,
}

impl FaultPolicy {
    pub fn classify(&self, error: &TransferError) -> FaultAction {
        match error {
            TransferError::ChainNetwork { .. } => FaultAction::Retry,
            TransferError::WalletNotFound { .. }
            | TransferError::InsufficientBalance { .. }
            | TransferError::IllegalState(_) => FaultAction::Skip,
            TransferError::Other(_) => FaultAction::Propagate,
        }
    }
}

impl Default for FaultPolicy {
    fn default() -> Self {
        Self {
            retry_limit: 3,
            skip_limit: 1000,
            retry_delay_ms: 500,
        }
    }
}
