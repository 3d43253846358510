use thiserror::Error;

/// Errors raised by on-chain calls.
///
/// The orchestrator treats every variant as a single network-failure class;
/// the variants exist for diagnostics, not for policy decisions.
#[derive(Debug, Error)]
pub enum ChainError {
    /// RPC connection or request failed
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Transaction was mined but reverted
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// Malformed on-chain address
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),
}

/// Result type for blockchain operations
pub type ChainResult<T> = Result<T, ChainError>;
