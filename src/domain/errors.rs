use std::error::Error;
use std::fmt;

use crate::domain::models::FailureKind;
use crate::domain::services::KeyStoreError;
use crate::infrastructure::persistence::error::DbError;

/// The on-chain step a network failure occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStep {
    /// Native-currency gas funding of the donor wallet
    GasTransfer,
    /// Token minting into the donor wallet
    TokenCharge,
    /// Token balance read
    BalanceCheck,
    /// Approve + donate against the campaign contract
    Donation,
}

impl ChainStep {
    /// Tag recorded on failure results produced by this step
    pub fn tag(&self) -> &'static str {
        match self {
            ChainStep::GasTransfer => "gas_transfer",
            ChainStep::TokenCharge => "usdc_charge",
            ChainStep::BalanceCheck => "balance_check",
            ChainStep::Donation => "donation_failed",
        }
    }
}

/// Error raised while transferring a single donation on-chain.
///
/// The chunk engine drives its retry/skip policy off these variants; anything
/// the orchestrator cannot classify is converted into a generic failure
/// result at its boundary and never surfaces here as `Other`.
#[derive(Debug)]
pub enum TransferError {
    /// Donation has no user, or the user has no primary wallet
    WalletNotFound {
        donation_id: i64,
        user_id: Option<i64>,
        message: String,
    },
    /// Donor wallet token balance below the donation amount
    InsufficientBalance {
        wallet_address: String,
        message: String,
    },
    /// Campaign chain data missing or donation data unusable
    IllegalState(String),
    /// Network-level failure of an on-chain call
    ChainNetwork { step: ChainStep, message: String },
    /// Unclassified failure, handled locally by the orchestrator
    Other(String),
}

impl TransferError {
    /// The kind tag recorded when this error is written as a failure result
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            TransferError::WalletNotFound { .. } => FailureKind::WalletNotFound,
            TransferError::InsufficientBalance { .. } => FailureKind::InsufficientBalance,
            TransferError::IllegalState(_) => FailureKind::IllegalState,
            TransferError::ChainNetwork { step, .. } => FailureKind::ChainNetwork(*step),
            TransferError::Other(_) => FailureKind::Unknown,
        }
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::WalletNotFound {
                donation_id,
                user_id,
                message,
            } => write!(
                f,
                "Wallet not found for donation {} (user {:?}): {}",
                donation_id, user_id, message
            ),
            TransferError::InsufficientBalance {
                wallet_address,
                message,
            } => write!(
                f,
                "Insufficient balance in wallet {}: {}",
                wallet_address, message
            ),
            TransferError::IllegalState(msg) => write!(f, "Illegal state: {}", msg),
            TransferError::ChainNetwork { step, message } => {
                write!(f, "Chain network error ({}): {}", step.tag(), message)
            }
            TransferError::Other(msg) => write!(f, "Unexpected error: {}", msg),
        }
    }
}

impl Error for TransferError {}

/// Error type for wallet resolution and signing-credential operations
#[derive(Debug)]
pub enum WalletError {
    /// Key store failure while decrypting or encrypting a private key
    KeyStore(KeyStoreError),
    /// Stored private key could not be parsed into a signer
    InvalidKey(String),
    /// Database error
    DbError(DbError),
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletError::KeyStore(e) => write!(f, "Key store error: {}", e),
            WalletError::InvalidKey(msg) => write!(f, "Invalid private key: {}", msg),
            WalletError::DbError(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl Error for WalletError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WalletError::KeyStore(e) => Some(e),
            WalletError::InvalidKey(_) => None,
            WalletError::DbError(e) => Some(e),
        }
    }
}

impl From<KeyStoreError> for WalletError {
    fn from(error: KeyStoreError) -> Self {
        WalletError::KeyStore(error)
    }
}

impl From<DbError> for WalletError {
    fn from(error: DbError) -> Self {
        WalletError::DbError(error)
    }
}

/// Error type for run launching and engine-level operations
#[derive(Debug)]
pub enum PipelineError {
    /// Database error
    DbError(DbError),
    /// Launch precondition violated
    Validation(String),
    /// Referenced campaign or run does not exist
    NotFound(String),
    /// Configuration error
    ConfigError(String),
    /// Engine-level failure while processing a run
    Engine(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::DbError(e) => write!(f, "Database error: {}", e),
            PipelineError::Validation(msg) => write!(f, "Validation error: {}", msg),
            PipelineError::NotFound(msg) => write!(f, "Not found: {}", msg),
            PipelineError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            PipelineError::Engine(msg) => write!(f, "Engine error: {}", msg),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::DbError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DbError> for PipelineError {
    fn from(error: DbError) -> Self {
        PipelineError::DbError(error)
    }
}
