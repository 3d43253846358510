use rust_decimal::Decimal;

use crate::domain::errors::ChainStep;

/// Kind tag carried by failure results and persisted with the failure reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    WalletNotFound,
    InsufficientBalance,
    IllegalState,
    /// Network failure of an on-chain step, surviving retry exhaustion
    ChainNetwork(ChainStep),
    Unknown,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::WalletNotFound => "WALLET_NOT_FOUND",
            FailureKind::InsufficientBalance => "INSUFFICIENT_BALANCE",
            FailureKind::IllegalState => "ILLEGAL_STATE",
            FailureKind::ChainNetwork(step) => step.tag(),
            FailureKind::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Skippable failures count against the run's skip budget
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            FailureKind::WalletNotFound
                | FailureKind::InsufficientBalance
                | FailureKind::IllegalState
        )
    }
}

/// Payload of a completed transfer attempt
#[derive(Debug, Clone, PartialEq)]
pub enum TransferOutcome {
    Success {
        /// Hash of the donate transaction
        tx_hash: String,
        donor_address: String,
        beneficiary_address: String,
        token_amount: Decimal,
        gas_fee: Decimal,
    },
    Failure {
        error_message: String,
        error_kind: FailureKind,
    },
}

/// Per-donation result produced by the orchestrator and consumed by the
/// chunk writer. Ephemeral; never persisted as its own entity.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferResult {
    pub donation_id: i64,
    pub elapsed_ms: u64,
    pub outcome: TransferOutcome,
}

impl TransferResult {
    pub fn success(
        donation_id: i64,
        tx_hash: String,
        donor_address: String,
        beneficiary_address: String,
        token_amount: Decimal,
        gas_fee: Decimal,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            donation_id,
            elapsed_ms,
            outcome: TransferOutcome::Success {
                tx_hash,
                donor_address,
                beneficiary_address,
                token_amount,
                gas_fee,
            },
        }
    }

    pub fn failure(
        donation_id: i64,
        error_message: String,
        error_kind: FailureKind,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            donation_id,
            elapsed_ms,
            outcome: TransferOutcome::Failure {
                error_message,
                error_kind,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, TransferOutcome::Success { .. })
    }

    /// The failure kind, if this result is a failure
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.outcome {
            TransferOutcome::Failure { error_kind, .. } => Some(*error_kind),
            TransferOutcome::Success { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_tags() {
        assert_eq!(FailureKind::WalletNotFound.as_str(), "WALLET_NOT_FOUND");
        assert_eq!(
            FailureKind::InsufficientBalance.as_str(),
            "INSUFFICIENT_BALANCE"
        );
        assert_eq!(
            FailureKind::ChainNetwork(ChainStep::GasTransfer).as_str(),
            "gas_transfer"
        );
        assert_eq!(
            FailureKind::ChainNetwork(ChainStep::TokenCharge).as_str(),
            "usdc_charge"
        );
        assert_eq!(
            FailureKind::ChainNetwork(ChainStep::Donation).as_str(),
            "donation_failed"
        );
        assert_eq!(FailureKind::Unknown.as_str(), "UNKNOWN_ERROR");
    }

    #[test]
    fn test_skippable_kinds() {
        assert!(FailureKind::WalletNotFound.is_skippable());
        assert!(FailureKind::InsufficientBalance.is_skippable());
        assert!(FailureKind::IllegalState.is_skippable());
        assert!(!FailureKind::ChainNetwork(ChainStep::BalanceCheck).is_skippable());
        assert!(!FailureKind::Unknown.is_skippable());
    }

    #[test]
    fn test_result_accessors() {
        let ok = TransferResult::success(
            1,
            "0xabc".to_string(),
            "0xd0".to_string(),
            "0xb1".to_string(),
            rust_decimal::Decimal::from(1000),
            rust_decimal::Decimal::new(5, 3),
            120,
        );
        assert!(ok.is_success());
        assert_eq!(ok.failure_kind(), None);

        let failed = TransferResult::failure(
            2,
            "no wallet".to_string(),
            FailureKind::WalletNotFound,
            10,
        );
        assert!(!failed.is_success());
        assert_eq!(failed.failure_kind(), Some(FailureKind::WalletNotFound));
    }
}
