use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// Blockchain-recording status of a donation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockchainStatus {
    /// Payment completed, not yet settled on-chain
    NotRecorded,
    /// Settled on-chain with a transaction hash
    Recorded,
    /// Settlement attempted and failed
    Failed,
}

impl BlockchainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockchainStatus::NotRecorded => "NOT_RECORDED",
            BlockchainStatus::Recorded => "RECORDED",
            BlockchainStatus::Failed => "FAILED",
        }
    }
}

/// Fraud-review status of a donation.
///
/// The scoring service itself is external; the pipeline only gates launches
/// on unresolved reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FraudReviewStatus {
    Pending,
    Cleared,
    Flagged,
}

impl FraudReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FraudReviewStatus::Pending => "PENDING",
            FraudReviewStatus::Cleared => "CLEARED",
            FraudReviewStatus::Flagged => "FLAGGED",
        }
    }
}

/// A donation selected for on-chain settlement
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDonation {
    pub id: i64,
    pub campaign_id: i64,
    /// Owning user; `None` for guest donations, which cannot be settled
    pub user_id: Option<i64>,
    pub amount: Decimal,
    pub paid_at: Option<NaiveDateTime>,
}
