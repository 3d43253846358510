//! Seams between the chunk engine and its collaborators.
//!
//! The engine is written against these traits so its retry/skip/commit
//! behavior can be exercised with in-memory fakes; the repository-backed
//! implementations live next to the traits.

use async_trait::async_trait;

use crate::domain::errors::{PipelineError, TransferError};
use crate::domain::models::{JobStatus, PendingDonation, RunStats, TransferResult};
use crate::infrastructure::persistence::repositories::DonationRepository;

/// Pages through the donations pending settlement for a campaign
#[async_trait]
pub trait DonationSource: Send + Sync {
    /// The next page of pending donations, ordered by payment-completion time
    async fn fetch_pending(
        &self,
        campaign_id: i64,
        page_size: u64,
    ) -> Result<Vec<PendingDonation>, PipelineError>;

    /// Total number of pending donations
    async fn count_pending(&self, campaign_id: i64) -> Result<u64, PipelineError>;
}

/// Persists one chunk of transfer results atomically
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn write_chunk(&self, results: &[TransferResult]) -> Result<(), PipelineError>;
}

/// Executes the on-chain transfer sequence for one donation
#[async_trait]
pub trait DonationTransfer: Send + Sync {
    async fn transfer(&self, donation: &PendingDonation)
        -> Result<TransferResult, TransferError>;
}

/// Observes run lifecycle transitions and progress
#[async_trait]
pub trait RunTracker: Send + Sync {
    async fn on_start(&self, run_id: i64, campaign_id: i64) -> Result<(), PipelineError>;

    async fn on_progress(&self, run_id: i64, stats: &RunStats) -> Result<(), PipelineError>;

    async fn on_finish(
        &self,
        run_id: i64,
        campaign_id: i64,
        status: JobStatus,
        stats: &RunStats,
        exit_message: Option<&str>,
    ) -> Result<(), PipelineError>;
}

#[async_trait]
impl DonationSource for DonationRepository {
    async fn fetch_pending(
        &self,
        campaign_id: i64,
        page_size: u64,
    ) -> Result<Vec<PendingDonation>, PipelineError> {
        Ok(self.find_pending(campaign_id, page_size).await?)
    }

    async fn count_pending(&self, campaign_id: i64) -> Result<u64, PipelineError> {
        Ok(DonationRepository::count_pending(self, campaign_id).await?)
    }
}

#[async_trait]
impl ResultSink for DonationRepository {
    async fn write_chunk(&self, results: &[TransferResult]) -> Result<(), PipelineError> {
        Ok(DonationRepository::write_chunk(self, results).await?)
    }
}
