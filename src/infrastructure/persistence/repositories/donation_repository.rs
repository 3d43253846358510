use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::domain::models::{
    BlockchainStatus, FraudReviewStatus, PendingDonation, TransferOutcome, TransferResult,
};
use crate::infrastructure::persistence::entities::donations;
use crate::infrastructure::persistence::error::DbError;
use crate::utils::logging;

/// Repository for donation operations
#[derive(Clone)]
pub struct DonationRepository {
    conn: DatabaseConnection,
}

impl DonationRepository {
    /// Create a new DonationRepository
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Fetch the next page of donations pending settlement for a campaign.
    ///
    /// The selection is ordered by (paid_at, id) and always returns the
    /// first page of the remaining pending set; committed chunks move their
    /// items to a terminal status and out of this query.
    pub async fn find_pending(
        &self,
        campaign_id: i64,
        limit: u64,
    ) -> Result<Vec<PendingDonation>, DbError> {
        let results = donations::Entity::find()
            .filter(donations::Column::CampaignId.eq(campaign_id))
            .filter(
                donations::Column::BlockchainStatus.eq(BlockchainStatus::NotRecorded.as_str()),
            )
            .order_by_asc(donations::Column::PaidAt)
            .order_by_asc(donations::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await?;

        Ok(results.into_iter().map(|d| self.to_domain_model(d)).collect())
    }

    /// Count donations pending settlement for a campaign
    pub async fn count_pending(&self, campaign_id: i64) -> Result<u64, DbError> {
        let count = donations::Entity::find()
            .filter(donations::Column::CampaignId.eq(campaign_id))
            .filter(
                donations::Column::BlockchainStatus.eq(BlockchainStatus::NotRecorded.as_str()),
            )
            .count(&self.conn)
            .await?;

        Ok(count)
    }

    /// Count donations whose fraud review has not cleared
    pub async fn count_unresolved_fraud_reviews(&self, campaign_id: i64) -> Result<u64, DbError> {
        let count = donations::Entity::find()
            .filter(donations::Column::CampaignId.eq(campaign_id))
            .filter(donations::Column::FraudReviewStatus.ne(FraudReviewStatus::Cleared.as_str()))
            .count(&self.conn)
            .await?;

        Ok(count)
    }

    /// Persist one chunk of transfer results atomically.
    ///
    /// All updates in the slice are applied inside a single transaction; a
    /// failure rolls the whole chunk back.
    pub async fn write_chunk(&self, results: &[TransferResult]) -> Result<(), DbError> {
        if results.is_empty() {
            return Ok(());
        }

        let txn = self.conn.begin().await?;

        for result in results {
            match &result.outcome {
                TransferOutcome::Success {
                    tx_hash,
                    donor_address,
                    token_amount,
                    gas_fee,
                    ..
                } => {
                    donations::ActiveModel {
                        id: Set(result.donation_id),
                        blockchain_status: Set(BlockchainStatus::Recorded.as_str().to_string()),
                        donation_tx_hash: Set(Some(tx_hash.clone())),
                        donor_wallet_address: Set(Some(donor_address.clone())),
                        token_type: Set(Some("USDC".to_string())),
                        token_amount: Set(Some(*token_amount)),
                        gas_fee: Set(Some(*gas_fee)),
                        blockchain_recorded_at: Set(Some(Utc::now().naive_utc())),
                        blockchain_error_message: Set(None),
                        ..Default::default()
                    }
                    .update(&txn)
                    .await?;
                }
                TransferOutcome::Failure {
                    error_message,
                    error_kind,
                } => {
                    let message = format!("[{}] {}", error_kind.as_str(), error_message);

                    donations::ActiveModel {
                        id: Set(result.donation_id),
                        blockchain_status: Set(BlockchainStatus::Failed.as_str().to_string()),
                        blockchain_error_message: Set(Some(message)),
                        ..Default::default()
                    }
                    .update(&txn)
                    .await?;
                }
            }
        }

        txn.commit().await?;

        logging::log_debug(&format!("Committed chunk of {} results", results.len()));

        Ok(())
    }

    /// Convert a database entity to a domain model
    fn to_domain_model(&self, entity: donations::Model) -> PendingDonation {
        PendingDonation {
            id: entity.id,
            campaign_id: entity.campaign_id,
            user_id: entity.user_id,
            amount: entity.amount,
            paid_at: entity.paid_at,
        }
    }
}
