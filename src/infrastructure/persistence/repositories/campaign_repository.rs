use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::domain::models::{CampaignStatus, JobStatus, RunStats};
use crate::infrastructure::persistence::entities::campaigns;
use crate::infrastructure::persistence::error::DbError;

/// Repository for campaign operations
#[derive(Clone)]
pub struct CampaignRepository {
    conn: DatabaseConnection,
}

impl CampaignRepository {
    /// Create a new CampaignRepository
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get a campaign by its id
    pub async fn find_by_id(&self, campaign_id: i64) -> Result<Option<campaigns::Model>, DbError> {
        let result = campaigns::Entity::find_by_id(campaign_id)
            .one(&self.conn)
            .await?;

        Ok(result)
    }

    /// Close the campaign before its settlement batch starts
    pub async fn mark_closed(&self, campaign_id: i64) -> Result<(), DbError> {
        campaigns::ActiveModel {
            id: Set(campaign_id),
            status: Set(CampaignStatus::Completed.as_str().to_string()),
            ..Default::default()
        }
        .update(&self.conn)
        .await?;

        Ok(())
    }

    /// Record that a settlement run has started for the campaign
    pub async fn mark_batch_started(&self, campaign_id: i64, run_id: i64) -> Result<(), DbError> {
        campaigns::ActiveModel {
            id: Set(campaign_id),
            batch_run_id: Set(Some(run_id)),
            batch_status: Set(Some(JobStatus::Running.as_str().to_string())),
            batch_started_at: Set(Some(Utc::now().naive_utc())),
            ..Default::default()
        }
        .update(&self.conn)
        .await?;

        Ok(())
    }

    /// Record a finished settlement run's aggregate statistics
    pub async fn mark_batch_finished(
        &self,
        campaign_id: i64,
        status: JobStatus,
        stats: &RunStats,
    ) -> Result<(), DbError> {
        campaigns::ActiveModel {
            id: Set(campaign_id),
            batch_status: Set(Some(status.as_str().to_string())),
            batch_completed_at: Set(Some(Utc::now().naive_utc())),
            total_processed: Set(stats.read as i64),
            successful_transfers: Set(stats.written as i64),
            failed_transfers: Set(stats.failed() as i64),
            ..Default::default()
        }
        .update(&self.conn)
        .await?;

        Ok(())
    }
}
