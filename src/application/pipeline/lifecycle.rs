//! Run lifecycle bookkeeping on the job_runs and campaigns tables.

use async_trait::async_trait;

use crate::application::pipeline::traits::RunTracker;
use crate::domain::errors::PipelineError;
use crate::domain::models::{JobStatus, RunStats};
use crate::infrastructure::persistence::repositories::{CampaignRepository, JobRunRepository};
use crate::utils::logging;

/// Mirrors run transitions onto the campaign and aggregates run statistics
pub struct JobLifecycleTracker {
    campaign_repository: CampaignRepository,
    job_run_repository: JobRunRepository,
}

impl JobLifecycleTracker {
    pub fn new(
        campaign_repository: CampaignRepository,
        job_run_repository: JobRunRepository,
    ) -> Self {
        Self {
            campaign_repository,
            job_run_repository,
        }
    }
}

#[async_trait]
impl RunTracker for JobLifecycleTracker {
    async fn on_start(&self, run_id: i64, campaign_id: i64) -> Result<(), PipelineError> {
        self.job_run_repository.mark_running(run_id).await?;
        self.campaign_repository
            .mark_batch_started(campaign_id, run_id)
            .await?;

        logging::log_info(&format!(
            "Settlement run {} started for campaign {}",
            run_id, campaign_id
        ));

        Ok(())
    }

    async fn on_progress(&self, run_id: i64, stats: &RunStats) -> Result<(), PipelineError> {
        self.job_run_repository.update_progress(run_id, stats).await?;

        Ok(())
    }

    /// Record the run's terminal state and the campaign's aggregate counters.
    ///
    /// Both writes set absolute final values, so a repeated call for the same
    /// run rewrites the same state and stays idempotent.
    async fn on_finish(
        &self,
        run_id: i64,
        campaign_id: i64,
        status: JobStatus,
        stats: &RunStats,
        exit_message: Option<&str>,
    ) -> Result<(), PipelineError> {
        self.job_run_repository
            .finish(run_id, status, stats, exit_message)
            .await?;
        self.campaign_repository
            .mark_batch_finished(campaign_id, status, stats)
            .await?;

        match status {
            JobStatus::Completed => logging::log_info(&format!(
                "Run {} completed for campaign {} - processed: {}, success: {}, failed: {}, skipped: {}",
                run_id,
                campaign_id,
                stats.read,
                stats.written,
                stats.failed(),
                stats.skipped
            )),
            _ => logging::log_error(&format!(
                "Run {} ended with status {} for campaign {} - processed: {}, success: {}, failed: {}, skipped: {}",
                run_id,
                status.as_str(),
                campaign_id,
                stats.read,
                stats.written,
                stats.failed(),
                stats.skipped
            )),
        }

        Ok(())
    }
}
