//! Run launching, status reporting and stop requests.
//!
//! The launcher enforces the close preconditions, creates the run record,
//! and spawns the chunk engine on its own task. At most one run may be
//! active per campaign; the check is against the campaign's persisted batch
//! status, not an in-process lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy::signers::local::PrivateKeySigner;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::application::pipeline::engine::{ChunkEngine, RunConfig};
use crate::application::pipeline::lifecycle::JobLifecycleTracker;
use crate::application::pipeline::processor::TransferOrchestrator;
use crate::config::AppConfig;
use crate::domain::errors::PipelineError;
use crate::domain::models::{CampaignRef, CampaignStatus, JobStatus, RunStats};
use crate::domain::services::wallet_service::parse_signer;
use crate::domain::services::{FaultPolicy, WalletService};
use crate::infrastructure::blockchain::{ChainOps, EvmChainClient};
use crate::infrastructure::persistence::entities::campaigns;
use crate::infrastructure::persistence::repositories::{
    CampaignRepository, DonationRepository, JobRunRepository, WalletRepository,
};
use crate::infrastructure::persistence::DbPool;
use crate::utils::logging;

/// Response to a campaign-close request
#[derive(Debug, Clone, Serialize)]
pub struct CloseOutcome {
    pub campaign_id: i64,
    pub campaign_title: String,
    pub run_id: Option<i64>,
    pub total_donations: u64,
    pub batch_status: String,
    pub message: String,
}

/// Point-in-time view of a settlement run
#[derive(Debug, Clone, Serialize)]
pub struct RunStatusView {
    pub run_id: i64,
    pub campaign_id: i64,
    pub status: String,
    pub total_processed: u64,
    pub successful_transfers: u64,
    pub failed_transfers: u64,
    pub skipped_count: u64,
    pub progress_percentage: f64,
    pub exit_message: Option<String>,
    pub running: bool,
}

/// Launches settlement runs and answers status queries
pub struct PipelineLauncher {
    config: AppConfig,
    donation_repository: DonationRepository,
    campaign_repository: CampaignRepository,
    job_run_repository: JobRunRepository,
    wallet_service: Arc<WalletService>,
    chain: Arc<dyn ChainOps>,
    platform_signer: PrivateKeySigner,
    /// Cancellation flags of the runs this process has launched
    runs: Mutex<HashMap<i64, Arc<AtomicBool>>>,
}

impl PipelineLauncher {
    pub fn new(config: AppConfig, db_pool: &DbPool) -> Result<Self, PipelineError> {
        let conn = db_pool.get_connection().clone();

        let chain = EvmChainClient::new(&config.chain)
            .map_err(|e| PipelineError::ConfigError(e.to_string()))?;

        let platform_signer = parse_signer(&config.wallet.platform_private_key)
            .map_err(|e| PipelineError::ConfigError(format!("Platform wallet key: {}", e)))?;

        let wallet_service = Arc::new(WalletService::new(
            WalletRepository::new(conn.clone()),
            config.wallet.master_password.clone(),
        ));

        Ok(Self {
            config,
            donation_repository: DonationRepository::new(conn.clone()),
            campaign_repository: CampaignRepository::new(conn.clone()),
            job_run_repository: JobRunRepository::new(conn),
            wallet_service,
            chain: Arc::new(chain),
            platform_signer,
            runs: Mutex::new(HashMap::new()),
        })
    }

    /// Close a campaign and start its settlement run.
    ///
    /// With nothing pending the campaign is still closed, but no run starts.
    pub async fn close_campaign(&self, campaign_id: i64) -> Result<CloseOutcome, PipelineError> {
        let campaign = self
            .campaign_repository
            .find_by_id(campaign_id)
            .await?
            .ok_or_else(|| {
                PipelineError::NotFound(format!("Campaign {} not found", campaign_id))
            })?;

        self.validate_for_closing(&campaign).await?;

        self.campaign_repository.mark_closed(campaign_id).await?;

        let pending = self.donation_repository.count_pending(campaign_id).await?;
        if pending == 0 {
            logging::log_warning(&format!(
                "Campaign {} closed with no donations awaiting settlement",
                campaign_id
            ));
            return Ok(CloseOutcome {
                campaign_id,
                campaign_title: campaign.title,
                run_id: None,
                total_donations: 0,
                batch_status: "NO_DONATIONS".to_string(),
                message: "Campaign closed; no donations awaiting settlement".to_string(),
            });
        }

        let run_id = self.job_run_repository.create(campaign_id).await?;
        let cancel = Arc::new(AtomicBool::new(false));
        let engine = self.build_engine(&campaign, run_id, cancel.clone());

        tokio::spawn(async move {
            let (status, stats) = engine.run().await;
            logging::log_info(&format!(
                "Run {} finished with status {} (read {}, written {}, skipped {})",
                run_id,
                status.as_str(),
                stats.read,
                stats.written,
                stats.skipped
            ));
        });

        self.runs.lock().await.insert(run_id, cancel);

        logging::log_info(&format!(
            "Campaign {} closed; settlement run {} started for {} donations",
            campaign_id, run_id, pending
        ));

        Ok(CloseOutcome {
            campaign_id,
            campaign_title: campaign.title,
            run_id: Some(run_id),
            total_donations: pending,
            batch_status: JobStatus::Starting.as_str().to_string(),
            message: "Campaign closed; settlement run started".to_string(),
        })
    }

    /// Current status, counters and progress of a run
    pub async fn run_status(&self, run_id: i64) -> Result<RunStatusView, PipelineError> {
        let run = self
            .job_run_repository
            .find_by_id(run_id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("Run {} not found", run_id)))?;

        let status = JobStatus::parse(&run.status).unwrap_or(JobStatus::Failed);
        let stats = RunStats {
            read: run.read_count as u64,
            written: run.write_count as u64,
            skipped: run.skip_count as u64,
        };

        Ok(RunStatusView {
            run_id: run.id,
            campaign_id: run.campaign_id,
            status: status.as_str().to_string(),
            total_processed: stats.read,
            successful_transfers: stats.written,
            failed_transfers: stats.failed(),
            skipped_count: stats.skipped,
            progress_percentage: stats.percentage(),
            exit_message: run.exit_message,
            running: status.is_active(),
        })
    }

    /// Ask a run to stop; honored between chunks, never mid-chunk.
    ///
    /// Returns false when the run is not held by this process (already
    /// finished, or started by another instance).
    pub async fn request_stop(&self, run_id: i64) -> Result<bool, PipelineError> {
        self.job_run_repository
            .find_by_id(run_id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("Run {} not found", run_id)))?;

        let runs = self.runs.lock().await;
        match runs.get(&run_id) {
            Some(cancel) => {
                cancel.store(true, Ordering::SeqCst);
                logging::log_warning(&format!("Stop requested for run {}", run_id));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Request every run held by this process to stop
    pub async fn stop_all(&self) {
        let runs = self.runs.lock().await;
        for (run_id, cancel) in runs.iter() {
            cancel.store(true, Ordering::SeqCst);
            logging::log_warning(&format!("Stop requested for run {}", run_id));
        }
    }

    async fn validate_for_closing(
        &self,
        campaign: &campaigns::Model,
    ) -> Result<(), PipelineError> {
        match CampaignStatus::parse(&campaign.status) {
            Some(CampaignStatus::Completed) => {
                return Err(PipelineError::Validation(
                    "Campaign is already closed".to_string(),
                ));
            }
            Some(CampaignStatus::Cancelled) => {
                return Err(PipelineError::Validation(
                    "A cancelled campaign cannot be closed".to_string(),
                ));
            }
            _ => {}
        }

        if campaign.deleted_at.is_some() {
            return Err(PipelineError::Validation(
                "A deleted campaign cannot be closed".to_string(),
            ));
        }

        let batch_active = campaign
            .batch_status
            .as_deref()
            .and_then(JobStatus::parse)
            .map(|s| s.is_active())
            .unwrap_or(false);
        if batch_active {
            return Err(PipelineError::Validation(
                "A settlement run is already active for this campaign".to_string(),
            ));
        }

        let unresolved = self
            .donation_repository
            .count_unresolved_fraud_reviews(campaign.id)
            .await?;
        if unresolved > 0 {
            return Err(PipelineError::Validation(format!(
                "{} donations have not cleared fraud review; resolve them before closing",
                unresolved
            )));
        }

        Ok(())
    }

    fn build_engine(
        &self,
        campaign: &campaigns::Model,
        run_id: i64,
        cancel: Arc<AtomicBool>,
    ) -> ChunkEngine {
        let campaign_ref = CampaignRef {
            id: campaign.id,
            beneficiary_address: campaign.beneficiary_address.clone(),
            contract_address: campaign.contract_address.clone(),
            chain_campaign_id: campaign.chain_campaign_id,
        };

        let orchestrator = TransferOrchestrator::new(
            campaign_ref,
            self.wallet_service.clone(),
            self.chain.clone(),
            self.platform_signer.clone(),
            self.config.chain.max_gas_price_gwei,
            self.config.chain.gas_limit,
        );

        let tracker = JobLifecycleTracker::new(
            self.campaign_repository.clone(),
            self.job_run_repository.clone(),
        );

        let policy = FaultPolicy {
            retry_limit: self.config.batch.retry_limit,
            skip_limit: self.config.batch.skip_limit,
            retry_delay_ms: self.config.batch.retry_delay_ms,
        };

        ChunkEngine::new(
            Arc::new(self.donation_repository.clone()),
            Arc::new(orchestrator),
            Arc::new(self.donation_repository.clone()),
            Arc::new(tracker),
            policy,
            RunConfig {
                run_id,
                campaign_id: campaign.id,
                page_size: self.config.batch.chunk_size,
            },
            cancel,
        )
    }
}
