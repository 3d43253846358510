//! Chunk-oriented settlement engine.
//!
//! Reads pending donations page by page, drives the transfer orchestrator
//! per item with a bounded retry loop, counts skippable business failures
//! against a skip budget, and commits each page's results atomically. A
//! cancellation request takes effect only between chunks; on-chain effects
//! of a chunk in flight are never abandoned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::time::{sleep, Duration};

use crate::application::pipeline::traits::{
    DonationSource, DonationTransfer, ResultSink, RunTracker,
};
use crate::domain::errors::PipelineError;
use crate::domain::models::{JobStatus, PendingDonation, RunStats, TransferResult};
use crate::domain::services::{FaultAction, FaultPolicy};
use crate::utils::logging;

/// Per-run parameters, constructed fresh for each launch
#[derive(Debug, Clone, Copy)]
pub struct RunConfig {
    pub run_id: i64,
    pub campaign_id: i64,
    pub page_size: u64,
}

struct RunOutcome {
    status: JobStatus,
    exit_message: Option<String>,
}

/// Drives one settlement run to a terminal state
pub struct ChunkEngine {
    source: Arc<dyn DonationSource>,
    transfer: Arc<dyn DonationTransfer>,
    sink: Arc<dyn ResultSink>,
    tracker: Arc<dyn RunTracker>,
    policy: FaultPolicy,
    run: RunConfig,
    cancel: Arc<AtomicBool>,
}

impl ChunkEngine {
    pub fn new(
        source: Arc<dyn DonationSource>,
        transfer: Arc<dyn DonationTransfer>,
        sink: Arc<dyn ResultSink>,
        tracker: Arc<dyn RunTracker>,
        policy: FaultPolicy,
        run: RunConfig,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source,
            transfer,
            sink,
            tracker,
            policy,
            run,
            cancel,
        }
    }

    /// Process the run to completion and report its terminal status.
    ///
    /// Engine-level failures (source, sink, tracker) end the run as FAILED;
    /// they are recorded on the run rather than propagated.
    pub async fn run(&self) -> (JobStatus, RunStats) {
        let mut stats = RunStats::default();

        if let Err(e) = self
            .tracker
            .on_start(self.run.run_id, self.run.campaign_id)
            .await
        {
            logging::log_error(&format!(
                "Run {} failed to start: {}",
                self.run.run_id, e
            ));
            return (JobStatus::Failed, stats);
        }

        let outcome = match self.process_all(&mut stats).await {
            Ok(outcome) => outcome,
            Err(e) => {
                logging::log_error(&format!("Run {} aborted: {}", self.run.run_id, e));
                RunOutcome {
                    status: JobStatus::Failed,
                    exit_message: Some(e.to_string()),
                }
            }
        };

        if let Err(e) = self
            .tracker
            .on_finish(
                self.run.run_id,
                self.run.campaign_id,
                outcome.status,
                &stats,
                outcome.exit_message.as_deref(),
            )
            .await
        {
            logging::log_error(&format!(
                "Run {} finished but its state could not be recorded: {}",
                self.run.run_id, e
            ));
        }

        (outcome.status, stats)
    }

    async fn process_all(&self, stats: &mut RunStats) -> Result<RunOutcome, PipelineError> {
        loop {
            // Cancellation takes effect only between chunks
            if self.cancel.load(Ordering::SeqCst) {
                logging::log_warning(&format!(
                    "Run {} stopped on request after {} donations",
                    self.run.run_id, stats.read
                ));
                return Ok(RunOutcome {
                    status: JobStatus::Stopped,
                    exit_message: Some("Stop requested".to_string()),
                });
            }

            let page = self
                .source
                .fetch_pending(self.run.campaign_id, self.run.page_size)
                .await?;

            if page.is_empty() {
                logging::log_info(&format!(
                    "Run {} completed: read {}, written {}, skipped {}",
                    self.run.run_id, stats.read, stats.written, stats.skipped
                ));
                return Ok(RunOutcome {
                    status: JobStatus::Completed,
                    exit_message: None,
                });
            }

            stats.read += page.len() as u64;
            let mut chunk = Vec::with_capacity(page.len());

            for donation in &page {
                let result = self.process_item(donation).await?;

                if result.is_success() {
                    stats.written += 1;
                } else if result
                    .failure_kind()
                    .map(|k| k.is_skippable())
                    .unwrap_or(false)
                {
                    stats.skipped += 1;
                    if stats.skipped > self.policy.skip_limit {
                        // Abort without committing the chunk in flight
                        return Ok(RunOutcome {
                            status: JobStatus::Failed,
                            exit_message: Some(format!(
                                "Skip limit of {} exceeded",
                                self.policy.skip_limit
                            )),
                        });
                    }
                }

                chunk.push(result);
            }

            // One transaction per page: all of the chunk's results or none
            self.sink.write_chunk(&chunk).await?;
            self.tracker.on_progress(self.run.run_id, stats).await?;
        }
    }

    /// Attempt one donation, retrying transient failures up to the limit.
    ///
    /// The item is attempted `retry_limit + 1` times before its last error
    /// is converted into a failure result.
    async fn process_item(
        &self,
        donation: &PendingDonation,
    ) -> Result<TransferResult, PipelineError> {
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            match self.transfer.transfer(donation).await {
                Ok(result) => return Ok(result),
                Err(error) => match self.policy.classify(&error) {
                    FaultAction::Retry => {
                        if attempts < self.policy.retry_limit {
                            attempts += 1;
                            logging::log_warning(&format!(
                                "Donation {} attempt {}/{} failed: {}. Retrying",
                                donation.id, attempts, self.policy.retry_limit, error
                            ));
                            if self.policy.retry_delay_ms > 0 {
                                sleep(Duration::from_millis(self.policy.retry_delay_ms)).await;
                            }
                            continue;
                        }

                        logging::log_error(&format!(
                            "Donation {} failed after {} attempts: {}",
                            donation.id,
                            attempts + 1,
                            error
                        ));
                        let elapsed_ms = started.elapsed().as_millis() as u64;
                        return Ok(TransferResult::failure(
                            donation.id,
                            error.to_string(),
                            error.failure_kind(),
                            elapsed_ms,
                        ));
                    }
                    FaultAction::Skip => {
                        logging::log_warning(&format!(
                            "Donation {} skipped: {}",
                            donation.id, error
                        ));
                        let elapsed_ms = started.elapsed().as_millis() as u64;
                        return Ok(TransferResult::failure(
                            donation.id,
                            error.to_string(),
                            error.failure_kind(),
                            elapsed_ms,
                        ));
                    }
                    FaultAction::Propagate => {
                        return Err(PipelineError::Engine(error.to_string()));
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use crate::domain::errors::{ChainStep, TransferError};
    use crate::domain::models::FailureKind;

    /// In-memory donation store acting as both source and sink; committed
    /// items leave the pending set the way status updates do in the database
    struct InMemoryStore {
        pending: Mutex<Vec<PendingDonation>>,
        committed: Mutex<Vec<TransferResult>>,
        commits: Mutex<u64>,
    }

    impl InMemoryStore {
        fn with_donations(count: i64) -> Self {
            let pending = (1..=count)
                .map(|id| PendingDonation {
                    id,
                    campaign_id: 10,
                    user_id: Some(id),
                    amount: Decimal::from(1000 * id),
                    paid_at: None,
                })
                .collect();
            Self {
                pending: Mutex::new(pending),
                committed: Mutex::new(Vec::new()),
                commits: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl DonationSource for InMemoryStore {
        async fn fetch_pending(
            &self,
            _campaign_id: i64,
            page_size: u64,
        ) -> Result<Vec<PendingDonation>, PipelineError> {
            let pending = self.pending.lock().unwrap();
            Ok(pending.iter().take(page_size as usize).cloned().collect())
        }

        async fn count_pending(&self, _campaign_id: i64) -> Result<u64, PipelineError> {
            Ok(self.pending.lock().unwrap().len() as u64)
        }
    }

    #[async_trait]
    impl ResultSink for InMemoryStore {
        async fn write_chunk(&self, results: &[TransferResult]) -> Result<(), PipelineError> {
            let mut pending = self.pending.lock().unwrap();
            pending.retain(|d| !results.iter().any(|r| r.donation_id == d.id));
            self.committed.lock().unwrap().extend_from_slice(results);
            *self.commits.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[derive(Clone, Copy)]
    enum Behavior {
        Succeed,
        NetworkError,
        NoWallet,
        UnknownFailure,
    }

    /// Transfer double scripted per donation id; counts attempts
    struct ScriptedTransfer {
        behaviors: HashMap<i64, Behavior>,
        attempts: Mutex<HashMap<i64, u32>>,
    }

    impl ScriptedTransfer {
        fn all_succeed() -> Self {
            Self {
                behaviors: HashMap::new(),
                attempts: Mutex::new(HashMap::new()),
            }
        }

        fn with(mut self, donation_id: i64, behavior: Behavior) -> Self {
            self.behaviors.insert(donation_id, behavior);
            self
        }

        fn attempts_for(&self, donation_id: i64) -> u32 {
            self.attempts
                .lock()
                .unwrap()
                .get(&donation_id)
                .copied()
                .unwrap_or(0)
        }
    }

    #[async_trait]
    impl DonationTransfer for ScriptedTransfer {
        async fn transfer(
            &self,
            donation: &PendingDonation,
        ) -> Result<TransferResult, TransferError> {
            *self
                .attempts
                .lock()
                .unwrap()
                .entry(donation.id)
                .or_insert(0) += 1;

            match self
                .behaviors
                .get(&donation.id)
                .copied()
                .unwrap_or(Behavior::Succeed)
            {
                Behavior::Succeed => Ok(TransferResult::success(
                    donation.id,
                    format!("0xtx{}", donation.id),
                    "0xd0".to_string(),
                    "0xb1".to_string(),
                    donation.amount,
                    Decimal::new(5, 3),
                    5,
                )),
                Behavior::NetworkError => Err(TransferError::ChainNetwork {
                    step: ChainStep::GasTransfer,
                    message: "connection reset".to_string(),
                }),
                Behavior::NoWallet => Err(TransferError::WalletNotFound {
                    donation_id: donation.id,
                    user_id: donation.user_id,
                    message: "no primary wallet".to_string(),
                }),
                Behavior::UnknownFailure => Ok(TransferResult::failure(
                    donation.id,
                    "something odd".to_string(),
                    FailureKind::Unknown,
                    5,
                )),
            }
        }
    }

    /// Records lifecycle callbacks
    #[derive(Default)]
    struct RecordingTracker {
        started: Mutex<Vec<i64>>,
        progress: Mutex<Vec<RunStats>>,
        finished: Mutex<Vec<(JobStatus, RunStats)>>,
    }

    #[async_trait]
    impl RunTracker for RecordingTracker {
        async fn on_start(&self, run_id: i64, _campaign_id: i64) -> Result<(), PipelineError> {
            self.started.lock().unwrap().push(run_id);
            Ok(())
        }

        async fn on_progress(
            &self,
            _run_id: i64,
            stats: &RunStats,
        ) -> Result<(), PipelineError> {
            self.progress.lock().unwrap().push(*stats);
            Ok(())
        }

        async fn on_finish(
            &self,
            _run_id: i64,
            _campaign_id: i64,
            status: JobStatus,
            stats: &RunStats,
            _exit_message: Option<&str>,
        ) -> Result<(), PipelineError> {
            self.finished.lock().unwrap().push((status, *stats));
            Ok(())
        }
    }

    fn policy(retry_limit: u32, skip_limit: u64) -> FaultPolicy {
        FaultPolicy {
            retry_limit,
            skip_limit,
            retry_delay_ms: 0,
        }
    }

    fn engine(
        store: Arc<InMemoryStore>,
        transfer: Arc<ScriptedTransfer>,
        tracker: Arc<RecordingTracker>,
        policy: FaultPolicy,
        page_size: u64,
    ) -> (ChunkEngine, Arc<AtomicBool>) {
        let cancel = Arc::new(AtomicBool::new(false));
        let engine = ChunkEngine::new(
            store.clone(),
            transfer,
            store,
            tracker,
            policy,
            RunConfig {
                run_id: 1,
                campaign_id: 10,
                page_size,
            },
            cancel.clone(),
        );
        (engine, cancel)
    }

    #[tokio::test]
    async fn test_run_settles_all_donations() {
        let store = Arc::new(InMemoryStore::with_donations(3));
        let transfer = Arc::new(ScriptedTransfer::all_succeed());
        let tracker = Arc::new(RecordingTracker::default());
        let (engine, _) = engine(store.clone(), transfer, tracker.clone(), policy(3, 1000), 100);

        let (status, stats) = engine.run().await;

        assert_eq!(status, JobStatus::Completed);
        assert_eq!(stats, RunStats { read: 3, written: 3, skipped: 0 });
        assert_eq!(store.committed.lock().unwrap().len(), 3);
        assert!(store.pending.lock().unwrap().is_empty());
        assert_eq!(
            tracker.finished.lock().unwrap()[0],
            (JobStatus::Completed, stats)
        );
    }

    #[tokio::test]
    async fn test_second_run_processes_nothing() {
        let store = Arc::new(InMemoryStore::with_donations(2));
        let transfer = Arc::new(ScriptedTransfer::all_succeed());
        let tracker = Arc::new(RecordingTracker::default());
        let (first, _) = engine(
            store.clone(),
            transfer.clone(),
            tracker.clone(),
            policy(3, 1000),
            100,
        );
        first.run().await;

        let (second, _) = engine(store.clone(), transfer, tracker, policy(3, 1000), 100);
        let (status, stats) = second.run().await;

        assert_eq!(status, JobStatus::Completed);
        assert_eq!(stats, RunStats::default());
    }

    #[tokio::test]
    async fn test_missing_wallet_is_skipped_and_recorded_failed() {
        let store = Arc::new(InMemoryStore::with_donations(3));
        let transfer = Arc::new(ScriptedTransfer::all_succeed().with(2, Behavior::NoWallet));
        let tracker = Arc::new(RecordingTracker::default());
        let (engine, _) = engine(store.clone(), transfer, tracker, policy(3, 1000), 100);

        let (status, stats) = engine.run().await;

        assert_eq!(status, JobStatus::Completed);
        assert_eq!(stats, RunStats { read: 3, written: 2, skipped: 1 });

        let committed = store.committed.lock().unwrap();
        let failed = committed.iter().find(|r| r.donation_id == 2).unwrap();
        assert_eq!(failed.failure_kind(), Some(FailureKind::WalletNotFound));
    }

    #[tokio::test]
    async fn test_transient_errors_retry_then_record_failure() {
        let store = Arc::new(InMemoryStore::with_donations(2));
        let transfer = Arc::new(ScriptedTransfer::all_succeed().with(1, Behavior::NetworkError));
        let tracker = Arc::new(RecordingTracker::default());
        let (engine, _) =
            engine(store.clone(), transfer.clone(), tracker, policy(3, 1000), 100);

        let (status, stats) = engine.run().await;

        // Initial attempt + 3 retries
        assert_eq!(transfer.attempts_for(1), 4);
        assert_eq!(transfer.attempts_for(2), 1);

        // Processing continued past the failed donation
        assert_eq!(status, JobStatus::Completed);
        assert_eq!(stats, RunStats { read: 2, written: 1, skipped: 0 });
        assert_eq!(stats.failed(), 1);

        let committed = store.committed.lock().unwrap();
        let failed = committed.iter().find(|r| r.donation_id == 1).unwrap();
        assert_eq!(
            failed.failure_kind(),
            Some(FailureKind::ChainNetwork(ChainStep::GasTransfer))
        );
    }

    #[tokio::test]
    async fn test_exceeding_skip_limit_fails_run_without_commit() {
        let store = Arc::new(InMemoryStore::with_donations(2));
        let transfer = Arc::new(
            ScriptedTransfer::all_succeed()
                .with(1, Behavior::NoWallet)
                .with(2, Behavior::NoWallet),
        );
        let tracker = Arc::new(RecordingTracker::default());
        let (engine, _) = engine(store.clone(), transfer, tracker, policy(3, 1), 100);

        let (status, stats) = engine.run().await;

        assert_eq!(status, JobStatus::Failed);
        assert_eq!(stats.skipped, 2);
        // The aborting chunk is not committed
        assert!(store.committed.lock().unwrap().is_empty());
        assert_eq!(store.pending.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_skip_count_exactly_at_limit_completes() {
        let store = Arc::new(InMemoryStore::with_donations(2));
        let transfer = Arc::new(
            ScriptedTransfer::all_succeed()
                .with(1, Behavior::NoWallet)
                .with(2, Behavior::NoWallet),
        );
        let tracker = Arc::new(RecordingTracker::default());
        let (engine, _) = engine(store.clone(), transfer, tracker, policy(3, 2), 100);

        let (status, stats) = engine.run().await;

        assert_eq!(status, JobStatus::Completed);
        assert_eq!(stats, RunStats { read: 2, written: 0, skipped: 2 });
    }

    #[tokio::test]
    async fn test_unknown_failures_do_not_consume_skip_budget() {
        let store = Arc::new(InMemoryStore::with_donations(2));
        let transfer = Arc::new(
            ScriptedTransfer::all_succeed()
                .with(1, Behavior::UnknownFailure)
                .with(2, Behavior::UnknownFailure),
        );
        let tracker = Arc::new(RecordingTracker::default());
        // Skip limit of zero: any skip would abort the run
        let (engine, _) = engine(store.clone(), transfer, tracker, policy(3, 0), 100);

        let (status, stats) = engine.run().await;

        assert_eq!(status, JobStatus::Completed);
        assert_eq!(stats, RunStats { read: 2, written: 0, skipped: 0 });
        assert_eq!(stats.failed(), 2);
    }

    #[tokio::test]
    async fn test_stop_request_halts_before_next_chunk() {
        let store = Arc::new(InMemoryStore::with_donations(3));
        let transfer = Arc::new(ScriptedTransfer::all_succeed());
        let tracker = Arc::new(RecordingTracker::default());
        let (engine, cancel) = engine(store.clone(), transfer, tracker, policy(3, 1000), 100);

        cancel.store(true, Ordering::SeqCst);
        let (status, stats) = engine.run().await;

        assert_eq!(status, JobStatus::Stopped);
        assert_eq!(stats, RunStats::default());
        assert!(store.committed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_results_are_committed_per_page() {
        let store = Arc::new(InMemoryStore::with_donations(5));
        let transfer = Arc::new(ScriptedTransfer::all_succeed());
        let tracker = Arc::new(RecordingTracker::default());
        let (engine, _) = engine(store.clone(), transfer, tracker.clone(), policy(3, 1000), 2);

        let (status, stats) = engine.run().await;

        assert_eq!(status, JobStatus::Completed);
        assert_eq!(stats, RunStats { read: 5, written: 5, skipped: 0 });
        // Pages of 2, 2 and 1
        assert_eq!(*store.commits.lock().unwrap(), 3);
        assert_eq!(tracker.progress.lock().unwrap().len(), 3);
    }
}
