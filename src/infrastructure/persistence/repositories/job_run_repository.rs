use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::domain::models::{JobStatus, RunStats};
use crate::infrastructure::persistence::entities::job_runs;
use crate::infrastructure::persistence::error::DbError;

/// Repository for settlement run bookkeeping
#[derive(Clone)]
pub struct JobRunRepository {
    conn: DatabaseConnection,
}

impl JobRunRepository {
    /// Create a new JobRunRepository
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create a run in the STARTING state and return its id
    pub async fn create(&self, campaign_id: i64) -> Result<i64, DbError> {
        let run = job_runs::ActiveModel {
            campaign_id: Set(campaign_id),
            status: Set(JobStatus::Starting.as_str().to_string()),
            read_count: Set(0),
            write_count: Set(0),
            skip_count: Set(0),
            started_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(run.id)
    }

    /// Get a run by its id
    pub async fn find_by_id(&self, run_id: i64) -> Result<Option<job_runs::Model>, DbError> {
        let result = job_runs::Entity::find_by_id(run_id).one(&self.conn).await?;

        Ok(result)
    }

    /// Move a run into the RUNNING state
    pub async fn mark_running(&self, run_id: i64) -> Result<(), DbError> {
        job_runs::ActiveModel {
            id: Set(run_id),
            status: Set(JobStatus::Running.as_str().to_string()),
            ..Default::default()
        }
        .update(&self.conn)
        .await?;

        Ok(())
    }

    /// Update a run's counters after a committed chunk
    pub async fn update_progress(&self, run_id: i64, stats: &RunStats) -> Result<(), DbError> {
        job_runs::ActiveModel {
            id: Set(run_id),
            read_count: Set(stats.read as i64),
            write_count: Set(stats.written as i64),
            skip_count: Set(stats.skipped as i64),
            ..Default::default()
        }
        .update(&self.conn)
        .await?;

        Ok(())
    }

    /// Record a run's terminal state
    pub async fn finish(
        &self,
        run_id: i64,
        status: JobStatus,
        stats: &RunStats,
        exit_message: Option<&str>,
    ) -> Result<(), DbError> {
        job_runs::ActiveModel {
            id: Set(run_id),
            status: Set(status.as_str().to_string()),
            read_count: Set(stats.read as i64),
            write_count: Set(stats.written as i64),
            skip_count: Set(stats.skipped as i64),
            finished_at: Set(Some(Utc::now().naive_utc())),
            exit_message: Set(exit_message.map(|m| m.to_string())),
            ..Default::default()
        }
        .update(&self.conn)
        .await?;

        Ok(())
    }
}
