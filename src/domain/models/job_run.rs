/// State machine of a settlement run.
///
/// `STARTING -> RUNNING -> {COMPLETED | FAILED | STOPPED}`; terminal states
/// are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Starting,
    Running,
    Completed,
    Failed,
    Stopped,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Starting => "STARTING",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Stopped => "STOPPED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "STARTING" => Some(JobStatus::Starting),
            "RUNNING" => Some(JobStatus::Running),
            "COMPLETED" => Some(JobStatus::Completed),
            "FAILED" => Some(JobStatus::Failed),
            "STOPPED" => Some(JobStatus::Stopped),
            _ => None,
        }
    }

    /// A run in an active state blocks new launches for its campaign
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Starting | JobStatus::Running)
    }
}

/// Per-run counters accumulated by the chunk engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Donations read from the pending selection
    pub read: u64,
    /// Donations settled successfully
    pub written: u64,
    /// Donations skipped on business errors
    pub skipped: u64,
}

impl RunStats {
    /// Donations that failed outright (retry exhaustion or unknown errors)
    pub fn failed(&self) -> u64 {
        self.read.saturating_sub(self.written + self.skipped)
    }

    /// Progress percentage: resolved items over read items
    pub fn percentage(&self) -> f64 {
        if self.read == 0 {
            return 0.0;
        }
        ((self.written + self.skipped) as f64 * 100.0) / self.read as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            JobStatus::Starting,
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::Failed,
            JobStatus::Stopped,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::parse("UNKNOWN"), None);
    }

    #[test]
    fn test_active_states() {
        assert!(JobStatus::Starting.is_active());
        assert!(JobStatus::Running.is_active());
        assert!(!JobStatus::Completed.is_active());
        assert!(!JobStatus::Failed.is_active());
        assert!(!JobStatus::Stopped.is_active());
    }

    #[test]
    fn test_failed_count_is_the_remainder() {
        let stats = RunStats {
            read: 10,
            written: 6,
            skipped: 1,
        };
        assert_eq!(stats.failed(), 3);
    }

    #[test]
    fn test_percentage() {
        let stats = RunStats {
            read: 4,
            written: 2,
            skipped: 1,
        };
        assert_eq!(stats.percentage(), 75.0);
        assert_eq!(RunStats::default().percentage(), 0.0);
    }
}
