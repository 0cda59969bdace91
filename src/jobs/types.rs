use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::Services;

/// Handed to a task for one run
#[derive(Clone)]
pub struct JobContext {
    /// Correlates the log lines of one run
    pub run_id: Uuid,
    pub services: Services,
    /// Cancelled when the scheduler shuts down
    pub cancel: CancellationToken,
}

/// Outcome of one scheduled run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Success,
    Failed,
    Timeout,
    /// The previous run of the same job was still going
    Skipped,
    /// Shutdown interrupted the run
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
            JobStatus::Timeout => "timeout",
            JobStatus::Skipped => "skipped",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait JobTask: Send + Sync + std::fmt::Debug {
    /// Also the key that keeps runs of the same task from overlapping
    fn name(&self) -> &'static str;

    /// Returns `Ok(false)` when the run stopped early on cancellation.
    async fn execute(&self, ctx: JobContext) -> AppResult<bool>;
}
