use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::jobs::types::{JobContext, JobStatus, JobTask};
use crate::services::Services;

/// Runs tasks with a timeout, never two runs of the same task at once.
pub struct JobExecutor {
    services: Services,
    timeout: Duration,
    running: Arc<RwLock<HashSet<&'static str>>>,
    shutdown: CancellationToken,
}

impl JobExecutor {
    pub fn new(services: Services, timeout: Duration) -> Self {
        Self {
            services,
            timeout,
            running: Arc::new(RwLock::new(HashSet::new())),
            shutdown: CancellationToken::new(),
        }
    }

    /// Cancels the token handed to in-flight tasks.
    pub fn cancel_all(&self) {
        self.shutdown.cancel();
    }

    pub async fn execute(&self, task: Arc<dyn JobTask>) -> JobStatus {
        let name = task.name();
        if !self.running.write().await.insert(name) {
            warn!(job = name, "Previous run still in progress, skipping");
            return JobStatus::Skipped;
        }

        let status = self.run(task).await;
        self.running.write().await.remove(name);
        status
    }

    async fn run(&self, task: Arc<dyn JobTask>) -> JobStatus {
        let ctx = JobContext {
            run_id: Uuid::new_v4(),
            services: self.services.clone(),
            cancel: self.shutdown.child_token(),
        };
        let run_id = ctx.run_id;
        let start_time = Instant::now();

        info!(job = task.name(), %run_id, "Job started");
        let result = tokio::time::timeout(self.timeout, task.execute(ctx)).await;
        let duration_ms = start_time.elapsed().as_millis() as u64;

        let status = match result {
            Ok(Ok(true)) => JobStatus::Success,
            Ok(Ok(false)) => {
                warn!(job = task.name(), %run_id, "Job cancelled");
                JobStatus::Cancelled
            }
            Ok(Err(e)) => {
                error!(job = task.name(), %run_id, error = %e, "Job failed");
                JobStatus::Failed
            }
            Err(_) => {
                error!(
                    job = task.name(),
                    %run_id,
                    timeout_secs = self.timeout.as_secs(),
                    "Job timed out"
                );
                JobStatus::Timeout
            }
        };

        info!(job = task.name(), %run_id, %status, duration_ms, "Job finished");
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::db::lazy_pool;
    use crate::error::{AppError, AppResult};
    use crate::repositories::Repositories;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct Sleepy {
        secs: u64,
        fail: bool,
    }

    #[async_trait]
    impl JobTask for Sleepy {
        fn name(&self) -> &'static str {
            "sleepy"
        }

        async fn execute(&self, ctx: JobContext) -> AppResult<bool> {
            tokio::select! {
                _ = ctx.cancel.cancelled() => return Ok(false),
                _ = tokio::time::sleep(Duration::from_secs(self.secs)) => {}
            }
            if self.fail {
                return Err(AppError::BadRequest {
                    message: "nope".to_string(),
                });
            }
            Ok(true)
        }
    }

    fn executor(timeout_secs: u64) -> Arc<JobExecutor> {
        let services = Services::new(Repositories::new(lazy_pool()), &Settings::default());
        Arc::new(JobExecutor::new(services, Duration::from_secs(timeout_secs)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_statuses() {
        let executor = executor(10);

        let ok = Arc::new(Sleepy { secs: 1, fail: false });
        assert_eq!(executor.execute(ok).await, JobStatus::Success);

        let failing = Arc::new(Sleepy { secs: 1, fail: true });
        assert_eq!(executor.execute(failing).await, JobStatus::Failed);

        let slow = Arc::new(Sleepy { secs: 60, fail: false });
        assert_eq!(executor.execute(slow).await, JobStatus::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_run_is_skipped() {
        let executor = executor(30);

        let first = {
            let executor = Arc::clone(&executor);
            tokio::spawn(async move {
                executor
                    .execute(Arc::new(Sleepy { secs: 5, fail: false }))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;

        let second = executor
            .execute(Arc::new(Sleepy { secs: 5, fail: false }))
            .await;
        assert_eq!(second, JobStatus::Skipped);
        assert_eq!(first.await.unwrap(), JobStatus::Success);

        // The slot is free again
        let third = executor
            .execute(Arc::new(Sleepy { secs: 1, fail: false }))
            .await;
        assert_eq!(third, JobStatus::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_interrupts_running_task() {
        let executor = executor(30);

        let run = {
            let executor = Arc::clone(&executor);
            tokio::spawn(async move {
                executor
                    .execute(Arc::new(Sleepy { secs: 20, fail: false }))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        executor.cancel_all();

        assert_eq!(run.await.unwrap(), JobStatus::Cancelled);
    }
}
