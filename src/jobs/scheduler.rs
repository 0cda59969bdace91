use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler as TokioCronScheduler};
use tracing::info;

use crate::config::Settings;
use crate::error::{AppError, AppResult};
use crate::jobs::executor::JobExecutor;
use crate::jobs::tasks::DailyPostTask;
use crate::jobs::types::JobTask;
use crate::services::Services;

/// Cron front end for the [`JobExecutor`]
pub struct JobScheduler {
    scheduler: Arc<Mutex<TokioCronScheduler>>,
    executor: Arc<JobExecutor>,
}

impl JobScheduler {
    pub async fn new(services: Services, timeout: Duration) -> AppResult<Self> {
        let scheduler = TokioCronScheduler::new()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;

        Ok(Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            executor: Arc::new(JobExecutor::new(services, timeout)),
        })
    }

    /// Scheduler with every configured job registered, not yet started.
    pub async fn from_settings(services: Services, settings: &Settings) -> AppResult<Self> {
        let scheduler =
            Self::new(services, Duration::from_secs(settings.jobs.job_timeout)).await?;

        scheduler
            .schedule(
                &settings.jobs.daily_post_cron,
                Arc::new(DailyPostTask::new(settings.site.daily_topics.clone())),
            )
            .await?;

        Ok(scheduler)
    }

    pub async fn start(&self) -> AppResult<()> {
        self.scheduler
            .lock()
            .await
            .start()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;
        info!("Job scheduler started");
        Ok(())
    }

    /// Stop the scheduler gracefully
    pub async fn stop(&self) -> AppResult<()> {
        self.executor.cancel_all();
        self.scheduler
            .lock()
            .await
            .shutdown()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;
        Ok(())
    }

    /// Schedule a single task
    pub async fn schedule(&self, cron: &str, task: Arc<dyn JobTask>) -> AppResult<()> {
        let executor = Arc::clone(&self.executor);
        let name = task.name();

        let cron_job = Job::new_async(cron, move |_uuid, _lock| {
            let executor = Arc::clone(&executor);
            let task = Arc::clone(&task);

            Box::pin(async move {
                executor.execute(task).await;
            })
        })
        .map_err(|e| AppError::Validation {
            field: "cron".to_string(),
            reason: format!("Invalid cron expression '{}': {}", cron, e),
        })?;

        self.scheduler
            .lock()
            .await
            .add(cron_job)
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;

        info!(job = name, cron, "Job scheduled");
        Ok(())
    }
}
