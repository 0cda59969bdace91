use async_trait::async_trait;
use tracing::info;

use crate::error::AppResult;
use crate::jobs::types::{JobContext, JobTask};

/// Drafts one AI-written post per run from the topic rotation.
#[derive(Debug, Clone)]
pub struct DailyPostTask {
    topics: Vec<String>,
}

impl DailyPostTask {
    pub fn new(topics: Vec<String>) -> Self {
        Self { topics }
    }
}

#[async_trait]
impl JobTask for DailyPostTask {
    fn name(&self) -> &'static str {
        "daily_post"
    }

    async fn execute(&self, ctx: JobContext) -> AppResult<bool> {
        let generate = ctx.services.content.daily_post(None, &self.topics);

        let post = tokio::select! {
            _ = ctx.cancel.cancelled() => return Ok(false),
            post = generate => post?,
        };

        info!(
            run_id = %ctx.run_id,
            post_id = post.id,
            slug = %post.slug,
            topics = self.topics.len(),
            "Daily post drafted"
        );
        Ok(true)
    }
}
