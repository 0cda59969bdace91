use async_trait::async_trait;

use crate::error::AppResult;

/// One completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: Option<String>,
    pub user: String,
}

impl Prompt {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            system: None,
            user: user.into(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logs and API responses
    fn name(&self) -> &'static str;

    /// False when no API key is set; the chain skips such providers
    /// without a network call.
    fn is_configured(&self) -> bool;

    /// Raw completion text
    async fn complete(&self, prompt: &Prompt) -> AppResult<String>;
}
