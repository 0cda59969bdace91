use std::sync::Arc;

use tracing::{debug, info, warn};

use super::gemini::GeminiProvider;
use super::openai::OpenAiCompatible;
use super::provider::{LlmProvider, Prompt};
use crate::config::LlmSettings;
use crate::error::{AppError, AppResult};

/// Text produced by the first provider that answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub provider: &'static str,
}

/// Tries providers in order until one returns non-empty text.
#[derive(Clone)]
pub struct LlmChain {
    providers: Vec<Arc<dyn LlmProvider>>,
}

impl LlmChain {
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>) -> Self {
        Self { providers }
    }

    /// Groq, then Gemini, then OpenAI
    pub fn from_settings(settings: &LlmSettings) -> Self {
        Self::new(vec![
            Arc::new(OpenAiCompatible::groq(settings)),
            Arc::new(GeminiProvider::new(settings)),
            Arc::new(OpenAiCompatible::openai(settings)),
        ])
    }

    /// Names of the providers that have a key
    pub fn configured(&self) -> Vec<&'static str> {
        self.providers
            .iter()
            .filter(|p| p.is_configured())
            .map(|p| p.name())
            .collect()
    }

    /// # Errors
    /// `Upstream` when no provider is configured or every configured one
    /// failed; the message lists each failure.
    pub async fn generate(&self, prompt: &Prompt) -> AppResult<Generation> {
        let mut failures = Vec::new();

        for provider in &self.providers {
            let name = provider.name();
            if !provider.is_configured() {
                debug!(provider = name, "Skipping LLM provider without API key");
                continue;
            }

            match provider.complete(prompt).await {
                Ok(text) if !text.trim().is_empty() => {
                    info!(provider = name, chars = text.len(), "LLM generation succeeded");
                    return Ok(Generation {
                        text,
                        provider: name,
                    });
                }
                Ok(_) => {
                    warn!(provider = name, "LLM provider returned empty text");
                    failures.push(format!("{}: empty response", name));
                }
                Err(err) => {
                    warn!(provider = name, error = %err, "LLM provider failed, trying next");
                    failures.push(format!("{}: {}", name, err));
                }
            }
        }

        let message = if failures.is_empty() {
            "no LLM provider is configured".to_string()
        } else {
            format!("all LLM providers failed ({})", failures.join("; "))
        };
        Err(AppError::upstream("llm", message))
    }
}
