//! OpenAI chat completions, also spoken by Groq.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::provider::{LlmProvider, Prompt};
use crate::config::{LlmSettings, ProviderSettings};
use crate::error::{AppError, AppResult};
use crate::external::client::HTTP_CLIENT;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Provider for any `/chat/completions` endpoint
pub struct OpenAiCompatible {
    name: &'static str,
    api_key: Option<String>,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl OpenAiCompatible {
    pub fn new(name: &'static str, provider: &ProviderSettings, llm: &LlmSettings) -> Self {
        Self {
            name,
            api_key: provider.api_key().map(str::to_string),
            base_url: provider.base_url.trim_end_matches('/').to_string(),
            model: provider.model.clone(),
            max_tokens: llm.max_tokens,
            temperature: llm.temperature,
            timeout: Duration::from_secs(llm.timeout),
        }
    }

    pub fn groq(llm: &LlmSettings) -> Self {
        Self::new("groq", &llm.groq, llm)
    }

    pub fn openai(llm: &LlmSettings) -> Self {
        Self::new("openai", &llm.openai, llm)
    }

    fn make_error(&self, message: impl Into<String>) -> AppError {
        AppError::upstream(self.name, message)
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatible {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, prompt: &Prompt) -> AppResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| self.make_error("API key is not configured"))?;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &prompt.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &prompt.user,
        });

        let body = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let resp = HTTP_CLIENT
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.make_error(format!("request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| self.make_error(format!("HTTP error: {}", e)))?;

        let data: ChatResponse = resp
            .json()
            .await
            .map_err(|e| self.make_error(format!("invalid JSON: {}", e)))?;

        data.choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .ok_or_else(|| self.make_error("response has no choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: &str, key: Option<&str>) -> LlmSettings {
        let mut llm = LlmSettings::default();
        llm.openai.base_url = base_url.to_string();
        llm.openai.api_key = key.map(str::to_string);
        llm
    }

    #[tokio::test]
    async fn test_chat_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(bearer_token("sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "Be brief"},
                    {"role": "user", "content": "Say hi"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "hi"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiCompatible::openai(&settings(&server.uri(), Some("sk-test")));
        let text = provider
            .complete(&Prompt::new("Say hi").with_system("Be brief"))
            .await
            .unwrap();

        assert_eq!(text, "hi");
    }

    #[tokio::test]
    async fn test_http_error_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let provider = OpenAiCompatible::openai(&settings(&server.uri(), Some("sk-test")));
        let err = provider.complete(&Prompt::new("x")).await.unwrap_err();

        match err {
            AppError::Upstream { service, message } => {
                assert_eq!(service, "openai");
                assert!(message.contains("HTTP error"));
            }
            other => panic!("Expected Upstream, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_key_is_unconfigured() {
        let provider = OpenAiCompatible::groq(&settings("http://unused", Some("sk")));
        assert!(!provider.is_configured());
        assert_eq!(provider.name(), "groq");

        let provider = OpenAiCompatible::openai(&settings("http://unused", Some("   ")));
        assert!(!provider.is_configured());
    }
}
