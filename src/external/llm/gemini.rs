//! Google Gemini `generateContent`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::provider::{LlmProvider, Prompt};
use crate::config::LlmSettings;
use crate::error::{AppError, AppResult};
use crate::external::client::HTTP_CLIENT;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

pub struct GeminiProvider {
    api_key: Option<String>,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl GeminiProvider {
    pub fn new(llm: &LlmSettings) -> Self {
        Self {
            api_key: llm.gemini.api_key().map(str::to_string),
            base_url: llm.gemini.base_url.trim_end_matches('/').to_string(),
            model: llm.gemini.model.clone(),
            max_tokens: llm.max_tokens,
            temperature: llm.temperature,
            timeout: Duration::from_secs(llm.timeout),
        }
    }

    fn make_error(message: impl Into<String>) -> AppError {
        AppError::upstream("gemini", message)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, prompt: &Prompt) -> AppResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Self::make_error("API key is not configured"))?;

        let body = GenerateRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: &prompt.user }],
            }],
            system_instruction: prompt.system.as_deref().map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            generation_config: GenerationConfig {
                max_output_tokens: self.max_tokens,
                temperature: self.temperature,
            },
        };

        let resp = HTTP_CLIENT
            .post(format!(
                "{}/models/{}:generateContent?key={}",
                self.base_url, self.model, api_key
            ))
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::make_error(format!("request failed: {}", e.without_url())))?
            .error_for_status()
            .map_err(|e| Self::make_error(format!("HTTP error: {}", e.without_url())))?;

        let data: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| Self::make_error(format!("invalid JSON: {}", e)))?;

        let text: String = data
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();

        if text.is_empty() {
            return Err(Self::make_error("response has no text candidates"));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: &str) -> LlmSettings {
        let mut llm = LlmSettings::default();
        llm.gemini.base_url = base_url.to_string();
        llm.gemini.api_key = Some("g-key".to_string());
        llm
    }

    #[tokio::test]
    async fn test_generate_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(query_param("key", "g-key"))
            .and(body_partial_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "Topic?"}]}],
                "systemInstruction": {"parts": [{"text": "You are terse"}]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Local "}, {"text": "SEO"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(&settings(&server.uri()));
        let text = provider
            .complete(&Prompt::new("Topic?").with_system("You are terse"))
            .await
            .unwrap();

        assert_eq!(text, "Local SEO");
    }

    #[tokio::test]
    async fn test_empty_candidates_fail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(&settings(&server.uri()));
        assert!(matches!(
            provider.complete(&Prompt::new("x")).await,
            Err(AppError::Upstream { .. })
        ));
    }
}
