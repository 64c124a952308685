//! Google Gemini `generateContent` adapter.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use aiportal_core::config::schema::ProviderConfig;
use aiportal_core::utils::join_url;
use aiportal_core::{CanonicalChatRequest, CanonicalChatResult, ProviderTag};

use crate::error::ProviderError;
use crate::registry::{spec_for, static_models};
use crate::traits::ChatProvider;
use crate::transport::post_json;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Instruction<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct Instruction<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

/// Adapter for `POST /v1beta/models/{model}:generateContent`.
pub struct GoogleProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    timeout: Duration,
}

impl GoogleProvider {
    pub fn new(config: &ProviderConfig, client: reqwest::Client, timeout: Duration) -> Self {
        let api_base = config
            .api_base
            .clone()
            .filter(|b| !b.trim().is_empty())
            .or_else(|| spec_for(ProviderTag::Google).default_api_base.map(String::from))
            .unwrap_or_default();
        Self {
            client,
            api_base,
            api_key: config.api_key.clone(),
            timeout,
        }
    }

    fn generate_url(&self, model: &str) -> String {
        join_url(&self.api_base, &format!("v1beta/models/{model}:generateContent"))
    }

    fn build_body<'a>(&self, request: &'a CanonicalChatRequest) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![TextPart {
                    text: &request.prompt,
                }],
            }],
            system_instruction: request.system().map(|text| Instruction {
                parts: vec![TextPart { text }],
            }),
            generation_config: GenerationConfig {
                max_output_tokens: request.max_output_tokens,
                temperature: request.temperature,
            },
        }
    }
}

#[async_trait]
impl ChatProvider for GoogleProvider {
    fn tag(&self) -> ProviderTag {
        ProviderTag::Google
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn invoke(
        &self,
        model: &str,
        request: &CanonicalChatRequest,
    ) -> Result<CanonicalChatResult, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured(ProviderTag::Google));
        }

        let body = self.build_body(request);
        let url = self.generate_url(model);
        debug!(provider = "Google", model = %model, "Calling LLM");

        let builder = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key);

        let response: GenerateContentResponse =
            post_json(ProviderTag::Google, builder, &body, self.timeout).await?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .ok_or(ProviderError::EmptyResponse)?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        let (prompt_tokens, completion_tokens) = response.usage_metadata.map_or(
            (None, None),
            |u| (u.prompt_token_count, u.candidates_token_count),
        );

        Ok(CanonicalChatResult::from_reported(
            &request.prompt,
            text,
            prompt_tokens,
            completion_tokens,
        ))
    }

    fn models(&self) -> Vec<String> {
        static_models(spec_for(ProviderTag::Google))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(key: &str, base: Option<String>) -> GoogleProvider {
        let config = ProviderConfig {
            api_key: key.into(),
            api_base: base,
            extra_headers: None,
        };
        GoogleProvider::new(&config, reqwest::Client::new(), Duration::from_secs(5))
    }

    #[test]
    fn test_generate_url() {
        assert_eq!(
            provider("k", None).generate_url("gemini-1.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_body_shape() {
        let p = provider("k", None);
        let req = CanonicalChatRequest::new("hi")
            .with_system_prompt("Answer in French.")
            .with_max_output_tokens(100)
            .with_temperature(0.3);
        let body = serde_json::to_value(p.build_body(&req)).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{ "role": "user", "parts": [{ "text": "hi" }] }],
                "systemInstruction": { "parts": [{ "text": "Answer in French." }] },
                "generationConfig": { "maxOutputTokens": 100, "temperature": 0.3 }
            })
        );
    }

    #[test]
    fn test_body_without_system_instruction() {
        let p = provider("k", None);
        let body = serde_json::to_value(p.build_body(&CanonicalChatRequest::new("hi"))).unwrap();
        assert!(body.get("systemInstruction").is_none());
    }

    #[tokio::test]
    async fn test_invoke_with_usage() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "g-key"))
            .and(body_partial_json(json!({
                "generationConfig": { "maxOutputTokens": 2048 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "Bonjour" }, { "text": "!" }] },
                    "finishReason": "STOP"
                }],
                "usageMetadata": { "promptTokenCount": 6, "candidatesTokenCount": 2, "totalTokenCount": 8 }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let p = provider("g-key", Some(mock_server.uri()));
        let result = p
            .invoke("gemini-2.0-flash", &CanonicalChatRequest::new("Say hello in French"))
            .await
            .unwrap();
        assert_eq!(result.text, "Bonjour!");
        assert_eq!(result.prompt_tokens, 6);
        assert_eq!(result.completion_tokens, 2);
    }

    #[tokio::test]
    async fn test_missing_counts_estimated_independently() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "one two three" }] } }],
                "usageMetadata": { "promptTokenCount": 5 }
            })))
            .mount(&mock_server)
            .await;

        let p = provider("g-key", Some(mock_server.uri()));
        let result = p
            .invoke("gemini-1.5-flash", &CanonicalChatRequest::new("count to three"))
            .await
            .unwrap();
        assert_eq!(result.prompt_tokens, 5);
        assert_eq!(result.completion_tokens, 6);
    }

    #[tokio::test]
    async fn test_blocked_prompt_has_no_candidates() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&mock_server)
            .await;

        let p = provider("g-key", Some(mock_server.uri()));
        let err = p
            .invoke("gemini-1.5-flash", &CanonicalChatRequest::new("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse));
    }
}
