//! Anthropic Messages API adapter.
//!
//! The system prompt is a top-level field rather than a message, and usage is
//! reported as `input_tokens` / `output_tokens`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use aiportal_core::config::schema::ProviderConfig;
use aiportal_core::types::DEFAULT_TEMPERATURE;
use aiportal_core::utils::join_url;
use aiportal_core::{CanonicalChatRequest, CanonicalChatResult, ProviderTag};

use crate::error::ProviderError;
use crate::registry::{spec_for, static_models};
use crate::traits::ChatProvider;
use crate::transport::post_json;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    max_tokens: u32,
    /// Left out at the default so the model's own default applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
}

/// Adapter for `POST /v1/messages`.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    timeout: Duration,
}

impl AnthropicProvider {
    pub fn new(config: &ProviderConfig, client: reqwest::Client, timeout: Duration) -> Self {
        let api_base = config
            .api_base
            .clone()
            .filter(|b| !b.trim().is_empty())
            .or_else(|| spec_for(ProviderTag::Anthropic).default_api_base.map(String::from))
            .unwrap_or_default();
        Self {
            client,
            api_base,
            api_key: config.api_key.clone(),
            timeout,
        }
    }

    fn build_body<'a>(&self, model: &'a str, request: &'a CanonicalChatRequest) -> MessagesRequest<'a> {
        let temperature = if (request.temperature - DEFAULT_TEMPERATURE).abs() < f64::EPSILON {
            None
        } else {
            Some(request.temperature)
        };

        MessagesRequest {
            model,
            messages: vec![AnthropicMessage {
                role: "user",
                content: &request.prompt,
            }],
            system: request.system(),
            max_tokens: request.max_output_tokens,
            temperature,
        }
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn tag(&self) -> ProviderTag {
        ProviderTag::Anthropic
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
            return Err(ProviderError::NotConfigured(ProviderTag::Anthropic));
        }

        let body = self.build_body(model, request);
        let url = join_url(&self.api_base, "v1/messages");
        debug!(provider = "Anthropic", model = %model, "Calling LLM");

        let builder = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION);

        let response: MessagesResponse =
            post_json(ProviderTag::Anthropic, builder, &body, self.timeout).await?;

        let texts: Vec<String> = response
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect();
        if texts.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        let (input, output) = response
            .usage
            .map_or((None, None), |u| (u.input_tokens, u.output_tokens));

        Ok(CanonicalChatResult::from_reported(
            &request.prompt,
            texts.concat(),
            input,
            output,
        ))
    }

    fn models(&self) -> Vec<String> {
        static_models(spec_for(ProviderTag::Anthropic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn provider(key: &str, base: Option<String>) -> AnthropicProvider {
        let config = ProviderConfig {
            api_key: key.into(),
            api_base: base,
            extra_headers: None,
        };
        AnthropicProvider::new(&config, reqwest::Client::new(), Duration::from_secs(5))
    }

    #[test]
    fn test_default_base() {
        assert_eq!(provider("k", None).api_base, "https://api.anthropic.com");
    }

    #[test]
    fn test_temperature_omitted_at_default() {
        let p = provider("k", None);
        let req = CanonicalChatRequest::new("hi");
        let body = serde_json::to_value(p.build_body("claude-3-5-haiku-20241022", &req)).unwrap();
        assert!(body.get("temperature").is_none());
        assert!(body.get("system").is_none());
        assert_eq!(body["messages"], json!([{ "role": "user", "content": "hi" }]));
    }

    #[test]
    fn test_temperature_sent_when_changed() {
        let p = provider("k", None);
        let req = CanonicalChatRequest::new("hi").with_temperature(0.2);
        let body = serde_json::to_value(p.build_body("claude-3-5-haiku-20241022", &req)).unwrap();
        assert_eq!(body["temperature"], 0.2);
    }

    #[test]
    fn test_system_prompt_is_top_level() {
        let p = provider("k", None);
        let req = CanonicalChatRequest::new("hi").with_system_prompt("You are terse.");
        let body = serde_json::to_value(p.build_body("claude-sonnet-4-20250514", &req)).unwrap();
        assert_eq!(body["system"], "You are terse.");
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
    }

    #[tokio::test]
    async fn test_invoke_normalizes_usage() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant-test"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .and(body_partial_json(json!({
                "model": "claude-3-5-haiku-20241022",
                "max_tokens": 2048,
                "system": "Be brief."
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_01",
                "type": "message",
                "role": "assistant",
                "content": [
                    { "type": "text", "text": "Hello" },
                    { "type": "text", "text": ", world." }
                ],
                "stop_reason": "end_turn",
                "usage": { "input_tokens": 21, "output_tokens": 8 }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let p = provider("sk-ant-test", Some(mock_server.uri()));
        let req = CanonicalChatRequest::new("Say hello").with_system_prompt("Be brief.");
        let result = p.invoke("claude-3-5-haiku-20241022", &req).await.unwrap();

        assert_eq!(result.text, "Hello, world.");
        assert_eq!(result.prompt_tokens, 21);
        assert_eq!(result.completion_tokens, 8);
        assert_eq!(result.total_tokens(), 29);

        let received: Vec<Request> = mock_server.received_requests().await.unwrap();
        let sent: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        assert!(sent.get("temperature").is_none());
    }

    #[tokio::test]
    async fn test_overloaded_is_status_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
            .mount(&mock_server)
            .await;

        let p = provider("sk-ant-test", Some(mock_server.uri()));
        let err = p
            .invoke("claude-3-5-haiku-20241022", &CanonicalChatRequest::new("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 529, .. }));
    }

    #[tokio::test]
    async fn test_no_text_blocks_is_empty_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [],
                "usage": { "input_tokens": 3, "output_tokens": 0 }
            })))
            .mount(&mock_server)
            .await;

        let p = provider("sk-ant-test", Some(mock_server.uri()));
        let err = p
            .invoke("claude-3-5-haiku-20241022", &CanonicalChatRequest::new("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let p = provider("", Some("http://127.0.0.1:1".into()));
        assert!(!p.is_configured());
        let err = p
            .invoke("claude-3-5-haiku-20241022", &CanonicalChatRequest::new("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(ProviderTag::Anthropic)));
    }
}
