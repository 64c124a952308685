//! HTTP provider for OpenAI-compatible `/chat/completions` APIs.
//!
//! Covers: OpenAI (public or Azure deployment), Groq, OpenRouter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use aiportal_core::config::schema::{AzureOpenAiConfig, ProviderConfig};
use aiportal_core::utils::join_url;
use aiportal_core::{CanonicalChatRequest, CanonicalChatResult, ProviderTag};

use crate::error::ProviderError;
use crate::registry::{spec_for, static_models, strip_model_prefix, ProviderSpec};
use crate::traits::ChatProvider;
use crate::transport::post_json;

/// OpenAI models whose identifier starts with this take `max_completion_tokens`.
pub const COMPLETION_TOKENS_MODEL_PREFIX: &str = "gpt-5";

// ─────────────────────────────────────────────
// Wire format
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

// ─────────────────────────────────────────────
// HttpProvider
// ─────────────────────────────────────────────

#[derive(Clone)]
struct AzureTarget {
    api_key: String,
    endpoint: String,
    deployment: String,
    api_version: String,
}

/// A provider that talks to any OpenAI-compatible HTTP API.
pub struct HttpProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    spec: &'static ProviderSpec,
    /// API base URL (e.g. `"https://api.openai.com/v1"`).
    api_base: String,
    /// API key for Bearer authentication.
    api_key: String,
    /// Extra headers to send with each request (e.g. OpenRouter `HTTP-Referer`).
    extra_headers: HeaderMap,
    timeout: Duration,
    azure: Option<AzureTarget>,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("provider", &self.spec.display_name)
            .field("api_base", &self.api_base)
            .field("azure", &self.azure.as_ref().map(|a| &a.deployment))
            .finish()
    }
}

impl HttpProvider {
    /// Create a provider for `tag` from its config.
    ///
    /// The API base resolves config > spec default.
    pub fn new(
        tag: ProviderTag,
        config: &ProviderConfig,
        client: reqwest::Client,
        timeout: Duration,
    ) -> Self {
        let spec = spec_for(tag);
        let api_base = config
            .api_base
            .clone()
            .filter(|b| !b.trim().is_empty())
            .or_else(|| spec.default_api_base.map(String::from))
            .unwrap_or_default();

        let mut extra_headers = HeaderMap::new();
        if let Some(ref headers) = config.extra_headers {
            for (key, value) in headers {
                if let (Ok(name), Ok(val)) = (
                    HeaderName::from_bytes(key.as_bytes()),
                    HeaderValue::from_str(value),
                ) {
                    extra_headers.insert(name, val);
                } else {
                    warn!("Invalid header: {}={}", key, value);
                }
            }
        }

        HttpProvider {
            client,
            spec,
            api_base,
            api_key: config.api_key.clone(),
            extra_headers,
            timeout,
            azure: None,
        }
    }

    /// Route every call to an Azure deployment instead of the public API.
    ///
    /// Ignored unless the Azure config is complete.
    pub fn with_azure(mut self, azure: &AzureOpenAiConfig) -> Self {
        if azure.is_configured() {
            self.azure = Some(AzureTarget {
                api_key: azure.api_key.clone(),
                endpoint: azure.endpoint.clone(),
                deployment: azure.deployment.clone(),
                api_version: azure.api_version.clone(),
            });
        }
        self
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        match &self.azure {
            Some(azure) => format!(
                "{}?api-version={}",
                join_url(
                    &azure.endpoint,
                    &format!("openai/deployments/{}/chat/completions", azure.deployment)
                ),
                azure.api_version
            ),
            None => join_url(&self.api_base, "chat/completions"),
        }
    }

    /// Model name as sent upstream: Azure deployment, or the identifier with
    /// any namespace prefix stripped.
    fn resolve_model<'a>(&'a self, model: &'a str) -> &'a str {
        match &self.azure {
            Some(azure) => &azure.deployment,
            None => strip_model_prefix(model, self.spec),
        }
    }

    fn uses_completion_tokens(&self, model: &str) -> bool {
        self.spec.tag == ProviderTag::OpenAi && model.starts_with(COMPLETION_TOKENS_MODEL_PREFIX)
    }

    fn build_body<'a>(
        &self,
        model: &'a str,
        request: &'a CanonicalChatRequest,
    ) -> ChatCompletionRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system() {
            messages.push(WireMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(WireMessage {
            role: "user",
            content: &request.prompt,
        });

        let (max_tokens, max_completion_tokens) = if self.uses_completion_tokens(model) {
            (None, Some(request.max_output_tokens))
        } else {
            (Some(request.max_output_tokens), None)
        };

        ChatCompletionRequest {
            model,
            messages,
            max_tokens,
            max_completion_tokens,
            temperature: request.temperature,
        }
    }
}

#[async_trait]
impl ChatProvider for HttpProvider {
    fn tag(&self) -> ProviderTag {
        self.spec.tag
    }

    fn is_configured(&self) -> bool {
        self.azure.is_some() || !self.api_key.is_empty()
    }

    async fn invoke(
        &self,
        model: &str,
        request: &CanonicalChatRequest,
    ) -> Result<CanonicalChatResult, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured(self.spec.tag));
        }

        let resolved_model = self.resolve_model(model);
        let body = self.build_body(resolved_model, request);
        let url = self.completions_url();

        debug!(
            provider = self.spec.display_name,
            model = %resolved_model,
            url = %url,
            "Calling LLM"
        );

        let builder = self.client.post(&url).headers(self.extra_headers.clone());
        let builder = match &self.azure {
            Some(azure) => builder.header("api-key", &azure.api_key),
            None => builder.bearer_auth(&self.api_key),
        };

        let response: ChatCompletionResponse =
            post_json(self.spec.tag, builder, &body, self.timeout).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?;
        let text = choice.message.content.ok_or(ProviderError::EmptyResponse)?;
        let (prompt_tokens, completion_tokens) = response
            .usage
            .map_or((None, None), |u| (u.prompt_tokens, u.completion_tokens));

        Ok(CanonicalChatResult::from_reported(
            &request.prompt,
            text,
            prompt_tokens,
            completion_tokens,
        ))
    }

    fn models(&self) -> Vec<String> {
        match &self.azure {
            Some(azure) => vec![azure.deployment.clone()],
            None => static_models(self.spec),
        }
    }

    fn display_name(&self) -> &str {
        self.spec.display_name
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
