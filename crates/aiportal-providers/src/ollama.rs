//! Ollama adapter — direct HTTP against a local or remote Ollama server.
//!
//! Requires only a base URL. Models are addressed as `ollama/<name>`; the
//! prefix is stripped before the call.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use aiportal_core::config::schema::ProviderConfig;
use aiportal_core::utils::join_url;
use aiportal_core::{CanonicalChatRequest, CanonicalChatResult, ProviderTag};

use crate::error::ProviderError;
use crate::registry::{spec_for, static_models, strip_model_prefix};
use crate::traits::ChatProvider;
use crate::transport::{classify, post_json};

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaReply>,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaReply {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Adapter for `POST {base}/api/chat`.
pub struct OllamaProvider {
    client: reqwest::Client,
    api_base: String,
    timeout: Duration,
}

impl OllamaProvider {
    pub fn new(config: &ProviderConfig, client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            client,
            api_base: config.api_base.clone().unwrap_or_default().trim().to_string(),
            timeout,
        }
    }

    fn build_body<'a>(&self, model: &'a str, request: &'a CanonicalChatRequest) -> OllamaChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system() {
            messages.push(OllamaMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(OllamaMessage {
            role: "user",
            content: &request.prompt,
        });

        OllamaChatRequest {
            model,
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_output_tokens,
            },
        }
    }

    /// List locally pulled models via `GET {base}/api/tags`.
    pub async fn fetch_local_models(&self) -> Result<Vec<String>, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured(ProviderTag::Ollama));
        }

        let url = join_url(&self.api_base, "api/tags");
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| classify(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(tags
            .models
            .into_iter()
            .map(|entry| format!("ollama/{}", entry.name))
            .collect())
    }
}

#[async_trait]
impl ChatProvider for OllamaProvider {
    fn tag(&self) -> ProviderTag {
        ProviderTag::Ollama
    }

    fn is_configured(&self) -> bool {
        !self.api_base.is_empty()
    }

    async fn invoke(
        &self,
        model: &str,
        request: &CanonicalChatRequest,
    ) -> Result<CanonicalChatResult, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured(ProviderTag::Ollama));
        }

        let local_model = strip_model_prefix(model, spec_for(ProviderTag::Ollama));
        let body = self.build_body(local_model, request);
        let url = join_url(&self.api_base, "api/chat");
        debug!(provider = "Ollama", model = %local_model, url = %url, "Calling LLM");

        let response: OllamaChatResponse =
            post_json(ProviderTag::Ollama, self.client.post(&url), &body, self.timeout).await?;

        let reply = response.message.ok_or(ProviderError::EmptyResponse)?;

        Ok(CanonicalChatResult::from_reported(
            &request.prompt,
            reply.content,
            response.prompt_eval_count,
            response.eval_count,
        ))
    }

    fn models(&self) -> Vec<String> {
        static_models(spec_for(ProviderTag::Ollama))
    }

    /// Live model list; falls back to the static list when the server can't be
    /// reached or has nothing pulled.
    async fn discover_models(&self) -> Vec<String> {
        match self.fetch_local_models().await {
            Ok(models) if !models.is_empty() => models,
            Ok(_) => {
                warn!("Ollama reports no local models, using static list");
                self.models()
            }
            Err(e) => {
                warn!(error = %e, "Ollama model discovery failed, using static list");
                self.models()
            }
        }
    }
}
