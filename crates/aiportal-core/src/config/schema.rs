//! Configuration schema.
//!
//! Hierarchy: `Config` → `ChatDefaults`, `ProvidersConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{ProviderTag, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.aiportal/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub defaults: ChatDefaults,
    pub providers: ProvidersConfig,
}

// ─────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────

/// Process-wide chat defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatDefaults {
    /// Model used when a request doesn't name one.
    pub model: String,
    /// Provider the default model is expected to route to.
    pub provider: ProviderTag,
    /// Maximum tokens to generate per response.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
    /// Upper bound on a single outbound provider call.
    pub request_timeout_secs: u64,
}

impl Default for ChatDefaults {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            provider: ProviderTag::OpenAi,
            max_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            request_timeout_secs: 60,
        }
    }
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Configuration for a single LLM provider (API key, base URL, headers).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for authentication.
    #[serde(default)]
    pub api_key: String,
    /// Custom API base URL (overrides provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Extra HTTP headers to send with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_headers: Option<HashMap<String, String>>,
}

impl ProviderConfig {
    /// Whether this provider has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Whether a non-empty base URL is set.
    pub fn has_api_base(&self) -> bool {
        self.api_base.as_deref().is_some_and(|b| !b.trim().is_empty())
    }
}

/// Azure REST API version used when none is configured.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";

/// Azure-hosted OpenAI deployment. Replaces the public OpenAI endpoint when set.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AzureOpenAiConfig {
    pub api_key: String,
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    /// Deployment name; sent in place of the model identifier.
    pub deployment: String,
    pub api_version: String,
}

impl Default for AzureOpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: String::new(),
            deployment: String::new(),
            api_version: DEFAULT_AZURE_API_VERSION.to_string(),
        }
    }
}

impl AzureOpenAiConfig {
    /// Key, endpoint and deployment are all required.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.endpoint.is_empty() && !self.deployment.is_empty()
    }
}

/// All provider configurations, one per supported backend.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: ProviderConfig,
    #[serde(default)]
    pub azure_openai: AzureOpenAiConfig,
    #[serde(default)]
    pub anthropic: ProviderConfig,
    #[serde(default)]
    pub google: ProviderConfig,
    #[serde(default)]
    pub groq: ProviderConfig,
    #[serde(default)]
    pub openrouter: ProviderConfig,
    /// Only `apiBase` matters for Ollama; no key is sent.
    #[serde(default)]
    pub ollama: ProviderConfig,
}

impl ProvidersConfig {
    /// Get a provider config by tag.
    pub fn get(&self, tag: ProviderTag) -> &ProviderConfig {
        match tag {
            ProviderTag::OpenAi => &self.openai,
            ProviderTag::Anthropic => &self.anthropic,
            ProviderTag::Google => &self.google,
            ProviderTag::Groq => &self.groq,
            ProviderTag::OpenRouter => &self.openrouter,
            ProviderTag::Ollama => &self.ollama,
        }
    }

    /// Mutable access by tag (used by env overrides).
    pub fn get_mut(&mut self, tag: ProviderTag) -> &mut ProviderConfig {
        match tag {
            ProviderTag::OpenAi => &mut self.openai,
            ProviderTag::Anthropic => &mut self.anthropic,
            ProviderTag::Google => &mut self.google,
            ProviderTag::Groq => &mut self.groq,
            ProviderTag::OpenRouter => &mut self.openrouter,
            ProviderTag::Ollama => &mut self.ollama,
        }
    }
}
