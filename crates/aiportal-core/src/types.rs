//! Core types for AI Portal — the provider-agnostic shape of a chat call.
//!
//! Every provider adapter consumes a [`CanonicalChatRequest`] and produces a
//! [`CanonicalChatResult`]; nothing provider-specific leaks past this module.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default cap on generated tokens when the caller doesn't set one.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

// ─────────────────────────────────────────────
// ProviderTag
// ─────────────────────────────────────────────

/// The closed set of backends a model can be routed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderTag {
    OpenAi,
    Anthropic,
    Google,
    Groq,
    OpenRouter,
    Ollama,
}

impl ProviderTag {
    /// All tags, in catalog order.
    pub const ALL: [ProviderTag; 6] = [
        ProviderTag::OpenAi,
        ProviderTag::Anthropic,
        ProviderTag::Google,
        ProviderTag::Groq,
        ProviderTag::OpenRouter,
        ProviderTag::Ollama,
    ];

    /// Lowercase wire/config name (e.g. `"openrouter"`).
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderTag::OpenAi => "openai",
            ProviderTag::Anthropic => "anthropic",
            ProviderTag::Google => "google",
            ProviderTag::Groq => "groq",
            ProviderTag::OpenRouter => "openrouter",
            ProviderTag::Ollama => "ollama",
        }
    }

    /// Human-readable name for logs and status output.
    pub fn display_name(self) -> &'static str {
        match self {
            ProviderTag::OpenAi => "OpenAI",
            ProviderTag::Anthropic => "Anthropic",
            ProviderTag::Google => "Google",
            ProviderTag::Groq => "Groq",
            ProviderTag::OpenRouter => "OpenRouter",
            ProviderTag::Ollama => "Ollama",
        }
    }
}

impl fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        ProviderTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == lower)
            .ok_or_else(|| format!("unknown provider '{}'", s))
    }
}

// ─────────────────────────────────────────────
// Request
// ─────────────────────────────────────────────

/// Why a request was rejected before any provider was contacted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestError {
    #[error("prompt must not be empty")]
    EmptyPrompt,

    #[error("maxOutputTokens must be greater than zero")]
    ZeroMaxTokens,

    #[error("temperature {0} is outside 0.0..=2.0")]
    TemperatureOutOfRange(f64),
}

/// A provider-agnostic chat request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalChatRequest {
    pub prompt: String,
    /// Model identifier; `None` means the configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_max_output_tokens() -> u32 {
    DEFAULT_MAX_OUTPUT_TOKENS
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

impl CanonicalChatRequest {
    /// A request with default model, no system prompt, and default sampling.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
            system_prompt: None,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Check the request invariants. Whitespace-only prompts count as empty.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.prompt.trim().is_empty() {
            return Err(RequestError::EmptyPrompt);
        }
        if self.max_output_tokens == 0 {
            return Err(RequestError::ZeroMaxTokens);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(RequestError::TemperatureOutOfRange(self.temperature));
        }
        Ok(())
    }

    /// The system prompt, treating an empty string the same as `None`.
    pub fn system(&self) -> Option<&str> {
        self.system_prompt.as_deref().filter(|s| !s.is_empty())
    }
}

// ─────────────────────────────────────────────
// Result
// ─────────────────────────────────────────────

/// Normalized outcome of one provider call. Token counts are always present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalChatResult {
    pub text: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl CanonicalChatResult {
    /// Build a result from whatever counts the provider reported.
    ///
    /// A missing count is replaced by [`estimate_tokens`] over the prompt
    /// (for `prompt_tokens`) or the generated text (for `completion_tokens`),
    /// each field independently.
    pub fn from_reported(
        prompt: &str,
        text: String,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    ) -> Self {
        let prompt_tokens = prompt_tokens.unwrap_or_else(|| estimate_tokens(prompt));
        let completion_tokens = completion_tokens.unwrap_or_else(|| estimate_tokens(&text));
        Self {
            text,
            prompt_tokens,
            completion_tokens,
        }
    }

    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// Deterministic token estimate used when a provider omits usage: words × 2.
pub fn estimate_tokens(text: &str) -> u32 {
    let words = text.split_whitespace().count() as u32;
    words.saturating_mul(2)
}

// ─────────────────────────────────────────────
// Caller-facing response + usage record
// ─────────────────────────────────────────────

/// What the request-handling layer returns to its client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// One successful chat, handed to the caller for persistence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub model: String,
    pub provider: ProviderTag,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub response_text: String,
    pub latency_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl UsageRecord {
    pub fn new(
        model: impl Into<String>,
        provider: ProviderTag,
        result: &CanonicalChatResult,
        latency_ms: u64,
    ) -> Self {
        Self {
            model: model.into(),
            provider,
            prompt_tokens: result.prompt_tokens,
            completion_tokens: result.completion_tokens,
            total_tokens: result.total_tokens(),
            response_text: result.text.clone(),
            latency_ms,
            created_at: Utc::now(),
        }
    }

    /// The client-facing view of this record.
    pub fn to_response(&self) -> ChatResponse {
        ChatResponse {
            response: self.response_text.clone(),
            model: self.model.clone(),
            prompt_tokens: self.prompt_tokens,
            completion_tokens: self.completion_tokens,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_tag_roundtrip_names() {
        for tag in ProviderTag::ALL {
            assert_eq!(tag.as_str().parse::<ProviderTag>().unwrap(), tag);
        }
        assert_eq!("OpenRouter".parse::<ProviderTag>().unwrap(), ProviderTag::OpenRouter);
        assert!("azure".parse::<ProviderTag>().is_err());
    }

    #[test]
    fn test_provider_tag_serializes_lowercase() {
        let json = serde_json::to_string(&ProviderTag::OpenAi).unwrap();
        assert_eq!(json, "\"openai\"");
    }

    #[test]
    fn test_request_defaults() {
        let req = CanonicalChatRequest::new("hi");
        assert_eq!(req.max_output_tokens, 2048);
        assert_eq!(req.temperature, 0.7);
        assert!(req.model.is_none());
        assert!(req.system().is_none());
    }

    #[test]
    fn test_request_deserialize_defaults() {
        let req: CanonicalChatRequest =
            serde_json::from_str(r#"{"prompt": "hello", "model": "gpt-4o"}"#).unwrap();
        assert_eq!(req.model.as_deref(), Some("gpt-4o"));
        assert_eq!(req.max_output_tokens, DEFAULT_MAX_OUTPUT_TOKENS);
        assert_eq!(req.temperature, DEFAULT_TEMPERATURE);
    }

    #[test]
    fn test_validate_rejects_empty_prompt() {
        assert_eq!(
            CanonicalChatRequest::new("").validate(),
            Err(RequestError::EmptyPrompt)
        );
        assert_eq!(
            CanonicalChatRequest::new("  \n\t").validate(),
            Err(RequestError::EmptyPrompt)
        );
    }

    #[test]
    fn test_validate_rejects_zero_tokens() {
        let req = CanonicalChatRequest::new("hi").with_max_output_tokens(0);
        assert_eq!(req.validate(), Err(RequestError::ZeroMaxTokens));
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let req = CanonicalChatRequest::new("hi").with_temperature(3.5);
        assert!(matches!(
            req.validate(),
            Err(RequestError::TemperatureOutOfRange(_))
        ));
    }

    #[test]
    fn test_empty_system_prompt_is_none() {
        let req = CanonicalChatRequest::new("hi").with_system_prompt("");
        assert!(req.system().is_none());
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("hello"), 2);
        assert_eq!(estimate_tokens("  the quick\nbrown   fox "), 8);
    }

    #[test]
    fn test_from_reported_exact_counts() {
        let result = CanonicalChatResult::from_reported("a b c", "x".into(), Some(11), Some(7));
        assert_eq!(result.prompt_tokens, 11);
        assert_eq!(result.completion_tokens, 7);
        assert_eq!(result.total_tokens(), 18);
    }

    #[test]
    fn test_from_reported_estimates_each_field_independently() {
        let result =
            CanonicalChatResult::from_reported("one two three", "four five".into(), None, Some(9));
        assert_eq!(result.prompt_tokens, 6);
        assert_eq!(result.completion_tokens, 9);

        let result =
            CanonicalChatResult::from_reported("one two three", "four five".into(), Some(3), None);
        assert_eq!(result.prompt_tokens, 3);
        assert_eq!(result.completion_tokens, 4);
    }

    #[test]
    fn test_usage_record_totals() {
        let result = CanonicalChatResult {
            text: "Hello there".into(),
            prompt_tokens: 12,
            completion_tokens: 30,
        };
        let record = UsageRecord::new("gpt-4o", ProviderTag::OpenAi, &result, 250);
        assert_eq!(record.total_tokens, 42);
        assert_eq!(record.response_text, "Hello there");

        let response = record.to_response();
        assert_eq!(response.model, "gpt-4o");
        assert_eq!(response.prompt_tokens, 12);
        assert_eq!(response.completion_tokens, 30);
    }
}
