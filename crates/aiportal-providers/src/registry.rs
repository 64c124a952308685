//! Provider registry — static specs for the six supported backends.
//!
//! Each `ProviderSpec` describes how to reach a provider and which model
//! identifiers it advertises. The spec list is in catalog order.

use aiportal_core::ProviderTag;

// ─────────────────────────────────────────────
// ProviderSpec — static metadata for one provider
// ─────────────────────────────────────────────

/// What has to be configured before a provider can be called.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialKind {
    /// A non-empty API key.
    ApiKey,
    /// A non-empty base URL (self-hosted servers without auth).
    BaseUrl,
}

/// Static specification describing one LLM provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    pub tag: ProviderTag,
    /// Human-readable name for logs. E.g. `"OpenRouter"`.
    pub display_name: &'static str,
    pub credential: CredentialKind,
    /// Default API base URL, overridable per config.
    pub default_api_base: Option<&'static str>,
    /// Namespace prefix that routes to this provider and is stripped before
    /// the outbound call. E.g. `Some("openrouter/")`.
    pub model_prefix: Option<&'static str>,
    /// Model identifiers advertised in the catalog. For non-prefixed providers
    /// these are also the exact-match routing entries.
    pub models: &'static [&'static str],
}

// ─────────────────────────────────────────────
// All providers (catalog order)
// ─────────────────────────────────────────────

/// Complete list of supported provider specifications, in catalog order.
pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        tag: ProviderTag::OpenAi,
        display_name: "OpenAI",
        credential: CredentialKind::ApiKey,
        default_api_base: Some("https://api.openai.com/v1"),
        model_prefix: None,
        models: &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-4", "gpt-3.5-turbo"],
    },
    ProviderSpec {
        tag: ProviderTag::Anthropic,
        display_name: "Anthropic",
        credential: CredentialKind::ApiKey,
        default_api_base: Some("https://api.anthropic.com"),
        model_prefix: None,
        models: &[
            "claude-sonnet-4-20250514",
            "claude-3-5-sonnet-20241022",
            "claude-3-5-haiku-20241022",
        ],
    },
    ProviderSpec {
        tag: ProviderTag::Google,
        display_name: "Google",
        credential: CredentialKind::ApiKey,
        default_api_base: Some("https://generativelanguage.googleapis.com"),
        model_prefix: None,
        models: &["gemini-2.0-flash", "gemini-1.5-pro", "gemini-1.5-flash"],
    },
    // Groq speaks the OpenAI wire format.
    ProviderSpec {
        tag: ProviderTag::Groq,
        display_name: "Groq",
        credential: CredentialKind::ApiKey,
        default_api_base: Some("https://api.groq.com/openai/v1"),
        model_prefix: None,
        models: &[
            "llama-3.3-70b-versatile",
            "llama-3.1-8b-instant",
            "mixtral-8x7b-32768",
        ],
    },
    ProviderSpec {
        tag: ProviderTag::OpenRouter,
        display_name: "OpenRouter",
        credential: CredentialKind::ApiKey,
        default_api_base: Some("https://openrouter.ai/api/v1"),
        model_prefix: Some("openrouter/"),
        models: &[
            "openrouter/mistralai/mistral-7b-instruct:free",
            "openrouter/meta-llama/llama-3.1-8b-instruct:free",
            "openrouter/google/gemma-2-9b-it:free",
        ],
    },
    // No default base: Ollama is only available once a server URL is set.
    ProviderSpec {
        tag: ProviderTag::Ollama,
        display_name: "Ollama",
        credential: CredentialKind::BaseUrl,
        default_api_base: None,
        model_prefix: Some("ollama/"),
        models: &["ollama/llama3.2", "ollama/mistral"],
    },
];

// ─────────────────────────────────────────────
// Lookup helpers
// ─────────────────────────────────────────────

/// Find the spec for a tag. Every tag has exactly one spec.
pub fn spec_for(tag: ProviderTag) -> &'static ProviderSpec {
    PROVIDERS
        .iter()
        .find(|spec| spec.tag == tag)
        .unwrap_or(&PROVIDERS[0])
}

/// Strip the provider's namespace prefix from a model identifier, if present.
///
/// `"openrouter/mistralai/mistral-7b-instruct:free"` → `"mistralai/mistral-7b-instruct:free"`.
pub fn strip_model_prefix<'a>(model: &'a str, spec: &ProviderSpec) -> &'a str {
    spec.model_prefix
        .and_then(|prefix| model.strip_prefix(prefix))
        .unwrap_or(model)
}

/// The spec's static models as owned strings.
pub fn static_models(spec: &ProviderSpec) -> Vec<String> {
    spec.models.iter().map(|m| m.to_string()).collect()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
