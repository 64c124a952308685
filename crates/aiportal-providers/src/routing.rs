//! Model routing table — maps any model identifier to exactly one provider.
//!
//! Resolution order:
//! 1. Namespace prefixes, checked in fixed order: `ollama/`, then `openrouter/`.
//! 2. Exact match against the advertised models of non-prefixed providers.
//! 3. Anything else is assumed OpenAI-compatible.
//!
//! Routing never looks at credentials; availability is checked separately.

use std::collections::HashMap;

use aiportal_core::ProviderTag;

use crate::registry::{spec_for, PROVIDERS};

/// Provider for identifiers that match nothing else.
pub const FALLBACK_PROVIDER: ProviderTag = ProviderTag::OpenAi;

/// Read-only routing table, built once at startup.
#[derive(Clone, Debug)]
pub struct ModelRoutingTable {
    prefixes: Vec<(&'static str, ProviderTag)>,
    exact: HashMap<String, ProviderTag>,
}

impl Default for ModelRoutingTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl ModelRoutingTable {
    /// The routing table derived from the provider registry.
    pub fn standard() -> Self {
        let prefixes = [ProviderTag::Ollama, ProviderTag::OpenRouter]
            .into_iter()
            .filter_map(|tag| spec_for(tag).model_prefix.map(|p| (p, tag)))
            .collect();

        let exact = PROVIDERS
            .iter()
            .filter(|spec| spec.model_prefix.is_none())
            .flat_map(|spec| spec.models.iter().map(move |m| (m.to_string(), spec.tag)))
            .collect();

        Self { prefixes, exact }
    }

    /// Add an exact-match entry (e.g. a model alias known only at deploy time).
    pub fn with_exact(mut self, model: impl Into<String>, tag: ProviderTag) -> Self {
        self.exact.insert(model.into(), tag);
        self
    }

    /// Resolve a model identifier to its provider.
    pub fn resolve_provider(&self, model: &str) -> ProviderTag {
        if let Some((_, tag)) = self
            .prefixes
            .iter()
            .find(|(prefix, _)| model.starts_with(prefix))
        {
            return *tag;
        }
        self.exact.get(model).copied().unwrap_or(FALLBACK_PROVIDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_advertised_model_routes_to_its_provider() {
        let table = ModelRoutingTable::standard();
        for spec in PROVIDERS {
            for model in spec.models {
                assert_eq!(table.resolve_provider(model), spec.tag, "model {model}");
            }
        }
    }

    #[test]
    fn test_exact_matches() {
        let table = ModelRoutingTable::standard();
        assert_eq!(table.resolve_provider("claude-3-5-haiku-20241022"), ProviderTag::Anthropic);
        assert_eq!(table.resolve_provider("gemini-1.5-pro"), ProviderTag::Google);
        assert_eq!(table.resolve_provider("llama-3.3-70b-versatile"), ProviderTag::Groq);
        assert_eq!(table.resolve_provider("gpt-4o-mini"), ProviderTag::OpenAi);
    }

    #[test]
    fn test_unknown_defaults_to_openai() {
        let table = ModelRoutingTable::standard();
        assert_eq!(table.resolve_provider("unknown-model-xyz"), ProviderTag::OpenAi);
        assert_eq!(table.resolve_provider(""), ProviderTag::OpenAi);
        // Case-sensitive: not an exact match.
        assert_eq!(table.resolve_provider("Claude-3-5-Haiku-20241022"), ProviderTag::OpenAi);
    }

    #[test]
    fn test_prefix_wins_over_exact_match() {
        let table = ModelRoutingTable::standard();
        assert_eq!(
            table.resolve_provider("openrouter/claude-3-5-haiku-20241022"),
            ProviderTag::OpenRouter
        );
        assert_eq!(table.resolve_provider("ollama/gpt-4o"), ProviderTag::Ollama);
        assert_eq!(
            table.resolve_provider("openrouter/mistralai/mistral-7b-instruct:free"),
            ProviderTag::OpenRouter
        );
    }

    #[test]
    fn test_ollama_prefix_checked_first() {
        let table = ModelRoutingTable::standard();
        assert_eq!(table.resolve_provider("ollama/openrouter/x"), ProviderTag::Ollama);
        assert_eq!(table.resolve_provider("openrouter/ollama/x"), ProviderTag::OpenRouter);
    }

    #[test]
    fn test_prefix_entry_overrides_added_exact_entry() {
        let table = ModelRoutingTable::standard()
            .with_exact("ollama/llama3.2", ProviderTag::Groq)
            .with_exact("my-company-llama", ProviderTag::Groq);
        assert_eq!(table.resolve_provider("ollama/llama3.2"), ProviderTag::Ollama);
        assert_eq!(table.resolve_provider("my-company-llama"), ProviderTag::Groq);
    }
}
