//! Model catalog — the model identifiers a caller can currently choose from.

use std::collections::HashSet;
use std::sync::Arc;

use aiportal_core::ProviderTag;

use crate::traits::ChatProvider;

/// Returned alone when no provider is configured, so the list is never empty.
pub const FALLBACK_MODEL: &str = "gpt-4o-mini";

/// Enumerates usable models across configured providers, in catalog order
/// (openai, anthropic, google, groq, openrouter, ollama).
pub struct ModelCatalog {
    adapters: Vec<Arc<dyn ChatProvider>>,
}

impl ModelCatalog {
    pub fn new(mut adapters: Vec<Arc<dyn ChatProvider>>) -> Self {
        adapters.sort_by_key(|adapter| catalog_position(adapter.tag()));
        Self { adapters }
    }

    /// Static listing; no network access.
    pub fn list_available_models(&self) -> Vec<String> {
        assemble(self.configured().map(|adapter| adapter.models()))
    }

    /// Like [`Self::list_available_models`], but lets providers that support
    /// it (Ollama) report what is actually installed.
    pub async fn discover_available_models(&self) -> Vec<String> {
        let mut lists = Vec::with_capacity(self.adapters.len());
        for adapter in self.configured() {
            lists.push(adapter.discover_models().await);
        }
        assemble(lists)
    }

    fn configured(&self) -> impl Iterator<Item = &Arc<dyn ChatProvider>> {
        self.adapters.iter().filter(|adapter| adapter.is_configured())
    }
}

fn catalog_position(tag: ProviderTag) -> usize {
    ProviderTag::ALL
        .iter()
        .position(|t| *t == tag)
        .unwrap_or(ProviderTag::ALL.len())
}

/// Concatenate, drop repeats (first occurrence wins), never return empty.
fn assemble(lists: impl IntoIterator<Item = Vec<String>>) -> Vec<String> {
    let mut seen = HashSet::new();
    let models: Vec<String> = lists
        .into_iter()
        .flatten()
        .filter(|model| seen.insert(model.clone()))
        .collect();

    if models.is_empty() {
        vec![FALLBACK_MODEL.to_string()]
    } else {
        models
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use aiportal_core::config::schema::{AzureOpenAiConfig, ProvidersConfig};

    use crate::credentials::CredentialRegistry;
    use crate::registry::PROVIDERS;

    fn catalog(providers: &ProvidersConfig) -> ModelCatalog {
        let registry = CredentialRegistry::new(providers);
        ModelCatalog::new(registry.build_adapters(reqwest::Client::new(), Duration::from_secs(1)))
    }

    fn all_configured() -> ProvidersConfig {
        let mut providers = ProvidersConfig::default();
        for tag in ProviderTag::ALL {
            let config = providers.get_mut(tag);
            config.api_key = "key".into();
            // Unroutable so live discovery falls back to the static list.
            config.api_base = Some("http://127.0.0.1:1".into());
        }
        providers
    }

    #[test]
    fn test_nothing_configured_returns_fallback() {
        let models = catalog(&ProvidersConfig::default()).list_available_models();
        assert_eq!(models, vec![FALLBACK_MODEL.to_string()]);
    }

    #[test]
    fn test_everything_configured_full_concatenation_in_order() {
        let models = catalog(&all_configured()).list_available_models();
        let expected: Vec<String> = PROVIDERS
            .iter()
            .flat_map(|spec| spec.models.iter().map(|m| m.to_string()))
            .collect();
        assert_eq!(models, expected);

        let unique: HashSet<&String> = models.iter().collect();
        assert_eq!(unique.len(), models.len());
    }

    #[test]
    fn test_only_configured_providers_listed() {
        let mut providers = ProvidersConfig::default();
        providers.groq.api_key = "gsk".into();
        providers.anthropic.api_key = "sk-ant".into();

        let models = catalog(&providers).list_available_models();
        assert_eq!(models.first().map(String::as_str), Some("claude-sonnet-4-20250514"));
        assert!(models.contains(&"llama-3.1-8b-instant".to_string()));
        assert!(!models.contains(&"gpt-4o".to_string()));
        assert!(!models.iter().any(|m| m.starts_with("ollama/")));
    }

    #[test]
    fn test_azure_lists_deployment_in_openai_slot() {
        let mut providers = ProvidersConfig::default();
        providers.azure_openai = AzureOpenAiConfig {
            api_key: "az".into(),
            endpoint: "https://res.openai.azure.com".into(),
            deployment: "corp-gpt4o".into(),
            ..Default::default()
        };
        providers.anthropic.api_key = "sk-ant".into();

        let models = catalog(&providers).list_available_models();
        assert_eq!(models[0], "corp-gpt4o");
        assert_eq!(models[1], "claude-sonnet-4-20250514");
    }

    #[test]
    fn test_assemble_drops_repeats() {
        let models = assemble(vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["b".to_string(), "c".to_string()],
        ]);
        assert_eq!(models, vec!["a", "b", "c"]);
        assert_eq!(assemble(Vec::<Vec<String>>::new()), vec![FALLBACK_MODEL]);
    }

    #[tokio::test]
    async fn test_discovery_falls_back_and_keeps_order() {
        let catalog = catalog(&all_configured());
        assert_eq!(
            catalog.discover_available_models().await,
            catalog.list_available_models()
        );
    }
}
