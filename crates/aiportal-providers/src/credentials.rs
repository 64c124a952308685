//! Credential registry — which providers have what they need to be called.
//!
//! Built once from configuration and never mutated. Also the factory for the
//! adapter set, so adapters and availability checks read the same credentials.

use std::sync::Arc;
use std::time::Duration;

use aiportal_core::config::schema::{AzureOpenAiConfig, ProviderConfig, ProvidersConfig};
use aiportal_core::ProviderTag;

use crate::anthropic::AnthropicProvider;
use crate::google::GoogleProvider;
use crate::http_provider::HttpProvider;
use crate::ollama::OllamaProvider;
use crate::registry::{spec_for, CredentialKind};
use crate::traits::ChatProvider;

/// Immutable snapshot of provider credentials.
#[derive(Clone, Debug, Default)]
pub struct CredentialRegistry {
    providers: ProvidersConfig,
}

impl CredentialRegistry {
    pub fn new(providers: &ProvidersConfig) -> Self {
        Self {
            providers: providers.clone(),
        }
    }

    /// Whether `tag` has its required credential.
    ///
    /// OpenAI also counts as configured through a complete Azure deployment.
    pub fn is_configured(&self, tag: ProviderTag) -> bool {
        let config = self.providers.get(tag);
        let present = match spec_for(tag).credential {
            CredentialKind::ApiKey => config.is_configured(),
            CredentialKind::BaseUrl => config.has_api_base(),
        };
        present || (tag == ProviderTag::OpenAi && self.azure().is_some())
    }

    /// Configured tags, in catalog order.
    pub fn configured(&self) -> Vec<ProviderTag> {
        ProviderTag::ALL
            .into_iter()
            .filter(|tag| self.is_configured(*tag))
            .collect()
    }

    /// Connection parameters for `tag`.
    pub fn get(&self, tag: ProviderTag) -> &ProviderConfig {
        self.providers.get(tag)
    }

    /// The Azure deployment, if one is fully configured.
    pub fn azure(&self) -> Option<&AzureOpenAiConfig> {
        Some(&self.providers.azure_openai).filter(|a| a.is_configured())
    }

    /// Build one adapter per provider, in catalog order, sharing `client`.
    pub fn build_adapters(
        &self,
        client: reqwest::Client,
        timeout: Duration,
    ) -> Vec<Arc<dyn ChatProvider>> {
        ProviderTag::ALL
            .into_iter()
            .map(|tag| -> Arc<dyn ChatProvider> {
                let config = self.get(tag);
                match tag {
                    ProviderTag::OpenAi => Arc::new(
                        HttpProvider::new(tag, config, client.clone(), timeout)
                            .with_azure(&self.providers.azure_openai),
                    ),
                    ProviderTag::Groq | ProviderTag::OpenRouter => {
                        Arc::new(HttpProvider::new(tag, config, client.clone(), timeout))
                    }
                    ProviderTag::Anthropic => {
                        Arc::new(AnthropicProvider::new(config, client.clone(), timeout))
                    }
                    ProviderTag::Google => {
                        Arc::new(GoogleProvider::new(config, client.clone(), timeout))
                    }
                    ProviderTag::Ollama => {
                        Arc::new(OllamaProvider::new(config, client.clone(), timeout))
                    }
                }
            })
            .collect()
    }
}
