//! Dispatcher — the single entry point for "answer this prompt with that model".
//!
//! Flow for every call:
//! 1. Validate the request
//! 2. Fill in the default model when none was given
//! 3. Resolve model → provider through the routing table
//! 4. Refuse unconfigured providers before any network traffic
//! 5. Invoke the adapter and normalize its failure into [`DispatchError`]
//!
//! No retries and no fallback to another provider: one logical call is at
//! most one outbound request.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use aiportal_core::config::Config;
use aiportal_core::types::{DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE};
use aiportal_core::{CanonicalChatRequest, CanonicalChatResult, ChatResponse, ProviderTag, UsageRecord};

use crate::catalog::ModelCatalog;
use crate::credentials::CredentialRegistry;
use crate::error::DispatchError;
use crate::routing::ModelRoutingTable;
use crate::traits::ChatProvider;
use crate::transport::DEFAULT_REQUEST_TIMEOUT;

/// A completed chat: the client-facing response plus the record to persist.
#[derive(Clone, Debug)]
pub struct ChatOutcome {
    pub response: ChatResponse,
    pub record: UsageRecord,
}

struct Dispatched {
    model: String,
    provider: ProviderTag,
    result: CanonicalChatResult,
    latency: Duration,
}

/// Routes canonical chat requests to provider adapters.
pub struct Dispatcher {
    default_model: String,
    max_output_tokens: u32,
    temperature: f64,
    routing: ModelRoutingTable,
    adapters: Vec<Arc<dyn ChatProvider>>,
    by_tag: HashMap<ProviderTag, Arc<dyn ChatProvider>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("default_model", &self.default_model)
            .field("providers", &self.adapters.iter().map(|a| a.tag()).collect::<Vec<_>>())
            .finish()
    }
}

impl Dispatcher {
    /// Build the full adapter set from configuration.
    pub fn from_config(config: &Config) -> Self {
        let defaults = &config.defaults;
        let timeout = match defaults.request_timeout_secs {
            0 => DEFAULT_REQUEST_TIMEOUT,
            secs => Duration::from_secs(secs),
        };
        let registry = CredentialRegistry::new(&config.providers);
        let adapters = registry.build_adapters(reqwest::Client::new(), timeout);

        let (max_tokens, temperature) =
            if defaults.max_tokens > 0 && (0.0..=2.0).contains(&defaults.temperature) {
                (defaults.max_tokens, defaults.temperature)
            } else {
                warn!(
                    max_tokens = defaults.max_tokens,
                    temperature = defaults.temperature,
                    "Unusable sampling defaults, falling back to built-in values"
                );
                (DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE)
            };

        let dispatcher = Self::new(&defaults.model, ModelRoutingTable::standard(), adapters)
            .with_sampling(max_tokens, temperature);

        let routed = dispatcher.resolve_provider(&defaults.model);
        if routed != defaults.provider {
            warn!(
                model = %defaults.model,
                expected = %defaults.provider,
                routed = %routed,
                "Default model routes to a different provider than configured"
            );
        }
        if !registry.is_configured(routed) {
            warn!(model = %defaults.model, provider = %routed, "Default model's provider is not configured");
        }

        dispatcher
    }

    pub fn new(
        default_model: impl Into<String>,
        routing: ModelRoutingTable,
        adapters: Vec<Arc<dyn ChatProvider>>,
    ) -> Self {
        let by_tag = adapters.iter().map(|a| (a.tag(), Arc::clone(a))).collect();
        Self {
            default_model: default_model.into(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            routing,
            adapters,
            by_tag,
        }
    }

    /// Sampling applied by [`Self::new_request`] and [`Self::respond`].
    pub fn with_sampling(mut self, max_output_tokens: u32, temperature: f64) -> Self {
        self.max_output_tokens = max_output_tokens;
        self.temperature = temperature;
        self
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn resolve_provider(&self, model: &str) -> ProviderTag {
        self.routing.resolve_provider(model)
    }

    pub fn provider(&self, tag: ProviderTag) -> Option<&Arc<dyn ChatProvider>> {
        self.by_tag.get(&tag)
    }

    pub fn catalog(&self) -> ModelCatalog {
        ModelCatalog::new(self.adapters.clone())
    }

    /// A request for `prompt` carrying this dispatcher's sampling defaults.
    pub fn new_request(&self, prompt: impl Into<String>) -> CanonicalChatRequest {
        CanonicalChatRequest::new(prompt)
            .with_max_output_tokens(self.max_output_tokens)
            .with_temperature(self.temperature)
    }

    /// Dispatch one request to exactly one provider.
    pub async fn chat(&self, request: &CanonicalChatRequest) -> Result<CanonicalChatResult, DispatchError> {
        self.dispatch(request).await.map(|d| d.result)
    }

    /// Dispatch one request and package the response with its usage record.
    pub async fn complete(&self, request: &CanonicalChatRequest) -> Result<ChatOutcome, DispatchError> {
        let dispatched = self.dispatch(request).await?;
        let latency_ms = millis(dispatched.latency);
        let record = UsageRecord::new(
            dispatched.model,
            dispatched.provider,
            &dispatched.result,
            latency_ms,
        );
        Ok(ChatOutcome {
            response: record.to_response(),
            record,
        })
    }

    /// Answer `prompt` with `model` (or the default), using default sampling.
    pub async fn respond(&self, prompt: &str, model: Option<&str>) -> Result<ChatOutcome, DispatchError> {
        let mut request = self.new_request(prompt);
        request.model = model.map(String::from);
        self.complete(&request).await
    }

    async fn dispatch(&self, request: &CanonicalChatRequest) -> Result<Dispatched, DispatchError> {
        if let Err(e) = request.validate() {
            warn!(error = %e, "Rejected chat request");
            return Err(e.into());
        }

        let model = request
            .model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(&self.default_model);
        let provider = self.resolve_provider(model);

        let adapter = match self.by_tag.get(&provider) {
            Some(adapter) if adapter.is_configured() => adapter,
            _ => {
                warn!(model = %model, provider = %provider, "Provider not configured");
                return Err(DispatchError::ProviderNotConfigured { provider });
            }
        };

        let started = Instant::now();
        match adapter.invoke(model, request).await {
            Ok(result) => {
                let latency = started.elapsed();
                info!(
                    provider = %provider,
                    model = %model,
                    prompt_tokens = result.prompt_tokens,
                    completion_tokens = result.completion_tokens,
                    latency_ms = millis(latency),
                    "Chat completed"
                );
                Ok(Dispatched {
                    model: model.to_string(),
                    provider,
                    result,
                    latency,
                })
            }
            Err(e) => {
                error!(provider = %provider, model = %model, error = %e, "Chat failed");
                Err(DispatchError::from_provider(provider, e))
            }
        }
    }
}

fn millis(latency: Duration) -> u64 {
    u64::try_from(latency.as_millis()).unwrap_or(u64::MAX)
}
