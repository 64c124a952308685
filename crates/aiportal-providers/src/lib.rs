//! Provider layer for AI Portal.
//!
//! Talks to each LLM vendor over direct HTTP and hides their differences
//! behind one canonical request/response shape.
//!
//! # Architecture
//!
//! - [`traits::ChatProvider`] — trait that every adapter implements
//! - [`registry`] — static specs for the six supported providers
//! - [`credentials::CredentialRegistry`] — which providers are usable, and the adapter factory
//! - [`routing::ModelRoutingTable`] — model identifier → provider
//! - [`dispatcher::Dispatcher`] — validate, route, invoke, normalize errors
//! - [`catalog::ModelCatalog`] — models available under the current credentials
//!
//! Adapters:
//! - [`http_provider::HttpProvider`] — OpenAI-compatible (OpenAI, Azure OpenAI, Groq, OpenRouter)
//! - [`anthropic::AnthropicProvider`] — Messages API
//! - [`google::GoogleProvider`] — Gemini `generateContent`
//! - [`ollama::OllamaProvider`] — local `/api/chat`

pub mod anthropic;
pub mod catalog;
pub mod credentials;
pub mod dispatcher;
pub mod error;
pub mod google;
pub mod http_provider;
pub mod ollama;
pub mod registry;
pub mod routing;
pub mod traits;
mod transport;

// Re-export main types for convenience
pub use catalog::{ModelCatalog, FALLBACK_MODEL};
pub use credentials::CredentialRegistry;
pub use dispatcher::{ChatOutcome, Dispatcher};
pub use error::{DispatchError, ProviderError};
pub use registry::{ProviderSpec, PROVIDERS};
pub use routing::ModelRoutingTable;
pub use traits::ChatProvider;
pub use transport::DEFAULT_REQUEST_TIMEOUT;
