//! Chat provider trait — the uniform contract every backend adapter implements.

use async_trait::async_trait;

use aiportal_core::{CanonicalChatRequest, CanonicalChatResult, ProviderTag};

use crate::error::ProviderError;

/// Trait that all provider adapters implement.
///
/// Adapters own the translation between the canonical request/result and the
/// backend's wire format. They never retry and never fall back to another
/// provider.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Which backend this adapter talks to.
    fn tag(&self) -> ProviderTag;

    /// Whether the adapter's required credential is present.
    fn is_configured(&self) -> bool;

    /// Send one chat request.
    ///
    /// # Arguments
    /// * `model`   — canonical model identifier, possibly namespaced
    ///   (e.g. `"openrouter/mistralai/mistral-7b-instruct:free"`).
    /// * `request` — prompt, optional system prompt, sampling parameters.
    ///
    /// Fails with [`ProviderError::NotConfigured`] before any network I/O
    /// when the credential is absent.
    async fn invoke(
        &self,
        model: &str,
        request: &CanonicalChatRequest,
    ) -> Result<CanonicalChatResult, ProviderError>;

    /// Model identifiers this adapter advertises, without network access.
    fn models(&self) -> Vec<String>;

    /// Model identifiers, consulting the backend where it supports listing.
    async fn discover_models(&self) -> Vec<String> {
        self.models()
    }

    /// Display name for logging.
    fn display_name(&self) -> &str {
        self.tag().display_name()
    }
}
