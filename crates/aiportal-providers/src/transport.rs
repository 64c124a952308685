//! Shared HTTP plumbing for the adapters: send one JSON POST, map failures.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

use aiportal_core::ProviderTag;

use crate::error::ProviderError;

/// Timeout applied when the caller doesn't configure one.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Map a `reqwest` failure into the adapter error taxonomy.
pub(crate) fn classify(err: reqwest::Error, timeout: Duration) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(timeout)
    } else if err.is_decode() {
        ProviderError::Decode(err.to_string())
    } else {
        ProviderError::Http(err.to_string())
    }
}

/// POST `body` as JSON and decode a 2xx JSON response.
///
/// Non-2xx responses become [`ProviderError::Status`] carrying the body text.
pub(crate) async fn post_json<B, R>(
    provider: ProviderTag,
    request: reqwest::RequestBuilder,
    body: &B,
    timeout: Duration,
) -> Result<R, ProviderError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = request
        .timeout(timeout)
        .json(body)
        .send()
        .await
        .map_err(|e| {
            error!(provider = %provider, error = %e, "HTTP request failed");
            classify(e, timeout)
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        error!(provider = %provider, status = %status, body = %body, "API error");
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| classify(e, timeout))?;

    serde_json::from_slice(&bytes).map_err(|e| {
        error!(provider = %provider, error = %e, "Failed to parse provider response");
        debug!(provider = %provider, body = %String::from_utf8_lossy(&bytes), "unparsed body");
        ProviderError::Decode(e.to_string())
    })
}
