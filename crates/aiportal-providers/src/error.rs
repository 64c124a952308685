//! Error types for adapters and the dispatcher.

use std::time::Duration;

use aiportal_core::{ProviderTag, RequestError};

/// Failure inside a single provider adapter.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{0} is not configured")]
    NotConfigured(ProviderTag),

    #[error("request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("network error: {0}")]
    Http(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("response contained no completion")]
    EmptyResponse,
}

impl ProviderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout(_))
    }
}

/// Caller-facing failure of a dispatched chat call. All variants are terminal.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error("provider '{provider}' is not configured")]
    ProviderNotConfigured { provider: ProviderTag },

    #[error("{provider} call failed: {cause}")]
    ProviderCallFailed {
        provider: ProviderTag,
        #[source]
        cause: ProviderError,
    },
}

impl DispatchError {
    /// Provider the failure is attributed to, if any.
    pub fn provider(&self) -> Option<ProviderTag> {
        match self {
            DispatchError::InvalidRequest(_) => None,
            DispatchError::ProviderNotConfigured { provider }
            | DispatchError::ProviderCallFailed { provider, .. } => Some(*provider),
        }
    }

    /// Wrap an adapter failure, keeping a missing credential distinct.
    pub(crate) fn from_provider(provider: ProviderTag, cause: ProviderError) -> Self {
        match cause {
            ProviderError::NotConfigured(tag) => DispatchError::ProviderNotConfigured { provider: tag },
            cause => DispatchError::ProviderCallFailed { provider, cause },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_failed_message_names_provider_and_cause() {
        let err = DispatchError::from_provider(
            ProviderTag::Anthropic,
            ProviderError::Status {
                status: 529,
                body: "overloaded".into(),
            },
        );
        assert_eq!(err.to_string(), "anthropic call failed: HTTP 529: overloaded");
        assert_eq!(err.provider(), Some(ProviderTag::Anthropic));
    }

    #[test]
    fn test_not_configured_stays_distinct() {
        let err = DispatchError::from_provider(
            ProviderTag::Groq,
            ProviderError::NotConfigured(ProviderTag::Groq),
        );
        assert!(matches!(
            err,
            DispatchError::ProviderNotConfigured {
                provider: ProviderTag::Groq
            }
        ));
    }

    #[test]
    fn test_timeout_message() {
        let err = ProviderError::Timeout(Duration::from_secs(60));
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "request timed out after 60s");
    }

    #[test]
    fn test_invalid_request_from_request_error() {
        let err: DispatchError = RequestError::EmptyPrompt.into();
        assert_eq!(err.to_string(), "invalid request: prompt must not be empty");
        assert_eq!(err.provider(), None);
    }
}
