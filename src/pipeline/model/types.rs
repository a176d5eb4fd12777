use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

/// Failure reported by a text-generation provider.
///
/// `is_transient()` splits these into retry-eligible capacity/availability
/// failures and everything else.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Rate limited by provider: {0}")]
    RateLimited(String),

    #[error("Provider internal error (status {status}): {body}")]
    ServerError { status: u16, body: String },

    #[error("Provider temporarily unavailable: {0}")]
    Unavailable(String),

    #[error("Authentication failed (status {status}): {body}")]
    Unauthorized { status: u16, body: String },

    #[error("Provider rejected request (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl ModelError {
    /// Rate limiting, internal server errors and temporary unavailability.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::ServerError { .. } | Self::Unavailable(_)
        )
    }

    /// Classify a non-success HTTP status returned by a provider.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => Self::RateLimited(body),
            500 => Self::ServerError { status, body },
            502..=504 => Self::Unavailable(format!("status {status}: {body}")),
            401 | 403 => Self::Unauthorized { status, body },
            _ => Self::Rejected { status, body },
        }
    }

    /// Classify a transport-level failure. Connection failures and timeouts
    /// count as temporary unavailability.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            Self::Unavailable(err.to_string())
        } else {
            Self::HttpClient(err.to_string())
        }
    }
}

/// Descriptive metadata for a provider instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub provider: String,
    pub model: String,
    pub description: String,
}

/// Text-completion capability: prompt in, generated text out.
pub trait TextModel: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String, ModelError>;

    fn info(&self) -> ModelInfo;
}

impl<T: TextModel + ?Sized> TextModel for Arc<T> {
    fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        (**self).complete(prompt)
    }

    fn info(&self) -> ModelInfo {
        (**self).info()
    }
}

impl<T: TextModel + ?Sized> TextModel for Box<T> {
    fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        (**self).complete(prompt)
    }

    fn info(&self) -> ModelInfo {
        (**self).info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(ModelError::from_status(429, "slow down".into()).is_transient());
        assert!(ModelError::from_status(500, "oops".into()).is_transient());
        assert!(ModelError::from_status(503, "busy".into()).is_transient());
        assert!(!ModelError::from_status(400, "bad".into()).is_transient());
        assert!(!ModelError::from_status(404, "no model".into()).is_transient());
        assert!(matches!(
            ModelError::from_status(401, "key".into()),
            ModelError::Unauthorized { status: 401, .. }
        ));
    }

    #[test]
    fn malformed_and_client_errors_are_fatal() {
        assert!(!ModelError::MalformedResponse("x".into()).is_transient());
        assert!(!ModelError::HttpClient("x".into()).is_transient());
    }

    #[test]
    fn trait_is_object_safe() {
        fn _assert(_: &dyn TextModel) {}
    }
}
