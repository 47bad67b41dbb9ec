//! Text generation error types.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while asking a provider for text.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Unparsable model output: {0}")]
    Unparsable(String),

    #[error("Invalid model payload: {0}")]
    InvalidPayload(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl GenerationError {
    /// True when the provider itself answered, as opposed to a local failure.
    pub fn is_upstream(&self) -> bool {
        matches!(self, GenerationError::Api { .. } | GenerationError::Network(_))
    }
}
