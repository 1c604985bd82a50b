//! Error types for the WOPR domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all WOPR operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Everything that can go wrong while talking to an LLM provider.
///
/// `MissingApiKey` and `UnknownProvider` are caller-input errors raised
/// before any network activity. None of these are retried.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API key not configured. Please add your API key in settings.")]
    MissingApiKey,

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Non-success HTTP status. `message` is the provider's own error text
    /// when the body carried one, otherwise `"<Provider> API error: <status>"`.
    #[error("{message}")]
    ApiError { status_code: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl ProviderError {
    /// True for errors caused by the caller's input rather than the provider.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingApiKey | Self::UnknownProvider(_))
    }
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Profile error: {0}")]
    Profile(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_displays_provider_message() {
        let err = ProviderError::ApiError {
            status_code: 401,
            message: "Incorrect API key provided".into(),
        };
        assert_eq!(err.to_string(), "Incorrect API key provided");
    }

    #[test]
    fn wrapped_provider_error_keeps_message() {
        let err = Error::Provider(ProviderError::UnknownProvider("grok".into()));
        assert!(err.to_string().contains("Unknown provider: grok"));
    }

    #[test]
    fn configuration_errors_are_classified() {
        assert!(ProviderError::MissingApiKey.is_configuration());
        assert!(ProviderError::UnknownProvider("x".into()).is_configuration());
        assert!(!ProviderError::Transport("reset".into()).is_configuration());
        assert!(!ProviderError::Cancelled.is_configuration());
    }
}
