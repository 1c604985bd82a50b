//! Shared HTTP plumbing for the adapters: client construction, status
//! handling, and provider error-message extraction.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::warn;
use wopr_core::error::ProviderError;
use wopr_core::provider::ProviderKind;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub(crate) fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_default()
}

/// Send a request. Non-success statuses become [`ProviderError::ApiError`].
pub(crate) async fn send(
    kind: ProviderKind,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::Transport(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(provider = %kind, status = status.as_u16(), body = %body, "Provider returned error");
    Err(api_error(kind, status.as_u16(), &body))
}

/// Decode a successful response body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::Transport(format!("Failed to read response body: {e}")))
}

/// Prefer the provider's own `error.message`; otherwise synthesize one from
/// the status code.
pub(crate) fn api_error(kind: ProviderKind, status: u16, body: &str) -> ProviderError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("{} API error: {status}", kind.vendor()));

    ProviderError::ApiError {
        status_code: status,
        message,
    }
}

/// Fall back to `placeholder` when a provider returned no text.
pub(crate) fn or_placeholder(text: String, placeholder: &str) -> String {
    if text.is_empty() {
        placeholder.to_string()
    } else {
        text
    }
}
