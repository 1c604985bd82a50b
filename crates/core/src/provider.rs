//! Provider trait: the abstraction over LLM backends.
//!
//! A Provider knows how to send a conversation to an LLM and get a response
//! back, either as a complete text or as a lazy stream of text deltas.
//!
//! The set of providers is closed: OpenAI, Anthropic, Gemini. Each speaks its
//! own wire dialect behind this one interface.

use std::pin::Pin;
use std::str::FromStr;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::ProviderError;
use crate::message::Message;
use crate::persona::SystemPromptContext;

/// Returned when a completion or stream produced no text at all.
pub const NO_RESPONSE: &str = "No response generated.";

/// Returned when a screen analysis produced no text.
pub const NO_ANALYSIS: &str = "No analysis available.";

/// Instruction sent alongside every screenshot.
pub const SCREEN_ANALYSIS_INSTRUCTION: &str = "What do you see? Give a brief tip if relevant.";

pub const DEFAULT_CHAT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_VISION_MAX_TOKENS: u32 = 200;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// The closed set of supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::OpenAi, Self::Anthropic, Self::Gemini];

    /// Configuration tag (`"openai"`, `"anthropic"`, `"gemini"`).
    pub fn tag(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
        }
    }

    /// Short vendor name used in synthesized error messages.
    pub fn vendor(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Gemini => "Gemini",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "gemini" => Ok(Self::Gemini),
            other => Err(ProviderError::UnknownProvider(other.to_string())),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Which provider to call, with which key and model.
///
/// `provider` stays a raw tag so that unrecognized values survive until
/// dispatch, where they are rejected with `UnknownProvider`.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider: String,
    pub api_key: String,
    pub model: String,
}

impl ProviderConfig {
    pub fn new(
        provider: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Check the key, then resolve the provider tag.
    pub fn validate(&self) -> Result<ProviderKind, ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey);
        }
        self.provider.parse()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

/// Per-request knobs.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    /// Ask for web-search augmentation when the model supports it.
    pub web_search: bool,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Checked between chunk reads while streaming.
    pub cancel: CancellationToken,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            web_search: false,
            max_tokens: DEFAULT_CHAT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            cancel: CancellationToken::new(),
        }
    }
}

impl ChatOptions {
    /// Defaults for screenshot analysis.
    pub fn vision() -> Self {
        Self {
            max_tokens: DEFAULT_VISION_MAX_TOKENS,
            ..Self::default()
        }
    }

    pub fn with_web_search(mut self, enabled: bool) -> Self {
        self.web_search = enabled;
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }
}

/// A chat turn to send: borrowed so the caller keeps ownership of history.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub context: &'a SystemPromptContext,
    pub options: &'a ChatOptions,
}

/// A single screenshot to analyze.
#[derive(Debug, Clone, Copy)]
pub struct VisionRequest<'a> {
    pub model: &'a str,
    pub image_base64: &'a str,
    pub context: &'a SystemPromptContext,
    pub options: &'a ChatOptions,
}

/// One incremental fragment of streamed response text. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDelta {
    pub text: String,
}

impl StreamDelta {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Lazy, ordered sequence of deltas for one streaming request.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<StreamDelta, ProviderError>> + Send>>;

/// The core Provider trait.
///
/// Every dialect implements `complete`, `stream` and `analyze_image`;
/// callers never need to know which one they are talking to.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Which dialect this provider speaks.
    fn kind(&self) -> ProviderKind;

    /// Send a request and get the complete response text.
    async fn complete(&self, request: ChatRequest<'_>) -> Result<String, ProviderError>;

    /// Send a streaming request and get the deltas as they arrive.
    async fn stream(&self, request: ChatRequest<'_>) -> Result<DeltaStream, ProviderError>;

    /// Analyze one screenshot with the persona's screen-analysis prompt.
    async fn analyze_image(&self, request: VisionRequest<'_>) -> Result<String, ProviderError>;

    /// Stream a response, handing each delta to `on_delta` in arrival order.
    ///
    /// Returns the concatenated text, or [`NO_RESPONSE`] when nothing arrived.
    async fn stream_text(
        &self,
        request: ChatRequest<'_>,
        on_delta: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String, ProviderError> {
        let stream = self.stream(request).await?;
        collect_stream(stream, on_delta).await
    }
}

/// Drain a delta stream into a string, invoking `on_delta` for every fragment.
pub async fn collect_stream(
    mut stream: DeltaStream,
    on_delta: &mut (dyn FnMut(&str) + Send),
) -> Result<String, ProviderError> {
    let mut full = String::new();
    while let Some(delta) = stream.next().await {
        let delta = delta?;
        on_delta(&delta.text);
        full.push_str(&delta.text);
    }
    if full.is_empty() {
        full.push_str(NO_RESPONSE);
    }
    Ok(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deltas(parts: &[&str]) -> DeltaStream {
        let items: Vec<Result<StreamDelta, ProviderError>> =
            parts.iter().map(|p| Ok(StreamDelta::new(*p))).collect();
        Box::pin(futures::stream::iter(items))
    }

    #[test]
    fn provider_kind_parses_known_tags() {
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("anthropic".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
        assert_eq!("gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert!(matches!(
            "grok".parse::<ProviderKind>(),
            Err(ProviderError::UnknownProvider(tag)) if tag == "grok"
        ));
    }

    #[test]
    fn validate_checks_key_before_provider() {
        let config = ProviderConfig::new("grok", "", "m");
        assert!(matches!(config.validate(), Err(ProviderError::MissingApiKey)));

        let config = ProviderConfig::new("grok", "sk-test", "m");
        assert!(matches!(config.validate(), Err(ProviderError::UnknownProvider(_))));

        let config = ProviderConfig::new("gemini", "key", "gemini-1.5-flash");
        assert_eq!(config.validate().unwrap(), ProviderKind::Gemini);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = ProviderConfig::new("openai", "sk-secret", "gpt-4o-mini");
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn vision_options_use_smaller_budget() {
        assert_eq!(ChatOptions::default().max_tokens, 500);
        assert_eq!(ChatOptions::vision().max_tokens, 200);
        assert!(!ChatOptions::default().web_search);
    }

    #[tokio::test]
    async fn collect_stream_concatenates_in_order() {
        let mut seen = Vec::new();
        let text = collect_stream(deltas(&["GREETINGS ", "PROFESSOR ", "FALKEN."]), &mut |d| {
            seen.push(d.to_string())
        })
        .await
        .unwrap();
        assert_eq!(text, "GREETINGS PROFESSOR FALKEN.");
        assert_eq!(seen, vec!["GREETINGS ", "PROFESSOR ", "FALKEN."]);
    }

    #[tokio::test]
    async fn collect_stream_empty_yields_placeholder() {
        let mut calls = 0;
        let text = collect_stream(deltas(&[]), &mut |_| calls += 1).await.unwrap();
        assert_eq!(text, NO_RESPONSE);
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn collect_stream_surfaces_errors() {
        let items: Vec<Result<StreamDelta, ProviderError>> = vec![
            Ok(StreamDelta::new("partial")),
            Err(ProviderError::Transport("connection reset".into())),
        ];
        let stream: DeltaStream = Box::pin(futures::stream::iter(items));
        let err = collect_stream(stream, &mut |_| {}).await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
    }
}
