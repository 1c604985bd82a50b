//! Provider router: the single entry point for chat, streaming chat and
//! screen analysis.
//!
//! The router is stateless per request: each call validates the
//! [`ProviderConfig`], builds the matching adapter, and dispatches. It never
//! interprets memory directives; callers apply them once a reply is final.

use std::collections::HashMap;

use tracing::{debug, info};
use wopr_core::error::ProviderError;
use wopr_core::message::Message;
use wopr_core::persona::SystemPromptContext;
use wopr_core::provider::{
    ChatOptions, ChatRequest, Provider, ProviderConfig, ProviderKind, VisionRequest,
};

use crate::anthropic::AnthropicProvider;
use crate::gemini::GeminiProvider;
use crate::http;
use crate::openai::OpenAiProvider;

/// Routes requests to the adapter for the configured provider.
pub struct ProviderRouter {
    client: reqwest::Client,
    base_urls: HashMap<ProviderKind, String>,
}

impl Default for ProviderRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRouter {
    pub fn new() -> Self {
        Self {
            client: http::build_client(),
            base_urls: HashMap::new(),
        }
    }

    /// Override the endpoint for one provider.
    pub fn with_base_url(mut self, kind: ProviderKind, base_url: impl Into<String>) -> Self {
        self.base_urls.insert(kind, base_url.into());
        self
    }

    /// Build the adapter for `config`.
    ///
    /// Fails with `MissingApiKey` before looking at the provider tag, and
    /// with `UnknownProvider` for unrecognized tags.
    pub fn provider(&self, config: &ProviderConfig) -> Result<Box<dyn Provider>, ProviderError> {
        let kind = config.validate()?;
        let key = config.api_key.as_str();
        let client = self.client.clone();
        let base_url = self.base_urls.get(&kind);

        let provider: Box<dyn Provider> = match kind {
            ProviderKind::OpenAi => {
                let mut p = OpenAiProvider::with_client(key, client);
                if let Some(url) = base_url {
                    p = p.with_base_url(url);
                }
                Box::new(p)
            }
            ProviderKind::Anthropic => {
                let mut p = AnthropicProvider::with_client(key, client);
                if let Some(url) = base_url {
                    p = p.with_base_url(url);
                }
                Box::new(p)
            }
            ProviderKind::Gemini => {
                let mut p = GeminiProvider::with_client(key, client);
                if let Some(url) = base_url {
                    p = p.with_base_url(url);
                }
                Box::new(p)
            }
        };

        Ok(provider)
    }

    /// Send `messages` and return the complete reply.
    pub async fn chat(
        &self,
        config: &ProviderConfig,
        messages: &[Message],
        context: &SystemPromptContext,
        options: &ChatOptions,
    ) -> Result<String, ProviderError> {
        let provider = self.provider(config)?;
        debug!(provider = %provider.kind(), model = %config.model, "Routing chat");
        provider
            .complete(ChatRequest {
                model: &config.model,
                messages,
                context,
                options,
            })
            .await
    }

    /// Stream a reply, handing each delta to `on_delta`, and return the
    /// final text.
    pub async fn chat_stream(
        &self,
        config: &ProviderConfig,
        messages: &[Message],
        context: &SystemPromptContext,
        options: &ChatOptions,
        on_delta: &mut (dyn FnMut(&str) + Send),
    ) -> Result<String, ProviderError> {
        let provider = self.provider(config)?;
        debug!(provider = %provider.kind(), model = %config.model, "Routing streaming chat");
        provider
            .stream_text(
                ChatRequest {
                    model: &config.model,
                    messages,
                    context,
                    options,
                },
                on_delta,
            )
            .await
    }

    /// Describe one base64-encoded JPEG screenshot.
    pub async fn analyze_screen(
        &self,
        config: &ProviderConfig,
        image_base64: &str,
        context: &SystemPromptContext,
        options: &ChatOptions,
    ) -> Result<String, ProviderError> {
        let provider = self.provider(config)?;
        debug!(provider = %provider.kind(), model = %config.model, "Routing screen analysis");
        provider
            .analyze_image(VisionRequest {
                model: &config.model,
                image_base64,
                context,
                options,
            })
            .await
    }

    /// Send a one-word greeting and report whether the provider answered.
    pub async fn test_connection(&self, config: &ProviderConfig) -> bool {
        let messages = [Message::user("Hello")];
        let context = SystemPromptContext::new("Test", "Test");
        match self
            .chat(config, &messages, &context, &ChatOptions::default())
            .await
        {
            Ok(_) => true,
            Err(e) => {
                info!(provider = %config.provider, error = %e, "Connection test failed");
                false
            }
        }
    }
}

/// Build a router from configuration, applying `[providers.<name>] api_url`
/// overrides for recognized provider names.
pub fn build_from_config(config: &wopr_config::AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new();

    for (name, settings) in &config.providers {
        let Some(url) = settings.api_url.as_deref() else {
            continue;
        };
        match name.parse::<ProviderKind>() {
            Ok(kind) => router = router.with_base_url(kind, url),
            Err(_) => info!(provider = %name, "Ignoring endpoint override for unknown provider"),
        }
    }

    router
}
