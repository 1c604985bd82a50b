//! Anthropic native provider implementation.
//!
//! Uses Anthropic's Messages API directly.
//!
//! Features:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field
//! - Only `user` and `assistant` roles in `messages`
//! - Streaming via SSE with `content_block_delta` events
//! - Web search through the bounded `web_search` server tool

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use wopr_core::error::ProviderError;
use wopr_core::message::{Message, MessageContent, Role};
use wopr_core::provider::*;
use wopr_persona::{build_screen_analysis_prompt, build_system_prompt};

use crate::http;
use crate::registry;
use crate::sse;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const WEB_SEARCH_MAX_USES: u32 = 3;

/// Anthropic native Messages API provider.
pub struct AnthropicProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_client(api_key, http::build_client())
    }

    pub(crate) fn with_client(api_key: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Anthropic only accepts `user` and `assistant`; anything that is not
    /// the assistant is sent as the user.
    fn to_api_messages(messages: &[Message]) -> Vec<AnthropicMessage<'_>> {
        messages
            .iter()
            .map(|m| AnthropicMessage {
                role: match m.role {
                    Role::Assistant => "assistant",
                    Role::User | Role::System => "user",
                },
                content: match &m.content {
                    MessageContent::Text(text) => AnthropicContent::Text(text),
                    MessageContent::Image { text, image_base64 } => {
                        AnthropicContent::Blocks(image_blocks(image_base64, text))
                    }
                },
            })
            .collect()
    }

    fn chat_body(request: &ChatRequest<'_>, system: &str, stream: bool) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "max_tokens": request.options.max_tokens,
            "system": system,
            "messages": Self::to_api_messages(request.messages),
        });

        if stream {
            body["stream"] = serde_json::json!(true);
        }

        if request.options.web_search
            && registry::supports_web_search(ProviderKind::Anthropic, request.model)
        {
            body["tools"] = serde_json::json!([{
                "type": "web_search_20250305",
                "name": "web_search",
                "max_uses": WEB_SEARCH_MAX_USES,
            }]);
        }

        body
    }

    async fn post(&self, body: &serde_json::Value) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let request = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(body);
        http::send(ProviderKind::Anthropic, request).await
    }

    async fn complete_body(&self, body: &serde_json::Value) -> Result<String, ProviderError> {
        let response = self.post(body).await?;
        let api_response: AnthropicResponse = http::read_json(response).await?;
        Ok(api_response.text())
    }
}

fn image_blocks<'a>(image_base64: &'a str, text: &'a str) -> Vec<ContentBlock<'a>> {
    vec![
        ContentBlock::Image {
            source: ImageSource {
                kind: "base64",
                media_type: "image/jpeg",
                data: image_base64,
            },
        },
        ContentBlock::Text { text },
    ]
}

/// Text carried by one streaming event.
pub(crate) fn frame_text(data: &str) -> Result<Option<String>, serde_json::Error> {
    let event: StreamEvent = serde_json::from_str(data)?;
    if event.kind != "content_block_delta" {
        return Ok(None);
    }
    Ok(event.delta.and_then(|d| d.text))
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn complete(&self, request: ChatRequest<'_>) -> Result<String, ProviderError> {
        let system = build_system_prompt(request.context);
        let body = Self::chat_body(&request, &system, false);

        debug!(provider = "anthropic", model = %request.model, "Sending completion request");

        let text = self.complete_body(&body).await?;
        Ok(http::or_placeholder(text, NO_RESPONSE))
    }

    async fn stream(&self, request: ChatRequest<'_>) -> Result<DeltaStream, ProviderError> {
        let system = build_system_prompt(request.context);
        let body = Self::chat_body(&request, &system, true);

        debug!(provider = "anthropic", model = %request.model, "Sending streaming request");

        let response = self.post(&body).await?;
        Ok(sse::delta_stream(
            response.bytes_stream(),
            ProviderKind::Anthropic,
            request.options.cancel.clone(),
        ))
    }

    async fn analyze_image(&self, request: VisionRequest<'_>) -> Result<String, ProviderError> {
        let system = build_screen_analysis_prompt(request.context);
        let messages = [AnthropicMessage {
            role: "user",
            content: AnthropicContent::Blocks(image_blocks(
                request.image_base64,
                SCREEN_ANALYSIS_INSTRUCTION,
            )),
        }];
        let body = serde_json::json!({
            "model": request.model,
            "max_tokens": request.options.max_tokens,
            "system": system,
            "messages": messages,
        });

        debug!(provider = "anthropic", model = %request.model, "Sending vision request");

        let text = self.complete_body(&body).await?;
        Ok(http::or_placeholder(text, NO_ANALYSIS))
    }
}

// --- Anthropic API types (internal) ---

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: AnthropicContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum AnthropicContent<'a> {
    Text(&'a str),
    Blocks(Vec<ContentBlock<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'static str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

impl AnthropicResponse {
    /// All text blocks, in order. Search results interleave tool blocks
    /// between them.
    fn text(self) -> String {
        self.content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

// --- Streaming SSE types ---

#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    delta: Option<EventDelta>,
}

#[derive(Debug, Deserialize)]
struct EventDelta {
    #[serde(default)]
    text: Option<String>,
}
