//! OpenAI Chat Completions provider.
//!
//! Features:
//! - Bearer authentication
//! - System prompt as the first message
//! - Vision via `image_url` data URLs (`detail: "low"`)
//! - Streaming via SSE `choices[0].delta.content` frames, ended by `[DONE]`
//! - Web search by switching to the model's `-search-preview` variant

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use wopr_core::error::ProviderError;
use wopr_core::message::{Message, MessageContent, Role};
use wopr_core::provider::*;
use wopr_persona::{build_screen_analysis_prompt, build_system_prompt};

use crate::http;
use crate::registry::{self, SEARCH_PREVIEW_SUFFIX};
use crate::sse;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI provider.
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
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

    /// Point at a different endpoint (proxies, local test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Convert our messages to the wire format, system prompt first.
    fn to_api_messages<'a>(system: &'a str, messages: &'a [Message]) -> Vec<ApiMessage<'a>> {
        let mut api = Vec::with_capacity(messages.len() + 1);
        api.push(ApiMessage {
            role: "system",
            content: ApiContent::Text(system),
        });
        api.extend(messages.iter().map(|m| ApiMessage {
            role: match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::System => "system",
            },
            content: match &m.content {
                MessageContent::Text(text) => ApiContent::Text(text),
                MessageContent::Image { text, image_base64 } => {
                    ApiContent::Parts(image_parts(image_base64, text))
                }
            },
        }));
        api
    }

    /// Resolve the model actually sent, honoring web search when possible.
    fn effective_model(model: &str, options: &ChatOptions) -> String {
        if options.web_search && registry::supports_web_search(ProviderKind::OpenAi, model) {
            format!("{model}{SEARCH_PREVIEW_SUFFIX}")
        } else {
            model.to_string()
        }
    }

    fn chat_body(request: &ChatRequest<'_>, system: &str, stream: bool) -> serde_json::Value {
        let model = Self::effective_model(request.model, request.options);

        let mut body = serde_json::json!({
            "model": model,
            "messages": Self::to_api_messages(system, request.messages),
            "max_tokens": request.options.max_tokens,
        });

        if !registry::omits_temperature(&model) {
            body["temperature"] = serde_json::json!(request.options.temperature);
        }

        if stream {
            body["stream"] = serde_json::json!(true);
        }

        body
    }

    async fn post(&self, body: &serde_json::Value) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body);
        http::send(ProviderKind::OpenAi, request).await
    }

    async fn complete_body(&self, body: &serde_json::Value) -> Result<String, ProviderError> {
        let response = self.post(body).await?;
        let api_response: ApiResponse = http::read_json(response).await?;
        Ok(api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

fn image_parts<'a>(image_base64: &str, text: &'a str) -> Vec<ApiPart<'a>> {
    vec![
        ApiPart::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:image/jpeg;base64,{image_base64}"),
                detail: "low",
            },
        },
        ApiPart::Text { text },
    ]
}

/// Text carried by one streaming frame.
pub(crate) fn frame_text(data: &str) -> Result<Option<String>, serde_json::Error> {
    let frame: StreamFrame = serde_json::from_str(data)?;
    Ok(frame.choices.into_iter().next().and_then(|c| c.delta.content))
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn complete(&self, request: ChatRequest<'_>) -> Result<String, ProviderError> {
        let system = build_system_prompt(request.context);
        let body = Self::chat_body(&request, &system, false);

        debug!(provider = "openai", model = %body["model"], "Sending completion request");

        let text = self.complete_body(&body).await?;
        Ok(http::or_placeholder(text, NO_RESPONSE))
    }

    async fn stream(&self, request: ChatRequest<'_>) -> Result<DeltaStream, ProviderError> {
        let system = build_system_prompt(request.context);
        let body = Self::chat_body(&request, &system, true);

        debug!(provider = "openai", model = %body["model"], "Sending streaming request");

        let response = self.post(&body).await?;
        Ok(sse::delta_stream(
            response.bytes_stream(),
            ProviderKind::OpenAi,
            request.options.cancel.clone(),
        ))
    }

    async fn analyze_image(&self, request: VisionRequest<'_>) -> Result<String, ProviderError> {
        let system = build_screen_analysis_prompt(request.context);
        let messages = [
            ApiMessage {
                role: "system",
                content: ApiContent::Text(&system),
            },
            ApiMessage {
                role: "user",
                content: ApiContent::Parts(image_parts(
                    request.image_base64,
                    SCREEN_ANALYSIS_INSTRUCTION,
                )),
            },
        ];
        let body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "max_tokens": request.options.max_tokens,
            "temperature": request.options.temperature,
        });

        debug!(provider = "openai", model = %request.model, "Sending vision request");

        let text = self.complete_body(&body).await?;
        Ok(http::or_placeholder(text, NO_ANALYSIS))
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: ApiContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ApiContent<'a> {
    Text(&'a str),
    Parts(Vec<ApiPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiPart<'a> {
    ImageUrl { image_url: ImageUrl },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
    detail: &'static str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

// --- Streaming SSE types ---

/// A single SSE `data: {...}` frame from a streaming response.
#[derive(Debug, Deserialize)]
struct StreamFrame {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamChoiceDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamChoiceDelta {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wopr_core::persona::SystemPromptContext;

    fn ctx() -> SystemPromptContext {
        SystemPromptContext::new("Joshua", "David")
    }

    #[test]
    fn constructor_with_base_url() {
        let p = OpenAiProvider::new("sk-test").with_base_url("http://localhost:9000/v1/");
        assert_eq!(p.base_url, "http://localhost:9000/v1");
        assert_eq!(p.kind(), ProviderKind::OpenAi);
    }

    #[test]
    fn system_prompt_goes_first_and_history_is_untouched() {
        let history = vec![Message::user("hi"), Message::assistant("GREETINGS.")];
        let before = history.clone();
        let api = serde_json::to_value(OpenAiProvider::to_api_messages("SYS", &history)).unwrap();

        assert_eq!(api[0]["role"], "system");
        assert_eq!(api[0]["content"], "SYS");
        assert_eq!(api[1]["content"], "hi");
        assert_eq!(api[2]["role"], "assistant");
        assert_eq!(history, before);
    }

    #[test]
    fn image_message_becomes_parts() {
        let history = vec![Message::user_with_image("look", "QUJD")];
        let api = serde_json::to_value(OpenAiProvider::to_api_messages("SYS", &history)).unwrap();
        let parts = &api[1]["content"];
        assert_eq!(parts[0]["type"], "image_url");
        assert_eq!(parts[0]["image_url"]["url"], "data:image/jpeg;base64,QUJD");
        assert_eq!(parts[0]["image_url"]["detail"], "low");
        assert_eq!(parts[1]["type"], "text");
        assert_eq!(parts[1]["text"], "look");
    }

    #[test]
    fn web_search_swaps_model_and_drops_temperature() {
        let context = ctx();
        let history = vec![Message::user("news?")];
        let options = ChatOptions::default().with_web_search(true);
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: &history,
            context: &context,
            options: &options,
        };
        let body = OpenAiProvider::chat_body(&request, "SYS", true);
        assert_eq!(body["model"], "gpt-4o-mini-search-preview");
        assert!(body.get("temperature").is_none());
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn unsupported_model_ignores_web_search() {
        let context = ctx();
        let history = vec![Message::user("news?")];
        let options = ChatOptions::default().with_web_search(true);
        let request = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: &history,
            context: &context,
            options: &options,
        };
        let body = OpenAiProvider::chat_body(&request, "SYS", false);
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["max_tokens"], 500);
        assert!(body.get("temperature").is_some());
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn frame_text_reads_delta_content() {
        let text = frame_text(r#"{"choices":[{"index":0,"delta":{"content":"HI"}}]}"#).unwrap();
        assert_eq!(text.as_deref(), Some("HI"));
        assert_eq!(frame_text(r#"{"choices":[{"delta":{}}]}"#).unwrap(), None);
        assert_eq!(frame_text(r#"{"choices":[]}"#).unwrap(), None);
        assert!(frame_text("{truncated").is_err());
    }
}
