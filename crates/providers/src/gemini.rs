//! Google Gemini provider (Generative Language API, v1beta).
//!
//! Gemini differs from the other dialects in a few places:
//! - The key travels in the `key` query parameter
//! - The system prompt goes in `systemInstruction`
//! - The assistant role is called `model`
//! - Images are `inlineData` parts
//! - Streaming uses `:streamGenerateContent?alt=sse`

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

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Google Gemini provider.
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiProvider {
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

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn to_contents(messages: &[Message]) -> Vec<Content<'_>> {
        messages
            .iter()
            .map(|m| Content {
                role: match m.role {
                    Role::Assistant => "model",
                    Role::User | Role::System => "user",
                },
                parts: match &m.content {
                    MessageContent::Text(text) => vec![Part::Text { text }],
                    MessageContent::Image { text, image_base64 } => image_parts(image_base64, text),
                },
            })
            .collect()
    }

    fn chat_body(request: &ChatRequest<'_>, system: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "contents": Self::to_contents(request.messages),
            "systemInstruction": SystemInstruction::new(system),
            "generationConfig": GenerationConfig::from(request.options),
        });

        if request.options.web_search
            && registry::supports_web_search(ProviderKind::Gemini, request.model)
        {
            body["tools"] = search_tools(request.model);
        }

        body
    }

    async fn post(
        &self,
        model: &str,
        stream: bool,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, ProviderError> {
        let (method, mut query) = if stream {
            ("streamGenerateContent", vec![("alt", "sse")])
        } else {
            ("generateContent", Vec::new())
        };
        query.push(("key", self.api_key.as_str()));

        let url = format!("{}/v1beta/models/{model}:{method}", self.base_url);
        let request = self
            .client
            .post(&url)
            .query(&query)
            .header("Content-Type", "application/json")
            .json(body);
        http::send(ProviderKind::Gemini, request).await
    }

    async fn complete_body(
        &self,
        model: &str,
        body: &serde_json::Value,
    ) -> Result<String, ProviderError> {
        let response = self.post(model, false, body).await?;
        let api_response: GenerateResponse = http::read_json(response).await?;
        Ok(api_response.text())
    }
}

fn image_parts<'a>(image_base64: &'a str, text: &'a str) -> Vec<Part<'a>> {
    vec![
        Part::InlineData {
            inline_data: InlineData {
                mime_type: "image/jpeg",
                data: image_base64,
            },
        },
        Part::Text { text },
    ]
}

/// 1.5 models use the retrieval tool; newer models use plain `google_search`.
fn search_tools(model: &str) -> serde_json::Value {
    if model.starts_with("gemini-1.5") {
        serde_json::json!([{ "google_search_retrieval": {} }])
    } else {
        serde_json::json!([{ "google_search": {} }])
    }
}

/// Text carried by one streaming frame. Frames share the blocking response
/// shape, so both paths read text the same way.
pub(crate) fn frame_text(data: &str) -> Result<Option<String>, serde_json::Error> {
    let frame: GenerateResponse = serde_json::from_str(data)?;
    Ok(Some(frame.text()))
}

#[async_trait]
impl Provider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn complete(&self, request: ChatRequest<'_>) -> Result<String, ProviderError> {
        let system = build_system_prompt(request.context);
        let body = Self::chat_body(&request, &system);

        debug!(provider = "gemini", model = %request.model, "Sending completion request");

        let text = self.complete_body(request.model, &body).await?;
        Ok(http::or_placeholder(text, NO_RESPONSE))
    }

    async fn stream(&self, request: ChatRequest<'_>) -> Result<DeltaStream, ProviderError> {
        let system = build_system_prompt(request.context);
        let body = Self::chat_body(&request, &system);

        debug!(provider = "gemini", model = %request.model, "Sending streaming request");

        let response = self.post(request.model, true, &body).await?;
        Ok(sse::delta_stream(
            response.bytes_stream(),
            ProviderKind::Gemini,
            request.options.cancel.clone(),
        ))
    }

    async fn analyze_image(&self, request: VisionRequest<'_>) -> Result<String, ProviderError> {
        let system = build_screen_analysis_prompt(request.context);
        let contents = [Content {
            role: "user",
            parts: image_parts(request.image_base64, SCREEN_ANALYSIS_INSTRUCTION),
        }];
        let body = serde_json::json!({
            "contents": contents,
            "systemInstruction": SystemInstruction::new(&system),
            "generationConfig": GenerationConfig::from(request.options),
        });

        debug!(provider = "gemini", model = %request.model, "Sending vision request");

        let text = self.complete_body(request.model, &body).await?;
        Ok(http::or_placeholder(text, NO_ANALYSIS))
    }
}

// --- Gemini API types (internal) ---

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'static str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: [Part<'a>; 1],
}

impl<'a> SystemInstruction<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            parts: [Part::Text { text }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

impl From<&ChatOptions> for GenerationConfig {
    fn from(options: &ChatOptions) -> Self {
        Self {
            max_output_tokens: options.max_tokens,
            temperature: options.temperature,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// Every text part of the first candidate, joined.
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}
