//! LLM Provider implementations for WOPR.
//!
//! All providers implement the `wopr_core::Provider` trait.
//! The router selects the correct provider based on configuration.

pub mod anthropic;
pub mod gemini;
mod http;
pub mod openai;
pub mod registry;
pub mod router;
pub mod sse;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use registry::{ProviderInfo, all_providers, provider_info, supports_web_search};
pub use router::{ProviderRouter, build_from_config};
