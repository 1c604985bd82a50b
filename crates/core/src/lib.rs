//! # WOPR Core
//!
//! Domain types, traits, and error definitions for the WOPR desktop companion.
//! This crate has no HTTP or storage dependencies. It defines the model that
//! the provider, persona, memory and config crates implement against.
//!
//! ## Design Philosophy
//!
//! Every seam is a trait here:
//! - [`Provider`] for the three LLM wire dialects
//! - [`KnowledgeStorage`] for the knowledge document
//! - [`ProfileStore`] for the user's configured name

pub mod error;
pub mod memory;
pub mod message;
pub mod persona;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{Error, MemoryError, ProviderError, Result};
pub use memory::{KnowledgeStorage, ProfileStore, UserProfile};
pub use message::{Message, MessageContent, Role};
pub use persona::{Preset, SystemPromptContext};
pub use provider::{
    ChatOptions, ChatRequest, DeltaStream, Provider, ProviderConfig, ProviderKind, StreamDelta,
    VisionRequest, collect_stream,
};
