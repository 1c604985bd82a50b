//! Prompt context: everything the prompt composer needs, passed explicitly.
//!
//! The active preset used to live in app-wide UI state; here it travels with
//! each request instead.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Voice/tone template driving prompt assembly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Terminal-style WOPR persona.
    #[default]
    Retro,
    /// Warm, lowercase, supportive companion.
    Cozy,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retro => "retro",
            Self::Cozy => "cozy",
        }
    }
}

impl FromStr for Preset {
    type Err = String;

    /// Accepts the persona names and the desktop app's preset ids.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retro" | "preset1" => Ok(Self::Retro),
            "cozy" | "preset2" => Ok(Self::Cozy),
            other => Err(format!("Unknown preset: {other}")),
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request input to the prompt composer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemPromptContext {
    pub persona_name: String,
    pub user_name: String,

    /// Description of what is currently on screen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_context: Option<String>,

    /// Newline-delimited `- fact` bullets from the knowledge store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_text: Option<String>,

    /// Recent turns, shown to the screen-analysis prompt.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recent_messages: Vec<Message>,

    #[serde(default)]
    pub preset: Preset,
}

impl SystemPromptContext {
    pub fn new(persona_name: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            persona_name: persona_name.into(),
            user_name: user_name.into(),
            ..Self::default()
        }
    }

    pub fn with_preset(mut self, preset: Preset) -> Self {
        self.preset = preset;
        self
    }

    pub fn with_knowledge(mut self, knowledge: impl Into<String>) -> Self {
        self.knowledge_text = Some(knowledge.into());
        self
    }

    pub fn with_screen_context(mut self, screen: impl Into<String>) -> Self {
        self.screen_context = Some(screen.into());
        self
    }

    pub fn with_recent_messages(mut self, messages: Vec<Message>) -> Self {
        self.recent_messages = messages;
        self
    }
}
