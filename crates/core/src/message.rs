//! Message domain types.
//!
//! Conversation turns are owned by the caller and passed to providers as a
//! slice. Providers build their own wire copies and never mutate these.

use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI companion
    Assistant,
    /// System instructions
    System,
}

/// Message body: plain text, or text accompanied by one base64 JPEG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Image { text: String, image_base64: String },
}

impl MessageContent {
    /// The textual part of the content.
    pub fn as_text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Image { text, .. } => text,
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The content
    pub content: MessageContent,
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a user message carrying a base64-encoded JPEG.
    pub fn user_with_image(text: impl Into<String>, image_base64: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Image {
                text: text.into(),
                image_base64: image_base64.into(),
            },
        }
    }

    /// Shorthand for `self.content.as_text()`.
    pub fn text(&self) -> &str {
        self.content.as_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, Joshua");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "Hello, Joshua");
        assert!(matches!(msg.content, MessageContent::Text(_)));
    }

    #[test]
    fn image_message_exposes_both_parts() {
        let msg = Message::user_with_image("what is this?", "aGVsbG8=");
        assert_eq!(msg.text(), "what is this?");
        assert!(matches!(
            &msg.content,
            MessageContent::Image { image_base64, .. } if image_base64 == "aGVsbG8="
        ));
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::assistant("SHALL WE PLAY A GAME?");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""role":"assistant""#));
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
