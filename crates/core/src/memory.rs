//! Memory traits: persistent knowledge and the user profile.
//!
//! Knowledge is a single plain-text document of `- fact` bullet lines.
//! Storage backends only load and save the whole document; line-level
//! semantics (dedup, substring removal) live in the knowledge store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;

/// Where the knowledge document lives.
///
/// Implementations: file-backed (`brain/knowledge.md`) and in-memory.
#[async_trait]
pub trait KnowledgeStorage: Send + Sync {
    /// The backend name (e.g., "file", "in_memory").
    fn name(&self) -> &str;

    /// Load the full document. A missing document is the empty string.
    async fn load_knowledge(&self) -> Result<String, MemoryError>;

    /// Replace the full document.
    async fn save_knowledge(&self, text: &str) -> Result<(), MemoryError>;
}

/// The slice of user configuration the memory layer may touch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

/// Load/save access to the user profile.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load_profile(&self) -> Result<UserProfile, MemoryError>;

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), MemoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_profile_serializes_without_name() {
        let json = serde_json::to_string(&UserProfile::default()).unwrap();
        assert_eq!(json, "{}");

        let profile: UserProfile = serde_json::from_str(r#"{"user_name":"David"}"#).unwrap();
        assert_eq!(profile.user_name.as_deref(), Some("David"));
    }
}
