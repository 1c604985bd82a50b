//! In-memory storage: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use tokio::sync::RwLock;
use wopr_core::error::MemoryError;
use wopr_core::memory::KnowledgeStorage;

/// Keeps the knowledge document in a `String`.
/// Useful for testing and sessions where persistence isn't needed.
#[derive(Default)]
pub struct InMemoryStorage {
    text: RwLock<String>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing document.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: RwLock::new(text.into()),
        }
    }
}

#[async_trait]
impl KnowledgeStorage for InMemoryStorage {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load_knowledge(&self) -> Result<String, MemoryError> {
        Ok(self.text.read().await.clone())
    }

    async fn save_knowledge(&self, text: &str) -> Result<(), MemoryError> {
        *self.text.write().await = text.to_string();
        Ok(())
    }
}
