//! File-based knowledge storage: a human-editable Markdown bullet list.
//!
//! Storage location: `<data dir>/brain/knowledge.md`.
//!
//! The whole document is read on every load and rewritten on every save.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use wopr_core::error::MemoryError;
use wopr_core::memory::KnowledgeStorage;

pub const KNOWLEDGE_FILE: &str = "knowledge.md";
pub const BRAIN_DIR: &str = "brain";

/// A file-backed knowledge document.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Use the document at `path`. The file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/brain/knowledge.md`
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(BRAIN_DIR).join(KNOWLEDGE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl KnowledgeStorage for FileStorage {
    fn name(&self) -> &str {
        "file"
    }

    async fn load_knowledge(&self) -> Result<String, MemoryError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(text),
            // File doesn't exist yet, start empty
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(MemoryError::Storage(format!(
                "Failed to read knowledge file {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn save_knowledge(&self, text: &str) -> Result<(), MemoryError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                MemoryError::Storage(format!("Failed to create brain directory: {e}"))
            })?;
        }

        tokio::fs::write(&self.path, text).await.map_err(|e| {
            MemoryError::Storage(format!("Failed to write knowledge file: {e}"))
        })?;

        debug!(path = %self.path.display(), bytes = text.len(), "Knowledge saved");
        Ok(())
    }
}
