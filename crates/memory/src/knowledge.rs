//! Knowledge store: the bullet list of facts the companion remembers.
//!
//! The document is newline-delimited text, one `- fact` per line. Every
//! read-modify-write holds the store's lock, so concurrent directive
//! application is serialized per operation.

use tokio::sync::Mutex;
use tracing::debug;
use wopr_core::error::MemoryError;
use wopr_core::memory::KnowledgeStorage;

/// Dedup/match form of a line: bullet marker stripped, trimmed, lowercased.
pub fn normalize(line: &str) -> String {
    let line = line.trim_start();
    let line = match line.strip_prefix(['-', '*']) {
        Some(rest) => rest.trim_start(),
        None => line,
    };
    line.trim().to_lowercase()
}

/// Serialized access to a [`KnowledgeStorage`].
pub struct KnowledgeBase {
    storage: Mutex<Box<dyn KnowledgeStorage>>,
}

impl KnowledgeBase {
    pub fn new(storage: impl KnowledgeStorage + 'static) -> Self {
        Self {
            storage: Mutex::new(Box::new(storage)),
        }
    }

    /// The raw document, as stored.
    pub async fn text(&self) -> Result<String, MemoryError> {
        self.storage.lock().await.load_knowledge().await
    }

    /// The facts without their bullet markers, in order.
    pub async fn entries(&self) -> Result<Vec<String>, MemoryError> {
        let text = self.text().await?;
        Ok(text
            .lines()
            .map(|l| {
                let l = l.trim();
                l.strip_prefix(['-', '*']).map(str::trim_start).unwrap_or(l).to_string()
            })
            .filter(|l| !l.is_empty())
            .collect())
    }

    /// Append `- item` unless an equal entry (case-insensitive, trimmed)
    /// already exists. Returns whether the document changed.
    pub async fn add(&self, item: &str) -> Result<bool, MemoryError> {
        let item = item.trim();
        if item.is_empty() {
            return Ok(false);
        }

        let storage = self.storage.lock().await;
        let current = storage.load_knowledge().await?;

        let wanted = item.to_lowercase();
        if current.lines().any(|l| normalize(l) == wanted) {
            debug!(item, "Knowledge already present");
            return Ok(false);
        }

        let entry = format!("- {item}");
        let current = current.trim();
        let updated = if current.is_empty() {
            entry
        } else {
            format!("{current}\n{entry}")
        };
        storage.save_knowledge(&updated).await?;
        debug!(item, backend = storage.name(), "Knowledge added");
        Ok(true)
    }

    /// Drop every line whose normalized text contains the normalized
    /// keyword. Returns whether anything was removed.
    pub async fn remove(&self, keyword: &str) -> Result<bool, MemoryError> {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return Ok(false);
        }

        let storage = self.storage.lock().await;
        let current = storage.load_knowledge().await?;

        let lines: Vec<&str> = current.split('\n').collect();
        let kept: Vec<&str> = lines
            .iter()
            .copied()
            .filter(|l| !normalize(l).contains(&keyword))
            .collect();

        if kept.len() == lines.len() {
            return Ok(false);
        }

        let updated = kept.join("\n");
        storage.save_knowledge(updated.trim()).await?;
        debug!(keyword = %keyword, removed = lines.len() - kept.len(), "Knowledge removed");
        Ok(true)
    }

    pub async fn clear(&self) -> Result<(), MemoryError> {
        self.storage.lock().await.save_knowledge("").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::InMemoryStorage;

    #[test]
    fn normalize_strips_marker_and_case() {
        assert_eq!(normalize("- Likes Tea "), "likes tea");
        assert_eq!(normalize("*   works nights"), "works nights");
        assert_eq!(normalize("plain"), "plain");
        assert_eq!(normalize("-"), "");
    }

    #[tokio::test]
    async fn add_appends_bullet() {
        let kb = KnowledgeBase::new(InMemoryStorage::new());
        assert!(kb.add("likes tea").await.unwrap());
        assert!(kb.add("  works nights ").await.unwrap());
        assert_eq!(kb.text().await.unwrap(), "- likes tea\n- works nights");
        assert_eq!(kb.entries().await.unwrap(), vec!["likes tea", "works nights"]);
    }

    #[tokio::test]
    async fn add_dedups_case_and_whitespace_insensitively() {
        let kb = KnowledgeBase::new(InMemoryStorage::new());
        assert!(kb.add("Likes Tea").await.unwrap());
        assert!(!kb.add("  likes tea  ").await.unwrap());
        assert!(!kb.add("LIKES TEA").await.unwrap());
        assert_eq!(kb.entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn add_dedups_against_star_bullets() {
        let kb = KnowledgeBase::new(InMemoryStorage::with_text("* plays chess\n"));
        assert!(!kb.add("plays chess").await.unwrap());
        assert!(kb.add("plays poker").await.unwrap());
        assert_eq!(kb.text().await.unwrap(), "* plays chess\n- plays poker");
    }

    #[tokio::test]
    async fn add_ignores_blank_items() {
        let kb = KnowledgeBase::new(InMemoryStorage::new());
        assert!(!kb.add("   ").await.unwrap());
        assert_eq!(kb.text().await.unwrap(), "");
    }

    #[tokio::test]
    async fn remove_matches_substrings() {
        let kb = KnowledgeBase::new(InMemoryStorage::with_text(
            "- user drinks coffee\n- likes tea\n- Coffee before noon",
        ));
        assert!(kb.remove("COFFEE").await.unwrap());
        assert_eq!(kb.text().await.unwrap(), "- likes tea");
    }

    #[tokio::test]
    async fn remove_without_match_leaves_document() {
        let kb = KnowledgeBase::new(InMemoryStorage::with_text("- likes tea\n"));
        assert!(!kb.remove("coffee").await.unwrap());
        assert!(!kb.remove("  ").await.unwrap());
        assert_eq!(kb.text().await.unwrap(), "- likes tea\n");
    }

    #[tokio::test]
    async fn clear_empties_document() {
        let kb = KnowledgeBase::new(InMemoryStorage::with_text("- a\n- b"));
        kb.clear().await.unwrap();
        assert!(kb.entries().await.unwrap().is_empty());
    }
}
