//! Memory directives embedded in model output.
//!
//! The model writes `[REMEMBER: fact]` to store something and
//! `[FORGET: keyword]` to drop every entry containing the keyword. The
//! interpreter applies them to the knowledge store and returns the text
//! with the directives removed.
//!
//! All REMEMBER directives are applied before any FORGET directive,
//! regardless of where they appear in the text.

use std::sync::{Arc, LazyLock};

use regex_lite::Regex;
use tracing::{debug, info, warn};
use wopr_core::error::MemoryError;
use wopr_core::memory::ProfileStore;

use crate::knowledge::KnowledgeBase;

static REMEMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[REMEMBER:\s*([^\]]+)\]").expect("valid REMEMBER pattern"));

static FORGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[FORGET:\s*([^\]]+)\]").expect("valid FORGET pattern"));

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid blank-run pattern"));

/// Tried in order; the first match wins.
static NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:user(?:'s)?|player(?:'s)?)\s+name\s+is\s+(\w+)",
        r"(?i)name\s+is\s+(\w+)",
        r"(?i)called\s+(\w+)",
        r"(?i)user\s+is\s+(\w+)",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("valid name pattern"))
    .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Remember,
    Forget,
}

/// One directive found in model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryDirective {
    pub kind: DirectiveKind,
    /// Trimmed payload.
    pub payload: String,
    /// The matched text, brackets included.
    pub span: String,
}

/// Result of applying the directives in one response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveOutcome {
    /// Response text with every directive removed.
    pub visible_text: String,
    /// `"Remembered: X"` / `"Forgot: X"`, in application order.
    pub actions: Vec<String>,
}

/// Find directives in `text`: every REMEMBER in order of appearance,
/// followed by every FORGET in order of appearance.
pub fn parse_directives(text: &str) -> Vec<MemoryDirective> {
    let scan = |re: &Regex, kind: DirectiveKind| {
        re.captures_iter(text)
            .map(|caps| MemoryDirective {
                kind,
                payload: caps[1].trim().to_string(),
                span: caps[0].to_string(),
            })
            .collect::<Vec<_>>()
    };

    let mut directives = scan(&REMEMBER, DirectiveKind::Remember);
    directives.extend(scan(&FORGET, DirectiveKind::Forget));
    directives
}

/// Pull a user name out of a remembered fact such as
/// "user's name is David" or "likes to be called Dave".
pub fn extract_user_name(fact: &str) -> Option<String> {
    NAME_PATTERNS
        .iter()
        .find_map(|re| re.captures(fact))
        .map(|caps| caps[1].to_string())
}

/// Remove directive spans and tidy the leftover whitespace.
fn strip_directives(text: &str, directives: &[MemoryDirective]) -> String {
    let mut visible = text.to_string();
    for directive in directives {
        visible = visible.replacen(&directive.span, "", 1);
    }
    BLANK_RUNS.replace_all(&visible, "\n\n").trim().to_string()
}

/// Applies memory directives to a knowledge store and, optionally,
/// propagates a discovered user name to the profile.
pub struct MemoryInterpreter {
    knowledge: Arc<KnowledgeBase>,
    profile: Option<Arc<dyn ProfileStore>>,
}

impl MemoryInterpreter {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self {
            knowledge,
            profile: None,
        }
    }

    pub fn with_profile(mut self, profile: Arc<dyn ProfileStore>) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn knowledge(&self) -> &Arc<KnowledgeBase> {
        &self.knowledge
    }

    /// Execute every directive in `raw`, then return the cleaned text.
    ///
    /// Knowledge store failures abort and are returned. Profile failures
    /// are logged and ignored.
    pub async fn apply_directives(&self, raw: &str) -> Result<DirectiveOutcome, MemoryError> {
        let directives = parse_directives(raw);

        let mut actions = Vec::new();
        for directive in &directives {
            // An all-whitespace payload has nothing to act on, but its span is still stripped.
            if directive.payload.is_empty() {
                continue;
            }
            match directive.kind {
                DirectiveKind::Remember => {
                    self.knowledge.add(&directive.payload).await?;
                    actions.push(format!("Remembered: {}", directive.payload));

                    if let Some(name) = extract_user_name(&directive.payload) {
                        self.update_user_name(&name).await;
                    }
                }
                DirectiveKind::Forget => {
                    if self.knowledge.remove(&directive.payload).await? {
                        actions.push(format!("Forgot: {}", directive.payload));
                    }
                }
            }
        }

        debug!(count = directives.len(), actions = actions.len(), "Memory directives applied");

        Ok(DirectiveOutcome {
            visible_text: strip_directives(raw, &directives),
            actions,
        })
    }

    async fn update_user_name(&self, name: &str) {
        let Some(profile) = &self.profile else {
            return;
        };

        let mut current = match profile.load_profile().await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Failed to load profile for user name update");
                return;
            }
        };

        if current.user_name.as_deref() == Some(name) {
            return;
        }

        current.user_name = Some(name.to_string());
        match profile.save_profile(&current).await {
            Ok(()) => info!(user_name = name, "Updated user name from memory"),
            Err(e) => warn!(error = %e, "Failed to save user name"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::InMemoryStorage;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use wopr_core::memory::UserProfile;

    #[derive(Default)]
    struct RecordingProfile {
        profile: Mutex<UserProfile>,
        saves: Mutex<u32>,
    }

    #[async_trait]
    impl ProfileStore for RecordingProfile {
        async fn load_profile(&self) -> Result<UserProfile, MemoryError> {
            Ok(self.profile.lock().unwrap().clone())
        }

        async fn save_profile(&self, profile: &UserProfile) -> Result<(), MemoryError> {
            *self.profile.lock().unwrap() = profile.clone();
            *self.saves.lock().unwrap() += 1;
            Ok(())
        }
    }

    struct BrokenProfile;

    #[async_trait]
    impl ProfileStore for BrokenProfile {
        async fn load_profile(&self) -> Result<UserProfile, MemoryError> {
            Ok(UserProfile::default())
        }

        async fn save_profile(&self, _profile: &UserProfile) -> Result<(), MemoryError> {
            Err(MemoryError::Profile("read-only".into()))
        }
    }

    fn interpreter(initial: &str) -> MemoryInterpreter {
        MemoryInterpreter::new(Arc::new(KnowledgeBase::new(InMemoryStorage::with_text(initial))))
    }

    #[test]
    fn parse_orders_remember_before_forget() {
        let found = parse_directives("[forget: a] x [Remember:  b ] y [REMEMBER:c]");
        let summary: Vec<_> = found.iter().map(|d| (d.kind, d.payload.as_str())).collect();
        assert_eq!(
            summary,
            vec![
                (DirectiveKind::Remember, "b"),
                (DirectiveKind::Remember, "c"),
                (DirectiveKind::Forget, "a"),
            ]
        );
        assert_eq!(found[0].span, "[Remember:  b ]");
    }

    #[test]
    fn parse_ignores_unclosed_and_empty() {
        assert!(parse_directives("[REMEMBER: never closed").is_empty());
        assert!(parse_directives("[REMEMBER:]").is_empty());
        assert!(parse_directives("plain text").is_empty());
    }

    #[test]
    fn name_patterns_in_priority_order() {
        assert_eq!(extract_user_name("User's name is David").as_deref(), Some("David"));
        assert_eq!(extract_user_name("player name is Jen").as_deref(), Some("Jen"));
        assert_eq!(extract_user_name("their name is Sam").as_deref(), Some("Sam"));
        assert_eq!(extract_user_name("prefers to be called Dave").as_deref(), Some("Dave"));
        assert_eq!(extract_user_name("the user is Falken").as_deref(), Some("Falken"));
        assert_eq!(extract_user_name("likes tea"), None);
    }

    #[tokio::test]
    async fn remember_and_forget_in_one_response() {
        let interp = interpreter("- user drinks coffee");
        let outcome = interp
            .apply_directives("Hi [REMEMBER: likes tea] there [FORGET: coffee]")
            .await
            .unwrap();

        assert_eq!(outcome.visible_text, "Hi  there");
        assert_eq!(outcome.actions, vec!["Remembered: likes tea", "Forgot: coffee"]);
        assert_eq!(interp.knowledge().text().await.unwrap(), "- likes tea");
    }

    #[tokio::test]
    async fn forget_runs_after_remember_regardless_of_position() {
        let interp = interpreter("- favorite color green");
        let outcome = interp
            .apply_directives("[FORGET: color][REMEMBER: favorite color is blue] NOTED.")
            .await
            .unwrap();

        // The new fact matches the keyword too, so both go.
        assert_eq!(
            outcome.actions,
            vec!["Remembered: favorite color is blue", "Forgot: color"]
        );
        assert_eq!(outcome.visible_text, "NOTED.");
        assert_eq!(interp.knowledge().text().await.unwrap(), "");
    }

    #[tokio::test]
    async fn forget_without_match_has_no_action() {
        let interp = interpreter("- likes tea");
        let outcome = interp.apply_directives("OK [FORGET: chess]").await.unwrap();
        assert!(outcome.actions.is_empty());
        assert_eq!(outcome.visible_text, "OK");
        assert_eq!(interp.knowledge().text().await.unwrap(), "- likes tea");
    }

    #[tokio::test]
    async fn duplicate_remember_still_reports_action() {
        let interp = interpreter("- likes tea");
        let outcome = interp.apply_directives("[REMEMBER: Likes Tea]").await.unwrap();
        assert_eq!(outcome.actions, vec!["Remembered: Likes Tea"]);
        assert_eq!(outcome.visible_text, "");
        assert_eq!(interp.knowledge().entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn text_without_directives_is_still_tidied() {
        let interp = interpreter("- likes tea");
        let raw = "  GREETINGS.\n\n\n\nSHALL WE PLAY A GAME?  ";
        let outcome = interp.apply_directives(raw).await.unwrap();
        assert_eq!(outcome.visible_text, "GREETINGS.\n\nSHALL WE PLAY A GAME?");
        assert!(outcome.actions.is_empty());
        assert_eq!(interp.knowledge().text().await.unwrap(), "- likes tea");
    }

    #[tokio::test]
    async fn blank_line_runs_collapse_after_stripping() {
        let interp = interpreter("");
        let outcome = interp
            .apply_directives("LINE ONE\n\n[REMEMBER: plays chess]\n\nLINE TWO\n")
            .await
            .unwrap();
        assert_eq!(outcome.visible_text, "LINE ONE\n\nLINE TWO");
    }

    #[tokio::test]
    async fn whitespace_payload_is_stripped_without_action() {
        let interp = interpreter("- likes tea");
        let outcome = interp.apply_directives("A [FORGET:   ] B").await.unwrap();
        assert!(outcome.actions.is_empty());
        assert_eq!(outcome.visible_text, "A  B");
        assert_eq!(interp.knowledge().text().await.unwrap(), "- likes tea");
    }

    #[tokio::test]
    async fn remembered_name_updates_profile_once() {
        let profile = Arc::new(RecordingProfile::default());
        let interp = interpreter("").with_profile(profile.clone());

        interp
            .apply_directives("[REMEMBER: user's name is David]")
            .await
            .unwrap();
        interp
            .apply_directives("[REMEMBER: User name is David]")
            .await
            .unwrap();

        assert_eq!(
            profile.profile.lock().unwrap().user_name.as_deref(),
            Some("David")
        );
        assert_eq!(*profile.saves.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn profile_failure_does_not_fail_directives() {
        let interp = interpreter("").with_profile(Arc::new(BrokenProfile));
        let outcome = interp
            .apply_directives("[REMEMBER: called Dave] OK")
            .await
            .unwrap();
        assert_eq!(outcome.actions, vec!["Remembered: called Dave"]);
        assert_eq!(interp.knowledge().text().await.unwrap(), "- called Dave");
    }
}
