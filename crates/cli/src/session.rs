//! One chat conversation: history, prompt context and memory directives.
//!
//! Each turn sends the full history with the current knowledge document in
//! the system prompt, then applies the reply's directives once the reply is
//! final. History keeps the visible text only.

use tracing::debug;
use wopr_core::error::{Error, ProviderError};
use wopr_core::message::Message;
use wopr_core::persona::SystemPromptContext;
use wopr_core::provider::{ChatOptions, ChatRequest, Provider};
use wopr_memory::MemoryInterpreter;

/// What the user sees after one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub actions: Vec<String>,
}

pub struct ChatSession {
    provider: Box<dyn Provider>,
    model: String,
    context: SystemPromptContext,
    options: ChatOptions,
    memory: MemoryInterpreter,
    history: Vec<Message>,
}

impl ChatSession {
    pub fn new(
        provider: Box<dyn Provider>,
        model: impl Into<String>,
        context: SystemPromptContext,
        options: ChatOptions,
        memory: MemoryInterpreter,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            context,
            options,
            memory,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn options_mut(&mut self) -> &mut ChatOptions {
        &mut self.options
    }

    /// Update the name used in prompts, e.g. after the user tells the
    /// companion their name.
    pub fn set_user_name(&mut self, name: impl Into<String>) {
        self.context.user_name = name.into();
    }

    /// Blocking turn: wait for the whole reply.
    pub async fn send(&mut self, input: &str) -> Result<Reply, Error> {
        self.turn(input, None).await
    }

    /// Streaming turn: `on_delta` sees the raw text as it arrives,
    /// directives included.
    pub async fn send_streaming(
        &mut self,
        input: &str,
        on_delta: &mut (dyn FnMut(&str) + Send),
    ) -> Result<Reply, Error> {
        self.turn(input, Some(on_delta)).await
    }

    async fn turn(
        &mut self,
        input: &str,
        on_delta: Option<&mut (dyn FnMut(&str) + Send)>,
    ) -> Result<Reply, Error> {
        let knowledge = self.memory.knowledge().text().await?;
        let context = self.context.clone().with_knowledge(knowledge);

        self.history.push(Message::user(input));

        let request = ChatRequest {
            model: &self.model,
            messages: &self.history,
            context: &context,
            options: &self.options,
        };
        let provider = &self.provider;
        let call = async move {
            match on_delta {
                Some(sink) => provider.stream_text(request, sink).await,
                None => provider.complete(request).await,
            }
        };
        // Blocking requests never look at the token themselves.
        let cancel = self.options.cancel.clone();
        let result: Result<String, ProviderError> = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
            result = call => result,
        };

        // A failed turn leaves no trace in history.
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                self.history.pop();
                return Err(e.into());
            }
        };
        let outcome = match self.memory.apply_directives(&raw).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.history.pop();
                return Err(e.into());
            }
        };
        debug!(actions = outcome.actions.len(), "Turn complete");

        self.history.push(Message::assistant(&outcome.visible_text));
        Ok(Reply {
            text: outcome.visible_text,
            actions: outcome.actions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use wopr_core::error::MemoryError;
    use wopr_core::memory::KnowledgeStorage;
    use wopr_core::provider::{DeltaStream, ProviderKind, StreamDelta, VisionRequest};
    use wopr_memory::{InMemoryStorage, KnowledgeBase};

    /// Replays canned replies and records the system knowledge it was given.
    struct Scripted {
        replies: Mutex<Vec<Result<String, ProviderError>>>,
        seen_knowledge: Arc<Mutex<Vec<Option<String>>>>,
        seen_history: Arc<Mutex<Vec<usize>>>,
    }

    impl Scripted {
        fn next(&self, request: &ChatRequest<'_>) -> Result<String, ProviderError> {
            self.seen_knowledge
                .lock()
                .unwrap()
                .push(request.context.knowledge_text.clone());
            self.seen_history.lock().unwrap().push(request.messages.len());
            self.replies.lock().unwrap().remove(0)
        }
    }

    #[async_trait]
    impl Provider for Scripted {
        fn kind(&self) -> ProviderKind {
            ProviderKind::OpenAi
        }

        async fn complete(&self, request: ChatRequest<'_>) -> Result<String, ProviderError> {
            self.next(&request)
        }

        async fn stream(&self, request: ChatRequest<'_>) -> Result<DeltaStream, ProviderError> {
            let text = self.next(&request)?;
            let parts: Vec<Result<StreamDelta, ProviderError>> = text
                .split_inclusive(' ')
                .map(|p| Ok(StreamDelta::new(p)))
                .collect();
            Ok(Box::pin(futures::stream::iter(parts)))
        }

        async fn analyze_image(&self, _request: VisionRequest<'_>) -> Result<String, ProviderError> {
            Ok("nothing".into())
        }
    }

    /// Reads fine, refuses every write.
    struct ReadOnlyStorage;

    #[async_trait]
    impl KnowledgeStorage for ReadOnlyStorage {
        fn name(&self) -> &str {
            "read_only"
        }

        async fn load_knowledge(&self) -> Result<String, MemoryError> {
            Ok(String::new())
        }

        async fn save_knowledge(&self, _text: &str) -> Result<(), MemoryError> {
            Err(MemoryError::Storage("disk full".into()))
        }
    }

    /// Never answers.
    struct Stalled;

    #[async_trait]
    impl Provider for Stalled {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Anthropic
        }

        async fn complete(&self, _request: ChatRequest<'_>) -> Result<String, ProviderError> {
            std::future::pending().await
        }

        async fn stream(&self, _request: ChatRequest<'_>) -> Result<DeltaStream, ProviderError> {
            std::future::pending().await
        }

        async fn analyze_image(&self, _request: VisionRequest<'_>) -> Result<String, ProviderError> {
            std::future::pending().await
        }
    }

    struct Harness {
        session: ChatSession,
        knowledge: Arc<KnowledgeBase>,
        seen_knowledge: Arc<Mutex<Vec<Option<String>>>>,
        seen_history: Arc<Mutex<Vec<usize>>>,
    }

    fn harness(replies: Vec<Result<String, ProviderError>>) -> Harness {
        harness_with(replies, InMemoryStorage::new())
    }

    fn harness_with(
        replies: Vec<Result<String, ProviderError>>,
        storage: impl KnowledgeStorage + 'static,
    ) -> Harness {
        let seen_knowledge = Arc::new(Mutex::new(Vec::new()));
        let seen_history = Arc::new(Mutex::new(Vec::new()));
        let provider = Scripted {
            replies: Mutex::new(replies),
            seen_knowledge: seen_knowledge.clone(),
            seen_history: seen_history.clone(),
        };
        let knowledge = Arc::new(KnowledgeBase::new(storage));
        let session = ChatSession::new(
            Box::new(provider),
            "gpt-4o-mini",
            SystemPromptContext::new("Joshua", "David"),
            ChatOptions::default(),
            MemoryInterpreter::new(knowledge.clone()),
        );
        Harness {
            session,
            knowledge,
            seen_knowledge,
            seen_history,
        }
    }

    #[tokio::test]
    async fn directives_are_applied_and_hidden() {
        let mut h = harness(vec![Ok("NOTED. [REMEMBER: likes chess]".into())]);
        let reply = h.session.send("I like chess").await.unwrap();

        assert_eq!(reply.text, "NOTED.");
        assert_eq!(reply.actions, vec!["Remembered: likes chess"]);
        assert_eq!(h.knowledge.text().await.unwrap(), "- likes chess");
        assert_eq!(h.session.history()[1].text(), "NOTED.");
    }

    #[tokio::test]
    async fn knowledge_reaches_the_next_turn() {
        let mut h = harness(vec![
            Ok("[REMEMBER: likes chess] OK".into()),
            Ok("SHALL WE PLAY?".into()),
        ]);
        h.session.send("remember chess").await.unwrap();
        h.session.send("hello").await.unwrap();

        let seen = h.seen_knowledge.lock().unwrap().clone();
        assert_eq!(seen[0].as_deref(), Some(""));
        assert_eq!(seen[1].as_deref(), Some("- likes chess"));
        assert_eq!(*h.seen_history.lock().unwrap(), vec![1, 3]);
    }

    #[tokio::test]
    async fn streaming_turn_forwards_raw_deltas() {
        let mut h = harness(vec![Ok("HELLO [REMEMBER: x] THERE".into())]);
        let mut streamed = String::new();
        let reply = h
            .session
            .send_streaming("hi", &mut |d: &str| streamed.push_str(d))
            .await
            .unwrap();

        assert_eq!(streamed, "HELLO [REMEMBER: x] THERE");
        assert_eq!(reply.text, "HELLO  THERE");
    }

    #[tokio::test]
    async fn failed_turn_is_dropped_from_history() {
        let mut h = harness(vec![Err(ProviderError::ApiError {
            status_code: 500,
            message: "boom".into(),
        })]);
        let err = h.session.send("hi").await.unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert!(h.session.history().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_drops_the_turn() {
        let mut h = harness_with(
            vec![Ok("[REMEMBER: likes chess] OK".into()), Ok("HELLO".into())],
            ReadOnlyStorage,
        );

        let err = h.session.send("remember chess").await.unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert!(h.session.history().is_empty());

        // The next turn starts from a clean history, not two user turns.
        let reply = h.session.send("hello").await.unwrap();
        assert_eq!(reply.text, "HELLO");
        assert_eq!(*h.seen_history.lock().unwrap(), vec![1, 1]);
        assert_eq!(h.session.history().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_a_blocking_turn() {
        let knowledge = Arc::new(KnowledgeBase::new(InMemoryStorage::new()));
        let options = ChatOptions::default();
        let cancel = options.cancel.clone();
        let mut session = ChatSession::new(
            Box::new(Stalled),
            "claude-3-5-haiku-20241022",
            SystemPromptContext::new("Joshua", "David"),
            options,
            MemoryInterpreter::new(knowledge),
        );

        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let err = session.send("hello?").await.unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::Cancelled)));
        assert!(session.history().is_empty());
    }
}
