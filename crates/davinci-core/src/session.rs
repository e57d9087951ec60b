//! Chat session state machine.
//!
//! The session owns the conversation plus the `loading` / `streaming` flags.
//! Background work never touches it directly: exchanges send [`ChatEvent`]s
//! and the owner applies them one at a time, so every transition is atomic
//! from the point of view of a render.

use crate::conversation::{Conversation, Message};
use crate::error::DispatchError;

/// Assistant message shown for any dispatch failure
pub const FALLBACK_ERROR: &str = "Error calling API.";

/// Generation counter. Bumped on every reset so that events from an exchange
/// started before the reset are recognized as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Epoch(u64);

impl Epoch {
    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// A query accepted by [`ChatSession::submit`] that should now be dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub epoch: Epoch,
    pub query: String,
}

#[derive(Debug)]
pub enum ChatEventKind {
    /// The full answer arrived; streaming begins
    Answered { answer: String },
    /// Sending or decoding failed
    Failed { error: DispatchError },
    /// Next piece of the revealed answer
    Chunk { text: String },
    /// All chunks delivered
    RevealComplete,
}

#[derive(Debug)]
pub struct ChatEvent {
    pub epoch: Epoch,
    pub kind: ChatEventKind,
}

impl ChatEvent {
    pub fn new(epoch: Epoch, kind: ChatEventKind) -> Self {
        Self { epoch, kind }
    }
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    conversation: Conversation,
    loading: bool,
    streaming: bool,
    epoch: Epoch,
}

impl ChatSession {
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            conversation: Conversation::new(greeting),
            loading: false,
            streaming: false,
            epoch: Epoch::default(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Input and send are disabled while busy
    pub fn is_busy(&self) -> bool {
        self.loading || self.streaming
    }

    /// Waiting for the endpoint and nothing revealed yet
    pub fn show_thinking(&self) -> bool {
        self.loading && !self.streaming
    }

    pub fn can_send(&self, input: &str) -> bool {
        !self.is_busy() && !input.trim().is_empty()
    }

    /// Accept a query typed by the user.
    ///
    /// Blank input, or input while an exchange is running, is ignored and
    /// leaves the session untouched. Otherwise the user message is appended
    /// right away, before anything is sent.
    pub fn submit(&mut self, query: &str) -> Option<Submission> {
        if !self.can_send(query) {
            return None;
        }
        let query = query.trim().to_string();
        self.conversation.push_user(query.clone());
        self.loading = true;

        tracing::info!(chars = query.chars().count(), "query submitted");
        Some(Submission {
            epoch: self.epoch,
            query,
        })
    }

    /// Apply an event from an exchange. Returns false if it was stale or did
    /// not fit the current state.
    pub fn apply(&mut self, event: ChatEvent) -> bool {
        if event.epoch != self.epoch {
            tracing::debug!(?event.epoch, current = ?self.epoch, "dropping stale chat event");
            return false;
        }

        match event.kind {
            ChatEventKind::Answered { answer } => {
                if !self.loading {
                    return false;
                }
                tracing::info!(chars = answer.chars().count(), "answer received");
                self.loading = false;
                self.streaming = self.conversation.begin_stream();
                self.streaming
            }
            ChatEventKind::Failed { error } => {
                tracing::warn!(%error, "dispatch failed");
                self.conversation.finish_stream();
                self.conversation.push_assistant(FALLBACK_ERROR);
                self.loading = false;
                self.streaming = false;
                true
            }
            ChatEventKind::Chunk { text } => {
                self.streaming && self.conversation.append_to_stream(&text)
            }
            ChatEventKind::RevealComplete => {
                if !self.streaming {
                    return false;
                }
                self.conversation.finish_stream();
                self.loading = false;
                self.streaming = false;
                true
            }
        }
    }

    /// Start a new chat: seed greeting only, flags cleared, and anything
    /// still in flight from the previous chat becomes stale.
    pub fn reset(&mut self) {
        self.conversation.reset();
        self.loading = false;
        self.streaming = false;
        self.epoch = self.epoch.next();
        tracing::info!(epoch = ?self.epoch, "new chat");
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(crate::conversation::DEFAULT_GREETING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{Role, DEFAULT_GREETING};
    use crate::reveal::chunks;

    fn answered(session: &ChatSession, answer: &str) -> ChatEvent {
        ChatEvent::new(
            session.epoch(),
            ChatEventKind::Answered {
                answer: answer.to_string(),
            },
        )
    }

    fn chunk(session: &ChatSession, text: String) -> ChatEvent {
        ChatEvent::new(session.epoch(), ChatEventKind::Chunk { text })
    }

    fn complete(session: &ChatSession) -> ChatEvent {
        ChatEvent::new(session.epoch(), ChatEventKind::RevealComplete)
    }

    #[test]
    fn test_submit_appends_user_message_before_answer() {
        let mut session = ChatSession::default();
        let submission = session.submit("  what is a quadcopter? ").unwrap();

        assert_eq!(submission.query, "what is a quadcopter?");
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1], Message::user("what is a quadcopter?"));
        assert!(session.is_loading());
        assert!(session.show_thinking());
    }

    #[test]
    fn test_blank_queries_are_ignored() {
        let mut session = ChatSession::default();
        for blank in ["", "   ", "\t\n"] {
            assert!(session.submit(blank).is_none());
        }
        assert_eq!(session.messages().len(), 1);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_submit_refused_while_busy() {
        let mut session = ChatSession::default();
        session.submit("first").unwrap();
        assert!(session.submit("second").is_none());

        let event = answered(&session, "ok");
        session.apply(event);
        assert!(session.is_streaming());
        assert!(session.submit("third").is_none());
        assert_eq!(session.messages().len(), 3);
    }

    #[test]
    fn test_full_reveal_of_answer() {
        let mut session = ChatSession::default();
        session.submit("letters?").unwrap();
        let event = answered(&session, "a b c");
        assert!(session.apply(event));
        assert!(!session.show_thinking());

        let words = ["a", "b", "c"];
        for (i, piece) in chunks("a b c").into_iter().enumerate() {
            let event = chunk(&session, piece);
            assert!(session.apply(event));
            let last = session.messages().last().unwrap();
            assert_eq!(last.content, words[..=i].join(" "));
            assert!(last.is_streaming);
            assert_eq!(session.conversation().streaming_count(), 1);
        }

        let event = complete(&session);
        assert!(session.apply(event));
        let last = session.messages().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, "a b c");
        assert!(!last.is_streaming);
        assert!(!session.is_busy());
        assert_eq!(session.conversation().streaming_count(), 0);
    }

    #[test]
    fn test_failure_appends_single_fallback() {
        let mut session = ChatSession::default();
        session.submit("anyone there?").unwrap();
        let event = ChatEvent::new(
            session.epoch(),
            ChatEventKind::Failed {
                error: DispatchError::Decode(serde_json::from_str::<()>("x").unwrap_err()),
            },
        );
        assert!(session.apply(event));

        let fallbacks = session
            .messages()
            .iter()
            .filter(|m| m.role == Role::Assistant && m.content == FALLBACK_ERROR)
            .count();
        assert_eq!(fallbacks, 1);
        assert_eq!(session.messages().len(), 3);
        assert!(!session.is_loading());
        assert!(!session.is_streaming());
    }

    #[test]
    fn test_reset_restores_seed_from_any_length() {
        let mut session = ChatSession::default();
        for i in 0..4 {
            session.submit(&format!("question {}", i)).unwrap();
            let event = answered(&session, "answer");
            session.apply(event);
            let event = chunk(&session, "answer".to_string());
            session.apply(event);
            let event = complete(&session);
            session.apply(event);
        }
        assert_eq!(session.messages().len(), 9);

        session.reset();
        assert_eq!(session.messages(), &[Message::assistant(DEFAULT_GREETING)]);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_events_from_before_reset_are_stale() {
        let mut session = ChatSession::default();
        let submission = session.submit("slow question").unwrap();
        session.reset();

        let late = ChatEvent::new(
            submission.epoch,
            ChatEventKind::Answered {
                answer: "too late".to_string(),
            },
        );
        assert!(!session.apply(late));
        let late_chunk = ChatEvent::new(
            submission.epoch,
            ChatEventKind::Chunk {
                text: "too late".to_string(),
            },
        );
        assert!(!session.apply(late_chunk));

        assert_eq!(session.messages(), &[Message::assistant(DEFAULT_GREETING)]);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_chunk_without_stream_is_ignored() {
        let mut session = ChatSession::default();
        let event = chunk(&session, "stray".to_string());
        assert!(!session.apply(event));
        let event = complete(&session);
        assert!(!session.apply(event));
        assert_eq!(session.messages()[0].content, DEFAULT_GREETING);
    }

    #[test]
    fn test_empty_answer_reveals_empty_message() {
        let mut session = ChatSession::default();
        session.submit("say nothing").unwrap();
        let event = answered(&session, "");
        session.apply(event);
        for piece in chunks("") {
            let event = chunk(&session, piece);
            session.apply(event);
        }
        let event = complete(&session);
        session.apply(event);

        let last = session.messages().last().unwrap();
        assert_eq!(last.content, "");
        assert!(!last.is_streaming);
    }
}
