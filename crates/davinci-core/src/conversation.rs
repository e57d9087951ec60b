//! UI-agnostic conversation types
//!
//! The conversation is shared between the interactive TUI and the one-shot
//! `ask` command and doesn't depend on any specific UI framework.

use serde::{Deserialize, Serialize};

/// Greeting every conversation starts with
pub const DEFAULT_GREETING: &str = "Hi! Ask me anything about your notes.";

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_streaming: bool,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            is_streaming: false,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            is_streaming: false,
        }
    }
}

/// Ordered, append-only message list.
///
/// The only in-place mutation allowed is growing the content of the single
/// assistant message that is currently streaming.
#[derive(Debug, Clone)]
pub struct Conversation {
    greeting: String,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(greeting: impl Into<String>) -> Self {
        let greeting = greeting.into();
        let messages = vec![Message::assistant(greeting.clone())];
        Self { greeting, messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Append an empty streaming assistant message.
    ///
    /// Returns false (and appends nothing) if a message is already streaming.
    pub fn begin_stream(&mut self) -> bool {
        if self.streaming_count() > 0 {
            return false;
        }
        self.messages.push(Message {
            role: Role::Assistant,
            content: String::new(),
            is_streaming: true,
        });
        true
    }

    /// Grow the streaming message. No-op unless the last message is a
    /// streaming assistant message.
    pub fn append_to_stream(&mut self, chunk: &str) -> bool {
        match self.messages.last_mut() {
            Some(msg) if msg.role == Role::Assistant && msg.is_streaming => {
                msg.content.push_str(chunk);
                true
            }
            _ => false,
        }
    }

    /// Freeze the streaming message, if any.
    pub fn finish_stream(&mut self) {
        if let Some(msg) = self.messages.last_mut() {
            if msg.role == Role::Assistant {
                msg.is_streaming = false;
            }
        }
    }

    pub fn streaming_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_streaming).count()
    }

    /// Back to the single seed greeting
    pub fn reset(&mut self) {
        self.messages.clear();
        self.messages.push(Message::assistant(self.greeting.clone()));
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(DEFAULT_GREETING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_conversation_has_seed_greeting() {
        let conversation = Conversation::default();
        assert_eq!(conversation.messages(), &[Message::assistant(DEFAULT_GREETING)]);
    }

    #[test]
    fn test_only_one_stream_at_a_time() {
        let mut conversation = Conversation::default();
        assert!(conversation.begin_stream());
        assert!(!conversation.begin_stream());
        assert_eq!(conversation.streaming_count(), 1);
        assert_eq!(conversation.len(), 2);
    }

    #[test]
    fn test_append_requires_streaming_tail() {
        let mut conversation = Conversation::default();
        assert!(!conversation.append_to_stream("lost"));
        assert_eq!(conversation.last().unwrap().content, DEFAULT_GREETING);

        conversation.begin_stream();
        assert!(conversation.append_to_stream("hello"));
        assert!(conversation.append_to_stream(" world"));
        conversation.finish_stream();

        let last = conversation.last().unwrap();
        assert_eq!(last.content, "hello world");
        assert!(!last.is_streaming);
        assert!(!conversation.append_to_stream(" again"));
    }

    #[test]
    fn test_reset_restores_custom_greeting() {
        let mut conversation = Conversation::new("Welcome back.");
        conversation.push_user("one");
        conversation.push_assistant("two");
        conversation.begin_stream();
        conversation.reset();
        assert_eq!(conversation.messages(), &[Message::assistant("Welcome back.")]);
    }

    #[test]
    fn test_message_serializes_like_the_wire_shape() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));

        let streaming = Message {
            role: Role::Assistant,
            content: String::new(),
            is_streaming: true,
        };
        let json = serde_json::to_value(streaming).unwrap();
        assert_eq!(json["isStreaming"], serde_json::json!(true));
    }
}
