use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Author of a message in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// The conversation of one UI session.
///
/// Empty until the first submission; afterwards `messages[0]` is always the
/// system prompt the conversation was seeded with.
#[derive(Debug, Default, Clone)]
pub struct Session {
    messages: Vec<Message>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the conversation with `system_prompt` unless it already exists.
    pub fn initialize(&mut self, system_prompt: &str) {
        if self.messages.is_empty() {
            self.messages.push(Message::system(system_prompt));
        }
    }

    pub fn is_initialized(&self) -> bool {
        !self.messages.is_empty()
    }

    pub fn append_user(&mut self, text: &str) -> AppResult<()> {
        if text.trim().is_empty() {
            return Err(AppError::validation("Please enter a question or idea first."));
        }
        self.messages.push(Message::user(text));
        Ok(())
    }

    pub fn append_assistant(&mut self, text: &str) {
        self.messages.push(Message::assistant(text));
    }

    /// Drop all history and start over from `system_prompt`.
    pub fn reset(&mut self, system_prompt: &str) {
        self.messages.clear();
        self.messages.push(Message::system(system_prompt));
    }

    /// Remove a trailing user message that never got a reply.
    pub fn discard_pending_user(&mut self) -> Option<Message> {
        match self.messages.last() {
            Some(msg) if msg.role == Role::User => self.messages.pop(),
            _ => None,
        }
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

    /// User and assistant messages, most recent first.
    pub fn transcript(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().rev().filter(|m| m.role != Role::System)
    }

    /// Pretty JSON of the conversation. Before the first submission this
    /// shows what the conversation would be seeded with.
    pub fn to_json(&self, current_prompt: &str) -> String {
        let preview;
        let messages = if self.messages.is_empty() {
            preview = [Message::system(current_prompt)];
            &preview[..]
        } else {
            &self.messages[..]
        };
        serde_json::to_string_pretty(messages).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_seeds_system_prompt() {
        let mut session = Session::new();
        assert!(!session.is_initialized());
        session.initialize("You are a dance instructor.");
        assert_eq!(session.len(), 1);
        assert_eq!(session.messages()[0], Message::system("You are a dance instructor."));
    }

    #[test]
    fn test_initialize_is_noop_when_present() {
        let mut session = Session::new();
        session.initialize("first");
        session.append_user("hi").unwrap();
        session.initialize("second");
        assert_eq!(session.len(), 2);
        assert_eq!(session.messages()[0].content, "first");
    }

    #[test]
    fn test_append_user_rejects_whitespace() {
        let mut session = Session::new();
        session.initialize("sys");
        let err = session.append_user("   \n\t").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_reset_always_yields_single_system_message() {
        let mut session = Session::new();
        session.initialize("old");
        for i in 0..5 {
            session.append_user(&format!("q{i}")).unwrap();
            session.append_assistant(&format!("a{i}"));
        }
        assert_eq!(session.len(), 11);

        session.reset("edited prompt");
        assert_eq!(session.messages(), &[Message::system("edited prompt")]);

        let mut fresh = Session::new();
        fresh.reset("from scratch");
        assert_eq!(fresh.len(), 1);
    }

    #[test]
    fn test_transcript_newest_first_without_system() {
        let mut session = Session::new();
        session.initialize("sys");
        session.append_user("q1").unwrap();
        session.append_assistant("a1");
        session.append_user("q2").unwrap();
        session.append_assistant("a2");

        let contents: Vec<&str> = session.transcript().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["a2", "q2", "a1", "q1"]);
    }

    #[test]
    fn test_discard_pending_user_only_pops_user() {
        let mut session = Session::new();
        session.initialize("sys");
        assert!(session.discard_pending_user().is_none());

        session.append_user("orphan").unwrap();
        assert_eq!(session.discard_pending_user(), Some(Message::user("orphan")));
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("ok")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"ok"}"#);
    }

    #[test]
    fn test_to_json_previews_uninitialized_session() {
        let session = Session::new();
        let json = session.to_json("preview prompt");
        assert!(json.contains("\"system\""));
        assert!(json.contains("preview prompt"));
        assert!(session.is_empty());
    }
}
