// Conversation log with pair-wise undo/redo
//
// Entries are kept most-recent-first. Every exchange is a (user, model) pair,
// so undo and redo always move two entries at a time.

use crate::ai::InlineBlob;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static MESSAGE_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<InlineBlob>,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl Message {
    fn new(role: Role, text: String, image: Option<InlineBlob>) -> Self {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let seq = MESSAGE_SEQ.fetch_add(1, Ordering::Relaxed);
        Message {
            id: format!("{}-{}", timestamp, seq),
            role,
            text,
            image,
            timestamp,
        }
    }

    pub fn user(text: impl Into<String>, image: Option<InlineBlob>) -> Self {
        Self::new(Role::User, text.into(), image)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text.into(), None)
    }

    /// A model reply that carries an edited image instead of guide text.
    pub fn model_image(image: InlineBlob) -> Self {
        Self::new(Role::Model, String::new(), Some(image))
    }

    fn is_guide_reply(&self) -> bool {
        self.role == Role::Model && self.image.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    entries: Vec<Message>,
    redo: Vec<(Message, Message)>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries, most recent first.
    pub fn entries(&self) -> &[Message] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.entries.len() >= 2
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Prepend a completed exchange: the reply ends up newest.
    pub fn record_exchange(&mut self, user: Message, reply: Message) {
        self.entries.insert(0, user);
        self.entries.insert(0, reply);
    }

    /// Text of the newest guide reply, or empty. Image-edit replies are
    /// kept in the log but never become the active response.
    pub fn active_response(&self) -> String {
        self.entries
            .iter()
            .find(|m| m.is_guide_reply())
            .map(|m| m.text.clone())
            .unwrap_or_default()
    }

    /// The user message that produced the newest guide reply.
    pub fn last_request(&self) -> Option<&Message> {
        let reply_at = self.entries.iter().position(Message::is_guide_reply)?;
        self.entries.get(reply_at + 1)
    }

    /// Move the newest pair to the redo buffer. Returns the new active
    /// response, or `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<String> {
        if !self.can_undo() {
            return None;
        }
        let reply = self.entries.remove(0);
        let user = self.entries.remove(0);
        self.redo.push((user, reply));
        Some(self.active_response())
    }

    /// Restore the most recently undone pair. Returns the new active
    /// response, or `None` when the redo buffer is empty.
    pub fn redo(&mut self) -> Option<String> {
        let (user, reply) = self.redo.pop()?;
        self.record_exchange(user, reply);
        Some(self.active_response())
    }

    pub fn clear_redo(&mut self) {
        self.redo.clear();
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_with(exchanges: &[(&str, &str)]) -> ConversationLog {
        let mut log = ConversationLog::new();
        for (request, reply) in exchanges {
            log.record_exchange(Message::user(*request, None), Message::model(*reply));
        }
        log
    }

    #[test]
    fn test_entries_most_recent_first() {
        let log = log_with(&[("pad", "pad guide"), ("bass", "bass guide")]);
        let texts: Vec<&str> = log.entries().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["bass guide", "bass", "pad guide", "pad"]);
        assert_eq!(log.entries()[0].role, Role::Model);
        assert_eq!(log.active_response(), "bass guide");
    }

    #[test]
    fn test_undo_redo_restores_response() {
        let mut log = log_with(&[("pad", "pad guide"), ("bass", "bass guide")]);

        assert_eq!(log.undo(), Some("pad guide".to_string()));
        assert_eq!(log.len(), 2);
        assert!(log.can_redo());

        assert_eq!(log.redo(), Some("bass guide".to_string()));
        assert_eq!(log.len(), 4);
        assert_eq!(log.active_response(), "bass guide");
        assert!(!log.can_redo());
    }

    #[test]
    fn test_undo_last_pair_empties_response() {
        let mut log = log_with(&[("pad", "pad guide")]);
        assert_eq!(log.undo(), Some(String::new()));
        assert!(log.is_empty());
    }

    #[test]
    fn test_undo_with_fewer_than_two_entries_is_noop() {
        let mut log = ConversationLog::new();
        assert_eq!(log.undo(), None);
        assert!(!log.can_redo());
        assert_eq!(log.redo(), None);
    }

    #[test]
    fn test_clear_redo_and_reset() {
        let mut log = log_with(&[("a", "1"), ("b", "2")]);
        log.undo();
        log.clear_redo();
        assert_eq!(log.redo(), None);
        assert_eq!(log.active_response(), "1");

        log.reset();
        assert!(log.is_empty());
        assert_eq!(log.active_response(), "");
    }

    #[test]
    fn test_image_replies_do_not_become_active_response() {
        let mut log = log_with(&[("bass", "bass guide")]);
        let image = InlineBlob::from_bytes("image/png", b"png");
        log.record_exchange(
            Message::user("make it red", Some(image.clone())),
            Message::model_image(image),
        );

        assert_eq!(log.active_response(), "bass guide");
        assert_eq!(log.last_request().map(|m| m.text.as_str()), Some("bass"));

        assert_eq!(log.undo(), Some("bass guide".to_string()));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = Message::user("x", None);
        let b = Message::user("x", None);
        assert_ne!(a.id, b.id);
    }
}
