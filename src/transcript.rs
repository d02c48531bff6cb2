use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Opening line the assistant greets every new session with.
pub const GREETING: &str = "Hi! I am Sanda How can I help you today?";

/// Default number of messages a transcript may hold.
pub const DEFAULT_CAPACITY: usize = 200;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single immutable chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    role: Role,
    text: String,
    sent_at: DateTime<Utc>,
}

impl Message {
    /// Build a message, refusing empty text.
    pub fn new(role: Role, text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            role,
            text,
            sent_at: Utc::now(),
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }
}

/// Append-only, insertion-ordered chat history.
///
/// The first entry is always the assistant greeting. Entries are only ever
/// pushed at the tail; once `capacity` is reached further appends are
/// refused rather than evicting older messages.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
    capacity: usize,
}

impl Transcript {
    /// Start a transcript seeded with the greeting. Capacity is clamped so the
    /// greeting plus one full exchange always fits.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(3);
        let mut messages = Vec::with_capacity(capacity.min(DEFAULT_CAPACITY));
        messages.push(Message {
            role: Role::Assistant,
            text: GREETING.to_string(),
            sent_at: Utc::now(),
        });
        Self { messages, capacity }
    }

    /// Append at the tail. Returns false if the transcript is full.
    pub fn push(&mut self, message: Message) -> bool {
        if self.messages.len() >= self.capacity {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Number of free slots left
    pub fn remaining(&self) -> usize {
        self.capacity - self.messages.len()
    }

    #[allow(dead_code)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
