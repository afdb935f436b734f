//! Conversation message types.
//!
//! A `MessageDraft` is what callers hand to the store; the store turns it
//! into a `ChatMessage` that always carries an id and a timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message typed or picked by the customer.
    User,
    /// Message returned by the webhook (bot or human agent).
    Bot,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message as displayed in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Display identity, `"{role}-{unix millis}"` unless supplied.
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    /// Suggested replies; emptied once the user picks one.
    #[serde(default)]
    pub options: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn is_bot(&self) -> bool {
        self.role == MessageRole::Bot
    }

    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }

    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }
}

/// A message that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub role: MessageRole,
    pub content: String,
    pub options: Vec<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub id: Option<String>,
}

impl MessageDraft {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            options: Vec::new(),
            timestamp: None,
            id: None,
        }
    }

    pub fn bot(content: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            role: MessageRole::Bot,
            content: content.into(),
            options,
            timestamp: None,
            id: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Fills in whatever is missing, using `now` for both id and timestamp.
    pub fn into_message(self, now: DateTime<Utc>) -> ChatMessage {
        let timestamp = self.timestamp.unwrap_or(now);
        let id = self
            .id
            .unwrap_or_else(|| format!("{}-{}", self.role, now.timestamp_millis()));

        ChatMessage {
            id,
            role: self.role,
            content: self.content,
            options: self.options,
            timestamp,
        }
    }
}
