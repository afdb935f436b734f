//! Conversation store.
//!
//! Single source of truth for the displayed conversation, the typing
//! indicator and the session identity. Messages and typing are published
//! through `tokio::sync::watch`, so every subscriber sees the latest
//! snapshot after each mutation.

use chrono::Utc;
use std::sync::{PoisonError, RwLock};
use tokio::sync::watch;

use crate::config::{ConfigUpdate, WebhookConfig};
use crate::message::{ChatMessage, MessageDraft};
use crate::wire::HistoryEntry;

/// Session identity plus the webhook it talks to.
#[derive(Debug, Clone)]
struct SessionState {
    session_id: String,
    webhook: WebhookConfig,
}

pub struct ConversationStore {
    messages: watch::Sender<Vec<ChatMessage>>,
    typing: watch::Sender<bool>,
    session: RwLock<SessionState>,
}

impl ConversationStore {
    /// Creates an empty store with a freshly generated session id.
    pub fn new(webhook: WebhookConfig) -> Self {
        Self::with_session_id(webhook, generate_session_id())
    }

    pub fn with_session_id(webhook: WebhookConfig, session_id: impl Into<String>) -> Self {
        let (messages, _) = watch::channel(Vec::new());
        let (typing, _) = watch::channel(false);

        Self {
            messages,
            typing,
            session: RwLock::new(SessionState {
                session_id: session_id.into(),
                webhook,
            }),
        }
    }

    // ============================================================================
    // Conversation
    // ============================================================================

    /// Appends a message and publishes the new conversation.
    pub fn append(&self, draft: MessageDraft) -> ChatMessage {
        let message = draft.into_message(Utc::now());
        let stored = message.clone();
        self.messages.send_modify(|messages| messages.push(message));
        stored
    }

    /// Empties the suggested options of the last message if it is a bot
    /// message. Returns whether anything was published.
    pub fn clear_last_message_options(&self) -> bool {
        self.messages.send_if_modified(|messages| match messages.last_mut() {
            Some(last) if last.is_bot() => {
                last.options.clear();
                true
            }
            _ => false,
        })
    }

    /// Publishes an empty conversation.
    pub fn clear_all(&self) {
        self.messages.send_replace(Vec::new());
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }

    pub fn last_message(&self) -> Option<ChatMessage> {
        self.messages.borrow().last().cloned()
    }

    pub fn subscribe_messages(&self) -> watch::Receiver<Vec<ChatMessage>> {
        self.messages.subscribe()
    }

    /// Projects the conversation into escalation history, one entry per
    /// message.
    pub fn conversation_history(&self) -> Vec<HistoryEntry> {
        self.messages.borrow().iter().map(HistoryEntry::from).collect()
    }

    // ============================================================================
    // Typing indicator
    // ============================================================================

    /// Publishes the typing flag; subscribers are only woken on change.
    pub fn set_typing(&self, typing: bool) {
        self.typing.send_if_modified(|current| {
            let changed = *current != typing;
            *current = typing;
            changed
        });
    }

    pub fn typing(&self) -> bool {
        *self.typing.borrow()
    }

    pub fn subscribe_typing(&self) -> watch::Receiver<bool> {
        self.typing.subscribe()
    }

    // ============================================================================
    // Session and configuration
    // ============================================================================

    pub fn session_id(&self) -> String {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .session_id
            .clone()
    }

    pub fn set_session_id(&self, session_id: impl Into<String>) {
        let session_id = session_id.into();
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if session.session_id != session_id {
            tracing::info!(
                from = %session.session_id,
                to = %session_id,
                "session id changed"
            );
            session.session_id = session_id;
        }
    }

    /// Replaces the session id with a freshly generated one.
    pub fn reset_session(&self) -> String {
        let session_id = generate_session_id();
        self.set_session_id(session_id.clone());
        session_id
    }

    /// The webhook configuration used by the next request.
    pub fn config(&self) -> WebhookConfig {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .webhook
            .clone()
    }

    /// Applies a partial configuration change. Requests already in flight
    /// keep the configuration they started with.
    pub fn update_config(&self, update: ConfigUpdate) {
        if update.is_empty() {
            return;
        }
        self.session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .webhook
            .apply(update);
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(WebhookConfig::default())
    }
}

/// `session-{unix millis}`.
pub fn generate_session_id() -> String {
    format!("session-{}", Utc::now().timestamp_millis())
}
