//! Domain layer of the support chat widget.
//!
//! Messages, the webhook wire contract and its tagged `Reply` view,
//! configuration, the shared error type and the conversation store.

pub mod config;
pub mod error;
pub mod message;
pub mod reply;
pub mod store;
pub mod wire;

pub use config::{ConfigUpdate, WebhookConfig, WidgetConfig, WidgetStrings, WidgetTiming};
pub use error::{Result, WidgetError};
pub use message::{ChatMessage, MessageDraft, MessageRole};
pub use reply::{AgentReply, BotReply, EscalationDirective, EscalationTicket, NewSession, Reply};
pub use store::ConversationStore;
pub use wire::{ChatRequest, ChatResponse, EscalationRequest, HistoryEntry, ResponseEnvelope};
