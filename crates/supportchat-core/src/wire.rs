//! JSON bodies exchanged with the webhook.
//!
//! The webhook owns this contract; field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::message::{ChatMessage, MessageRole};

/// Body of a normal conversational turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub session_id: String,
    /// Omitted for the greeting and for retries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ChatRequest {
    /// Builds a turn request; an empty `message` is left off the body.
    pub fn new(session_id: impl Into<String>, message: &str) -> Self {
        Self {
            session_id: session_id.into(),
            message: (!message.is_empty()).then(|| message.to_string()),
        }
    }
}

/// A webhook reply. Every field is optional on the wire, and an explicit
/// `null` reads the same as a missing field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatResponse {
    pub session_id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub options: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub end_session: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub new_session: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub call_agent: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub cancel_agent: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub is_agent_response: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub allow_typing: bool,
    pub escalation_reason: Option<String>,
    pub customer_path: Option<Vec<String>>,
    pub escalation_attempt: Option<u32>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A normal-turn body is either one response or a list of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseEnvelope {
    Many(Vec<ChatResponse>),
    One(ChatResponse),
}

impl<'de> Deserialize<'de> for ResponseEnvelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Pick the shape first so a bad field reports its own error
        match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| {
                    serde_json::from_value(item)
                        .map_err(|e| D::Error::custom(format!("response [{}]: {}", index, e)))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Many),
            other => serde_json::from_value(other)
                .map(Self::One)
                .map_err(D::Error::custom),
        }
    }
}

impl ResponseEnvelope {
    /// The response the widget acts on: the object itself, or the first
    /// element of a list. An empty list yields nothing.
    pub fn into_first(self) -> Option<ChatResponse> {
        match self {
            Self::Many(responses) => responses.into_iter().next(),
            Self::One(response) => Some(response),
        }
    }
}

/// One projected turn of the conversation sent along with an escalation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub user: String,
    pub bot: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&ChatMessage> for HistoryEntry {
    fn from(message: &ChatMessage) -> Self {
        let (user, bot) = match message.role {
            MessageRole::User => (message.content.clone(), String::new()),
            MessageRole::Bot => (String::new(), message.content.clone()),
        };
        Self {
            user,
            bot,
            timestamp: message.timestamp,
        }
    }
}

/// Body of the hand-off call to a human agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationRequest {
    pub session_id: String,
    pub escalated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_path: Option<Vec<String>>,
    pub escalation_attempt: u32,
    pub conversation_history: Vec<HistoryEntry>,
}
