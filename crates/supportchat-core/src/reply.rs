//! Tagged view of a webhook reply.
//!
//! `ChatResponse` is a bag of optional flags; `Reply` is decoded from it
//! once so the controller matches on variants instead of re-checking flags.

use crate::wire::ChatResponse;

/// What to do about a human agent hand-off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EscalationDirective {
    #[default]
    None,
    /// Hand the conversation to an agent after a delay.
    Call(EscalationTicket),
    /// Abandon a pending hand-off.
    Cancel,
}

/// Metadata carried from a `callAgent` reply into the escalation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EscalationTicket {
    pub reason: Option<String>,
    pub path: Option<Vec<String>>,
    pub attempt: Option<u32>,
}

/// A reply written by a connected human agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReply {
    pub text: String,
    pub options: Vec<String>,
    pub allow_typing: bool,
    pub end_session: bool,
}

/// A reply from the conversational bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotReply {
    pub text: String,
    pub options: Vec<String>,
    pub escalation: EscalationDirective,
    pub end_session: bool,
    pub new_session: Option<NewSession>,
}

/// The webhook started a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Agent(AgentReply),
    Bot(BotReply),
    /// A bot reply with no text; nothing is shown.
    Silent,
}

impl From<ChatResponse> for Reply {
    fn from(response: ChatResponse) -> Self {
        if response.is_agent_response {
            return Reply::Agent(AgentReply {
                text: response.message,
                options: response.options,
                allow_typing: response.allow_typing,
                end_session: response.end_session,
            });
        }

        if response.message.is_empty() {
            return Reply::Silent;
        }

        // callAgent wins when both flags are set
        let escalation = if response.call_agent {
            EscalationDirective::Call(EscalationTicket {
                reason: response.escalation_reason,
                path: response.customer_path,
                attempt: response.escalation_attempt,
            })
        } else if response.cancel_agent {
            EscalationDirective::Cancel
        } else {
            EscalationDirective::None
        };

        let new_session = response.new_session.then(|| NewSession {
            session_id: response.session_id,
        });

        Reply::Bot(BotReply {
            text: response.message,
            options: response.options,
            escalation,
            end_session: response.end_session,
            new_session,
        })
    }
}
