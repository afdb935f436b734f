//! Webhook transport for the support chat widget.
//!
//! The controller talks to the webhook through [`WebhookTransport`] so the
//! HTTP client can be swapped for a scripted one in tests.

pub mod webhook_client;

use async_trait::async_trait;
use supportchat_core::{ChatRequest, ChatResponse, EscalationRequest, Result, WebhookConfig};

pub use webhook_client::ReqwestWebhookClient;

/// One round trip to the webhook.
///
/// `config` is read per call, so configuration updates apply to the next
/// request without touching one already in flight.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// Sends a conversational turn. `Ok(None)` means the webhook answered
    /// with an empty list.
    async fn send_turn(
        &self,
        config: &WebhookConfig,
        request: &ChatRequest,
    ) -> Result<Option<ChatResponse>>;

    /// Hands the conversation to a human agent.
    async fn escalate(
        &self,
        config: &WebhookConfig,
        request: &EscalationRequest,
    ) -> Result<ChatResponse>;
}
