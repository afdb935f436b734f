//! reqwest implementation of [`WebhookTransport`].
//!
//! Both calls `POST` JSON to the configured URL. The raw body is logged
//! before decoding so malformed replies can be diagnosed.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use supportchat_core::{
    ChatRequest, ChatResponse, EscalationRequest, ResponseEnvelope, Result, WebhookConfig,
    WidgetError,
};

use crate::WebhookTransport;

/// HTTP client for the chat webhook.
#[derive(Clone, Default)]
pub struct ReqwestWebhookClient {
    client: Client,
}

impl ReqwestWebhookClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses an existing reqwest client (shared connection pool, proxies, ...).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn post_json<B, T>(&self, config: &WebhookConfig, body: &B, label: &str) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let timeout = config.timeout();

        let response = self
            .client
            .post(&config.url)
            .header("content-type", "application/json")
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, config))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, config))?;

        tracing::debug!(%status, body = %text, "raw response from webhook ({})", label);

        if !status.is_success() {
            return Err(WidgetError::status(status.as_u16(), text));
        }

        serde_json::from_str(&text).map_err(WidgetError::from)
    }
}

fn map_reqwest_error(err: reqwest::Error, config: &WebhookConfig) -> WidgetError {
    if err.is_timeout() {
        WidgetError::Timeout(config.timeout())
    } else if err.is_decode() {
        WidgetError::decode(err.to_string())
    } else {
        WidgetError::transport(format!("{} ({})", err, config.url))
    }
}

#[async_trait]
impl WebhookTransport for ReqwestWebhookClient {
    async fn send_turn(
        &self,
        config: &WebhookConfig,
        request: &ChatRequest,
    ) -> Result<Option<ChatResponse>> {
        let envelope: ResponseEnvelope = self.post_json(config, request, "turn").await?;
        Ok(envelope.into_first())
    }

    async fn escalate(
        &self,
        config: &WebhookConfig,
        request: &EscalationRequest,
    ) -> Result<ChatResponse> {
        self.post_json(config, request, "escalation").await
    }
}
