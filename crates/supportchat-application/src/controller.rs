//! Widget controller.
//!
//! Sequences user actions into webhook round trips and turns the decoded
//! [`Reply`] into store mutations and delayed transitions:
//!
//! - first open schedules a greeting request
//! - `end_session` schedules a reset (close, clear, new session id)
//! - `callAgent` schedules the escalation request
//!
//! Every delayed transition runs on the controller's [`Scheduler`] and is
//! dropped by [`WidgetController::destroy`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use supportchat_core::{
    ChatRequest, ConfigUpdate, ConversationStore, EscalationDirective, EscalationRequest,
    EscalationTicket, MessageDraft, Reply, WidgetConfig, WidgetError, WidgetStrings, WidgetTiming,
};
use supportchat_interaction::WebhookTransport;

use crate::request_slot::RequestSlot;
use crate::scheduler::Scheduler;

/// Result of a send attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The webhook answered and its reply was applied.
    Delivered,
    /// The request failed; the apology with a retry option was shown.
    Failed(WidgetError),
    /// Nothing was sent and nothing was appended.
    Rejected(RejectReason),
    /// The widget was destroyed while the request was in flight. The user
    /// message stays in the conversation; the reply is dropped.
    Abandoned,
}

impl SendOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Another request owns the slot.
    InFlight,
    /// Too soon after the previous accepted send.
    Debounced,
    /// Blank user input.
    EmptyInput,
    /// The widget has been torn down.
    Destroyed,
}

/// Visible widget flags, published to renderers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WidgetStatus {
    pub open: bool,
    pub agent_connected: bool,
    pub waiting_for_agent: bool,
}

#[derive(Debug)]
struct WidgetState {
    open: bool,
    /// The next open sends the greeting.
    first_open: bool,
    waiting_for_agent: bool,
    agent_connected: bool,
    escalation: Option<EscalationTicket>,
    last_send: Option<Instant>,
}

impl WidgetState {
    fn new() -> Self {
        Self {
            open: false,
            first_open: true,
            waiting_for_agent: false,
            agent_connected: false,
            escalation: None,
            last_send: None,
        }
    }

    fn status(&self) -> WidgetStatus {
        WidgetStatus {
            open: self.open,
            agent_connected: self.agent_connected,
            waiting_for_agent: self.waiting_for_agent,
        }
    }

    fn clear_escalation(&mut self) {
        self.waiting_for_agent = false;
        self.escalation = None;
        self.agent_connected = false;
    }
}

/// Raises the typing indicator and lowers it on drop.
struct TypingGuard<'a> {
    store: &'a ConversationStore,
}

impl<'a> TypingGuard<'a> {
    fn raise(store: &'a ConversationStore) -> Self {
        store.set_typing(true);
        Self { store }
    }
}

impl Drop for TypingGuard<'_> {
    fn drop(&mut self) {
        self.store.set_typing(false);
    }
}

struct Inner {
    store: Arc<ConversationStore>,
    transport: Arc<dyn WebhookTransport>,
    timing: WidgetTiming,
    strings: WidgetStrings,
    slot: RequestSlot,
    scheduler: Scheduler,
    state: Mutex<WidgetState>,
    status: watch::Sender<WidgetStatus>,
}

/// Cheap-to-clone handle on one chat widget.
#[derive(Clone)]
pub struct WidgetController {
    inner: Arc<Inner>,
}

impl WidgetController {
    /// Creates a controller and its store from an injected configuration.
    pub fn new(config: WidgetConfig, transport: Arc<dyn WebhookTransport>) -> Self {
        let store = Arc::new(ConversationStore::new(config.webhook));
        Self::with_store(store, config.timing, config.strings, transport)
    }

    pub fn with_store(
        store: Arc<ConversationStore>,
        timing: WidgetTiming,
        strings: WidgetStrings,
        transport: Arc<dyn WebhookTransport>,
    ) -> Self {
        let state = WidgetState::new();
        let (status, _) = watch::channel(state.status());

        Self {
            inner: Arc::new(Inner {
                store,
                transport,
                timing,
                strings,
                slot: RequestSlot::new(),
                scheduler: Scheduler::new(),
                state: Mutex::new(state),
                status,
            }),
        }
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.inner.store
    }

    pub fn strings(&self) -> &WidgetStrings {
        &self.inner.strings
    }

    pub fn status(&self) -> WidgetStatus {
        *self.inner.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<WidgetStatus> {
        self.inner.status.subscribe()
    }

    /// Whether a request currently owns the slot.
    pub fn is_processing(&self) -> bool {
        self.inner.slot.is_busy()
    }

    /// Cancelled when the widget is destroyed; renderers stop on it.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.scheduler.token()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.scheduler.is_cancelled()
    }

    /// Partial webhook configuration change, effective from the next request.
    pub fn update_config(&self, update: ConfigUpdate) {
        self.inner.store.update_config(update);
    }

    // ============================================================================
    // Open / close
    // ============================================================================

    /// Flips visibility and returns whether the widget is now open.
    pub fn toggle(&self) -> bool {
        if self.status().open {
            self.close();
            false
        } else {
            self.open();
            true
        }
    }

    /// Opens the widget. The first open after construction or after a
    /// session reset schedules the greeting request.
    pub fn open(&self) {
        if self.is_destroyed() {
            return;
        }

        let greet = self.update(|state| {
            state.open = true;
            std::mem::replace(&mut state.first_open, false)
        });

        if greet {
            let this = self.clone();
            self.inner
                .scheduler
                .schedule(self.inner.timing.open_delay(), async move {
                    if !this.is_processing() {
                        let outcome = this.send_message("").await;
                        tracing::debug!(?outcome, "greeting request finished");
                    }
                });
        }
    }

    pub fn close(&self) {
        self.update(|state| state.open = false);
    }

    // ============================================================================
    // User input
    // ============================================================================

    /// Sends a turn to the webhook. An empty `text` sends no user message
    /// (greeting and retry).
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        if self.is_destroyed() {
            return SendOutcome::Rejected(RejectReason::Destroyed);
        }

        let Some(_permit) = self.inner.slot.try_claim() else {
            tracing::debug!("send rejected: request in flight");
            return SendOutcome::Rejected(RejectReason::InFlight);
        };

        let debounce = self.inner.timing.debounce();
        let accepted = self.update(|state| {
            let now = Instant::now();
            if let Some(last) = state.last_send {
                if now.duration_since(last) < debounce {
                    return false;
                }
            }
            state.last_send = Some(now);
            true
        });
        if !accepted {
            tracing::debug!("send rejected: debounced");
            return SendOutcome::Rejected(RejectReason::Debounced);
        }

        let store = &self.inner.store;
        if !text.is_empty() {
            store.append(MessageDraft::user(text));
        }

        let _typing = TypingGuard::raise(store);
        let config = store.config();
        let request = ChatRequest::new(store.session_id(), text);

        let result = tokio::select! {
            _ = self.inner.scheduler.cancelled() => {
                tracing::debug!("widget destroyed with a request in flight");
                return SendOutcome::Abandoned;
            }
            result = self.inner.transport.send_turn(&config, &request) => result,
        };

        match result {
            Ok(Some(response)) => {
                if let Some(session_id) = response.session_id.as_deref() {
                    store.set_session_id(session_id);
                }
                self.apply_reply(Reply::from(response));
                SendOutcome::Delivered
            }
            Ok(None) => {
                tracing::debug!("webhook returned an empty reply list");
                SendOutcome::Delivered
            }
            Err(err) => {
                tracing::warn!(error = %err, url = %config.url, "chat request failed");
                self.append_error(&self.inner.strings.error_message);
                SendOutcome::Failed(err)
            }
        }
    }

    /// Sends trimmed free-text input; blank input is ignored.
    pub async fn submit(&self, input: &str) -> SendOutcome {
        let text = input.trim();
        if text.is_empty() {
            return SendOutcome::Rejected(RejectReason::EmptyInput);
        }
        self.send_message(text).await
    }

    /// Handles a click on a suggested option of the last bot message.
    pub async fn pick_option(&self, option: &str) -> SendOutcome {
        if self.is_processing() {
            return SendOutcome::Rejected(RejectReason::InFlight);
        }

        self.inner.store.clear_last_message_options();

        if option == self.inner.strings.retry_option {
            self.send_message("").await
        } else {
            self.send_message(option).await
        }
    }

    /// Tears the widget down: pending timers are dropped, in-flight
    /// requests are abandoned and later sends are rejected.
    pub fn destroy(&self) {
        tracing::info!("destroying chat widget");
        self.inner.scheduler.cancel_all();
        self.inner.slot.close();
    }

    // ============================================================================
    // Reply handling
    // ============================================================================

    fn apply_reply(&self, reply: Reply) {
        let store = &self.inner.store;

        match reply {
            Reply::Agent(agent) => {
                store.append(MessageDraft::bot(agent.text, agent.options));

                if agent.allow_typing {
                    self.update(|state| state.agent_connected = true);
                }
                if agent.end_session {
                    self.schedule_reset();
                }
            }
            Reply::Bot(bot) => {
                self.update(|state| state.first_open = false);
                store.append(MessageDraft::bot(bot.text.clone(), bot.options.clone()));

                match bot.escalation {
                    EscalationDirective::Call(ticket) => {
                        tracing::info!(reason = ?ticket.reason, "agent requested");
                        self.update(|state| {
                            state.waiting_for_agent = true;
                            state.escalation = Some(ticket);
                        });
                        let this = self.clone();
                        self.inner
                            .scheduler
                            .schedule(self.inner.timing.escalation_delay(), async move {
                                this.connect_to_agent().await;
                            });
                    }
                    EscalationDirective::Cancel => {
                        tracing::info!("agent request cancelled");
                        self.update(WidgetState::clear_escalation);
                    }
                    EscalationDirective::None => {}
                }

                if bot.end_session {
                    self.schedule_reset();
                }

                if let Some(new_session) = bot.new_session {
                    store.clear_all();
                    store.append(MessageDraft::bot(bot.text, bot.options));
                    if let Some(session_id) = new_session.session_id {
                        store.set_session_id(session_id);
                    }
                    self.update(WidgetState::clear_escalation);
                }
            }
            Reply::Silent => {
                tracing::debug!("reply without text ignored");
            }
        }
    }

    fn schedule_reset(&self) {
        let this = self.clone();
        self.inner
            .scheduler
            .schedule(self.inner.timing.reset_delay(), async move {
                this.reset_session();
            });
    }

    /// Closes the widget and starts over with an empty conversation.
    fn reset_session(&self) {
        self.update(|state| {
            state.open = false;
            state.first_open = true;
            state.clear_escalation();
        });
        self.inner.store.clear_all();
        let session_id = self.inner.store.reset_session();
        tracing::info!(%session_id, "session ended");
    }

    /// Sends the escalation request if an agent is still being waited for.
    async fn connect_to_agent(&self) {
        let ticket = self.update(|state| {
            if !state.waiting_for_agent {
                return None;
            }
            let ticket = state.escalation.clone()?;
            state.waiting_for_agent = false;
            Some(ticket)
        });
        let Some(ticket) = ticket else {
            return;
        };

        let Some(_permit) = self.inner.slot.claim().await else {
            return;
        };

        let store = &self.inner.store;
        let _typing = TypingGuard::raise(store);
        let config = store.config();
        let request = EscalationRequest {
            session_id: store.session_id(),
            escalated: true,
            escalation_reason: ticket.reason,
            customer_path: ticket.path,
            escalation_attempt: ticket.attempt.unwrap_or(1),
            conversation_history: store.conversation_history(),
        };
        tracing::info!(
            attempt = request.escalation_attempt,
            history = request.conversation_history.len(),
            "escalating conversation to an agent"
        );

        match self.inner.transport.escalate(&config, &request).await {
            Ok(response) => {
                self.update(|state| state.agent_connected = true);
                store.append(MessageDraft::bot(response.message, response.options));
                if let Some(session_id) = response.session_id {
                    store.set_session_id(session_id);
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, url = %config.url, "agent escalation failed");
                self.append_error(&self.inner.strings.escalation_error_message);
                self.update(|state| state.waiting_for_agent = false);
            }
        }
    }

    fn append_error(&self, text: &str) {
        self.inner.store.append(MessageDraft::bot(
            text,
            vec![self.inner.strings.retry_option.clone()],
        ));
    }

    // ============================================================================
    // State
    // ============================================================================

    fn state(&self) -> MutexGuard<'_, WidgetState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutates the widget state and publishes the status if it changed.
    fn update<R>(&self, f: impl FnOnce(&mut WidgetState) -> R) -> R {
        let mut state = self.state();
        let result = f(&mut state);
        let status = state.status();
        drop(state);

        self.inner.status.send_if_modified(|current| {
            let changed = *current != status;
            *current = status;
            changed
        });
        result
    }
}
