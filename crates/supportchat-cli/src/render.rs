//! Terminal rendering of the published widget state.

use colored::Colorize;
use supportchat_application::{WidgetController, WidgetStatus};
use supportchat_core::{ChatMessage, MessageRole};

/// Options the user can pick: those of the last message, if it is a bot
/// message.
pub fn pickable_options(last: Option<&ChatMessage>) -> Vec<String> {
    match last {
        Some(message) if message.is_bot() => message.options.clone(),
        _ => Vec::new(),
    }
}

pub fn format_message(message: &ChatMessage) -> String {
    let time = message.timestamp.format("%H:%M");
    let mut out = match message.role {
        MessageRole::User => format!("{} {}", format!("[{}] you:", time).green(), message.content),
        MessageRole::Bot => format!(
            "{} {}",
            format!("[{}] support:", time).bright_magenta(),
            message.content.bright_blue()
        ),
    };

    for (i, option) in message.options.iter().enumerate() {
        out.push('\n');
        out.push_str(&format!("    {} {}", format!("[{}]", i + 1).yellow(), option));
    }
    out
}

/// What changed between two conversation snapshots.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RenderUpdate {
    /// Previously printed messages are gone.
    pub cleared: bool,
    pub appended: Vec<ChatMessage>,
}

/// Tracks which messages have already been printed.
#[derive(Debug, Default)]
pub struct ConversationView {
    printed: Vec<(String, String)>,
}

impl ConversationView {
    pub fn update(&mut self, messages: &[ChatMessage]) -> RenderUpdate {
        let common = self
            .printed
            .iter()
            .zip(messages)
            .take_while(|((id, content), message)| *id == message.id && *content == message.content)
            .count();

        let cleared = common < self.printed.len();
        self.printed.truncate(common);

        let appended = messages[common..].to_vec();
        self.printed
            .extend(appended.iter().map(|m| (m.id.clone(), m.content.clone())));

        RenderUpdate { cleared, appended }
    }
}

fn print_status_change(previous: WidgetStatus, current: WidgetStatus) {
    if previous.open != current.open {
        let text = if current.open { "-- chat opened --" } else { "-- chat closed --" };
        println!("{}", text.bright_black());
    }
    if !previous.waiting_for_agent && current.waiting_for_agent {
        println!("{}", "-- waiting for an agent --".bright_yellow());
    }
    if !previous.agent_connected && current.agent_connected {
        println!("{}", "-- agent connected --".bright_green());
    }
}

/// Prints store and status changes until the widget is destroyed.
pub async fn run_renderer(controller: WidgetController) {
    let store = controller.store().clone();
    let shutdown = controller.shutdown_token();
    let mut messages = store.subscribe_messages();
    let mut typing = store.subscribe_typing();
    let mut status = controller.subscribe_status();

    let mut view = ConversationView::default();
    let mut last_status = *status.borrow_and_update();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = messages.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = messages.borrow_and_update().clone();
                let update = view.update(&snapshot);
                if update.cleared {
                    println!("{}", "-- conversation cleared --".bright_black());
                }
                for message in &update.appended {
                    println!("{}", format_message(message));
                }
            }
            changed = typing.changed() => {
                if changed.is_err() {
                    break;
                }
                if *typing.borrow_and_update() {
                    println!("{}", "support is typing...".bright_black().italic());
                }
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                print_status_change(last_status, current);
                last_status = current;
            }
        }
    }
}
