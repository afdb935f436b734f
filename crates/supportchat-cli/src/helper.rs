use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use supportchat_core::ConversationStore;

use crate::command::{COMMANDS, ReplCommand};
use crate::render::pickable_options;

/// rustyline helper: completes slash commands and previews which
/// suggested option a typed number will pick.
pub struct ReplHelper {
    store: Arc<ConversationStore>,
}

impl ReplHelper {
    pub fn new(store: Arc<ConversationStore>) -> Self {
        Self { store }
    }

    fn options(&self) -> Vec<String> {
        pickable_options(self.store.last_message().as_ref())
    }
}

impl Helper for ReplHelper {}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }

        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            return Owned(line.bright_cyan().to_string());
        }
        match ReplCommand::parse(line, self.options().len()) {
            ReplCommand::Pick(_) => Owned(line.bright_green().to_string()),
            _ => Borrowed(line),
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            return COMMANDS
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string());
        }

        let options = self.options();
        match ReplCommand::parse(line, options.len()) {
            ReplCommand::Pick(n) => Some(format!("  → {}", options[n - 1])),
            _ => None,
        }
    }
}

impl Validator for ReplHelper {}
