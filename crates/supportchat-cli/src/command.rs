//! REPL input parsing.

/// Slash commands offered for completion.
pub const COMMANDS: &[&str] = &["/open", "/close", "/session", "/help", "/quit"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Open,
    Close,
    /// Print the current session id.
    Session,
    Help,
    Quit,
    /// Pick the n-th (1-based) suggested option of the last bot message.
    Pick(usize),
    /// Free text for the webhook.
    Text(String),
    /// Blank line.
    Empty,
    Unknown(String),
}

impl ReplCommand {
    /// Parses one input line. A bare number is only a pick when the last
    /// bot message offers that many options; otherwise it is sent as text.
    pub fn parse(line: &str, option_count: usize) -> Self {
        let trimmed = line.trim();

        match trimmed {
            "" => Self::Empty,
            "/open" => Self::Open,
            "/close" => Self::Close,
            "/session" => Self::Session,
            "/help" => Self::Help,
            "/quit" | "/exit" | "quit" | "exit" => Self::Quit,
            _ if trimmed.starts_with('/') => Self::Unknown(trimmed.to_string()),
            _ => match trimmed.parse::<usize>() {
                Ok(n) if (1..=option_count).contains(&n) => Self::Pick(n),
                _ => Self::Text(trimmed.to_string()),
            },
        }
    }
}
