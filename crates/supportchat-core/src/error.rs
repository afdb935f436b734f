//! Error types for the support chat widget.

use std::time::Duration;
use thiserror::Error;

/// A shared error type for every supportchat crate.
///
/// Transport, status and decode failures are kept apart so they can be
/// logged precisely, even though the widget shows the same apology for all
/// of them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WidgetError {
    /// The request never produced a response (connect, DNS, reset, ...)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request was aborted after the configured timeout
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The webhook answered with a non-success status
    #[error("HTTP error: status {status}, body: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded
    #[error("Decode error: {format} - {message}")]
    Decode {
        format: String, // "JSON", "TOML"
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (config file access)
    #[error("IO error: {message}")]
    Io { message: String },
}

impl WidgetError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a Status error
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Creates a JSON Decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            format: "JSON".to_string(),
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    pub fn is_status(&self) -> bool {
        matches!(self, Self::Status { .. })
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Check if this error came from a webhook round trip.
    ///
    /// All of these are shown to the user as the same retryable apology.
    pub fn is_request_failure(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout(_) | Self::Status { .. } | Self::Decode { .. }
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for WidgetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for WidgetError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err.to_string())
    }
}

impl From<toml::de::Error> for WidgetError {
    fn from(err: toml::de::Error) -> Self {
        Self::Decode {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, WidgetError>`.
pub type Result<T> = std::result::Result<T, WidgetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failures() {
        assert!(WidgetError::transport("connection refused").is_request_failure());
        assert!(WidgetError::Timeout(Duration::from_secs(30)).is_request_failure());
        assert!(WidgetError::status(502, "bad gateway").is_request_failure());
        assert!(WidgetError::decode("expected value").is_request_failure());
        assert!(!WidgetError::config("missing url").is_request_failure());
    }

    #[test]
    fn test_display_keeps_detail() {
        let err = WidgetError::status(500, "boom");
        assert_eq!(err.to_string(), "HTTP error: status 500, body: boom");

        let err = WidgetError::Timeout(Duration::from_millis(30000));
        assert_eq!(err.to_string(), "Request timed out after 30000ms");
    }

    #[test]
    fn test_from_json_error() {
        let err: WidgetError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(err.is_decode());
    }
}
