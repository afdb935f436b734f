//! Widget configuration.
//!
//! Read from `~/.config/supportchat/config.toml` (or an explicit path),
//! then overridden by `SUPPORTCHAT_*` environment variables. Every field
//! has a default, so an empty or missing file is valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, WidgetError};

pub const DEFAULT_WEBHOOK_URL: &str = "http://localhost:5678/webhook/chat";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub const ENV_WEBHOOK_URL: &str = "SUPPORTCHAT_WEBHOOK_URL";
pub const ENV_TIMEOUT_MS: &str = "SUPPORTCHAT_TIMEOUT_MS";

/// Root configuration injected into the widget controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    pub webhook: WebhookConfig,
    pub timing: WidgetTiming,
    pub strings: WidgetStrings,
}

/// Where and how long to talk to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub url: String,
    pub timeout_ms: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WEBHOOK_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl WebhookConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Applies the fields present in `update`.
    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(url) = update.url {
            self.url = url;
        }
        if let Some(timeout_ms) = update.timeout_ms {
            self.timeout_ms = timeout_ms;
        }
    }
}

/// A partial webhook configuration change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub url: Option<String>,
    pub timeout_ms: Option<u64>,
}

impl ConfigUpdate {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn timeout_ms(timeout_ms: u64) -> Self {
        Self {
            timeout_ms: Some(timeout_ms),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_none() && self.timeout_ms.is_none()
    }
}

/// Fixed delays of the widget, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetTiming {
    /// Delay between first opening the widget and the greeting request.
    pub open_delay_ms: u64,
    /// Minimum gap between two accepted user sends.
    pub debounce_ms: u64,
    /// Delay before an ended session is cleared and the widget closed.
    pub reset_delay_ms: u64,
    /// Delay before a requested agent hand-off is sent.
    pub escalation_delay_ms: u64,
}

impl Default for WidgetTiming {
    fn default() -> Self {
        Self {
            open_delay_ms: 500,
            debounce_ms: 1000,
            reset_delay_ms: 3000,
            escalation_delay_ms: 3000,
        }
    }
}

impl WidgetTiming {
    pub fn open_delay(&self) -> Duration {
        Duration::from_millis(self.open_delay_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    pub fn escalation_delay(&self) -> Duration {
        Duration::from_millis(self.escalation_delay_ms)
    }
}

/// User-visible strings the widget emits on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetStrings {
    pub error_message: String,
    pub escalation_error_message: String,
    pub retry_option: String,
}

impl Default for WidgetStrings {
    fn default() -> Self {
        Self {
            error_message: "عذراً، حدث خطأ. يرجى المحاولة مرة أخرى لاحقاً.".to_string(),
            escalation_error_message:
                "عذراً، حدث خطأ في الاتصال بممثل الخدمة. يرجى المحاولة مرة أخرى.".to_string(),
            retry_option: "المحاولة مرة أخرى".to_string(),
        }
    }
}

impl WidgetConfig {
    /// Loads the configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// read when present and defaults are used otherwise. Environment
    /// overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Reads a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(WidgetError::config(format!(
                "Configuration file not found at: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded widget configuration");
        Ok(config)
    }

    /// Applies `SUPPORTCHAT_*` overrides read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_WEBHOOK_URL) {
            self.webhook.url = url;
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            let timeout_ms = raw.trim().parse::<u64>().map_err(|e| {
                WidgetError::config(format!("{} must be milliseconds: {}", ENV_TIMEOUT_MS, e))
            })?;
            self.webhook.timeout_ms = timeout_ms;
        }

        Ok(())
    }
}

/// Returns `~/.config/supportchat/config.toml`, if a home directory exists.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("supportchat").join("config.toml"))
}
